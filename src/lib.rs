//! # display-console
//!
//! **display-console** is a small consumer of virtual display notifications.
//!
//! It attaches to a port registry, receives damage rectangles, render-surface
//! changes and rotation changes from any number of concurrent producers, and hands
//! them to a logging sink one at a time, in a single gap-free order. Detach is
//! clean: once a consumer reports `Detached`, its sink is never called again.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  display server      windowing layer      orientation controller
//!  (damage rects)      (surface handles)    (rotation angles)
//!        │                   │                     │
//!        ▼                   ▼                     ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │  PortRegistry (e.g. PortMultiplexer)                        │
//! │  routes DisplayEvent by consumer id                         │
//! └──────────────────────────────┬─────────────────────────────┘
//!                                ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │  Consumer                                                   │
//! │  - Identity (uuid + label)                                  │
//! │  - Ingress: on_* ──► seq++ ──► enqueue (one short lock)     │
//! │  - StateCell: Active ─► Detaching ─► Detached               │
//! └──────────────────────────────┬─────────────────────────────┘
//!                                ▼
//!                   [unbounded FIFO of EventRecord]
//!                                ▼
//!                    SerialQueue worker (1 task)
//!                                ▼
//!                  SinkAdapter ──(Err / panic)──► DiagnosticBus
//!                                ▼
//!                      LogSink::on_record(&record)
//! ```
//!
//! ### Lifecycle
//! ```text
//! builder().attach(registry) ─► register ─► spawn worker ─► Active
//!
//! detach() / drop
//!   ├─► registry.unregister(token)           (once)
//!   ├─► close ingress, state = Detaching     (later on_* calls are ignored)
//!   ├─► TeardownPolicy::Drain   ─► worker delivers what is queued
//!   │   TeardownPolicy::Discard ─► worker abandons what is queued
//!   └─► worker exits: sink released, state = Detached
//! ```
//!
//! ## Features
//! | Area            | Description                                                 | Key types / traits                          |
//! |-----------------|-------------------------------------------------------------|---------------------------------------------|
//! | **Consumer**    | Attach, ingest, serialize, detach.                          | [`Consumer`], [`ConsumerBuilder`]           |
//! | **Sinks**       | Where records go; failures are isolated.                    | [`LogSink`], [`SinkFn`]                     |
//! | **Registry**    | Routing by identity; attach/detach bookkeeping.             | [`PortRegistry`], [`PortMultiplexer`]       |
//! | **Records**     | Sequenced, uniform representation of notifications.         | [`EventRecord`], [`Payload`], [`Rect`]      |
//! | **Diagnostics** | Side channel for sink failures and lifecycle changes.       | [`Diagnostic`], [`DiagnosticBus`]           |
//! | **Errors**      | Typed errors for sinks, registries and attach/detach.       | [`SinkError`], [`ConsumerError`]            |
//! | **Configuration** | Teardown policy, label, diagnostic capacity.              | [`ConsumerConfig`], [`TeardownPolicy`]      |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a sink that writes records through `tracing`.
//!
//! ## Example
//! ```rust
//! use display_console::{
//!     Consumer, DisplayEvent, EventRecord, PortMultiplexer, Rect, SinkError,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = PortMultiplexer::new();
//!
//!     let console = Consumer::builder()
//!         .with_label("display 0")
//!         .with_sink_fn("stdout", |r: &EventRecord| -> Result<(), SinkError> {
//!             println!("{r}");
//!             Ok(())
//!         })
//!         .attach(registry.clone())?;
//!
//!     registry.route(console.id(), DisplayEvent::DamageRect(Rect::new(0.0, 0.0, 64.0, 32.0)));
//!     registry.route(console.id(), DisplayEvent::RotationChanged(-90.0));
//!     registry.route(console.id(), DisplayEvent::SurfaceChanged(None));
//!
//!     let stats = console.detach().await?;
//!     assert_eq!(stats.ingested, 3);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod identity;
mod registry;
mod sinks;

// ---- Public re-exports ----

pub use config::{ConsumerConfig, TeardownPolicy};
pub use core::{Consumer, ConsumerBuilder, ConsumerState, ConsumerStats};
pub use error::{ConsumerError, RegistryError, SinkError};
pub use events::{
    Diagnostic, DiagnosticBus, DiagnosticKind, EventKind, EventRecord, Payload, Rect,
    SurfaceHandle, normalize_angle,
};
pub use identity::Identity;
pub use registry::{DisplayEvent, DisplayEvents, PortMultiplexer, PortRegistry, RoutingToken};
pub use sinks::{LogSink, SinkFn};

// Optional: a built-in sink that writes records through `tracing`.
// Enabled by default; disable with `--no-default-features`.
#[cfg(feature = "logging")]
pub use sinks::LogWriter;
