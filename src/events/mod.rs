//! Display records and console diagnostics.
//!
//! This module groups the record **data model** handed to logging sinks and the
//! **diagnostic bus** used to report sink failures and lifecycle transitions.
//!
//! ## Contents
//! - [`EventRecord`], [`EventKind`], [`Payload`], [`Rect`], [`SurfaceHandle`]: what sinks receive
//! - [`Diagnostic`], [`DiagnosticKind`]: what the side channel carries
//! - [`DiagnosticBus`]: thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Record producers**: the ingestion surface (`Consumer::on_*`).
//! - **Record consumer**: the serialization worker, which hands records to the sink adapter.
//! - **Diagnostic publishers**: the sink adapter (failures), ingestion (rejected angles),
//!   the lifecycle controller (state changes, discards).

mod bus;
mod diagnostic;
mod record;

pub use bus::DiagnosticBus;
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use record::{EventKind, EventRecord, Payload, Rect, SurfaceHandle, normalize_angle};
