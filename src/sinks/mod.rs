//! # Logging sinks for display records.
//!
//! This module provides the [`LogSink`] trait, the [`SinkAdapter`] that isolates the
//! console from sink failures, and built-in implementations.
//!
//! ## Architecture
//! ```text
//! serialization worker ──► SinkAdapter::deliver(&record)
//!                               │  (Arc snapshot of the current sink)
//!                               ├──► sink.on_record() ── Ok ──► next record
//!                               ├──► Err   → SinkFailed   ──► DiagnosticBus
//!                               └──► panic → SinkPanicked ──► DiagnosticBus
//! ```
//!
//! ## Sink types
//! - [`SinkFn`]: wraps a closure (the usual "logging callback")
//! - [`LogWriter`]: renders records through `tracing` (feature `logging`)
//! - anything implementing [`LogSink`]

mod adapter;
#[cfg(feature = "logging")]
mod log;
mod sink;
mod sink_fn;

pub(crate) use adapter::{Delivery, SinkAdapter};
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use sink::LogSink;
pub use sink_fn::SinkFn;
