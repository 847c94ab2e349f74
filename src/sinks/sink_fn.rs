//! # Closure-backed sink (`SinkFn`)
//!
//! [`SinkFn`] wraps a synchronous closure `F: Fn(&EventRecord) -> Result<(), SinkError>`
//! as a [`LogSink`]. State captured by the closure belongs to the caller; share it
//! through `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use display_console::{EventRecord, LogSink, SinkError, SinkFn};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = SinkFn::arc("collect", {
//!     let seen = Arc::clone(&seen);
//!     move |r: &EventRecord| -> Result<(), SinkError> {
//!         seen.lock().unwrap().push(r.seq);
//!         Ok(())
//!     }
//! });
//! assert_eq!(sink.name(), "collect");
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::events::EventRecord;
use crate::sinks::LogSink;

/// Function-backed sink implementation.
pub struct SinkFn<F> {
    name: &'static str,
    f: F,
}

impl<F> SinkFn<F>
where
    F: Fn(&EventRecord) -> Result<(), SinkError> + Send + Sync + 'static,
{
    /// Creates a new function-backed sink.
    ///
    /// Prefer [`SinkFn::arc`] when you immediately need an `Arc<dyn LogSink>`.
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }

    /// Creates the sink and returns it as a shared handle.
    pub fn arc(name: &'static str, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> fmt::Debug for SinkFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkFn").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> LogSink for SinkFn<F>
where
    F: Fn(&EventRecord) -> Result<(), SinkError> + Send + Sync + 'static,
{
    async fn on_record(&self, record: &EventRecord) -> Result<(), SinkError> {
        (self.f)(record)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
