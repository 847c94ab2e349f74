//! # Sink adapter: failure isolation around the logging sink.
//!
//! [`SinkAdapter`] holds the currently installed [`LogSink`] (if any) and invokes it
//! for one record at a time on behalf of the serialization worker.
//!
//! ## Rules
//! - **No sink installed**: the record is consumed silently.
//! - **Replacement**: [`SinkAdapter::replace`] swaps the reference under a lock; the
//!   worker clones the `Arc` before each call, so an in-flight call finishes with the
//!   sink captured at its start and the next record sees the new one.
//! - **Close**: [`SinkAdapter::close`] clears the slot and refuses every later
//!   `replace`, both under the same write lock. A sink installed concurrently with
//!   close is either released by it or refused.
//! - **Errors**: an `Err` from the sink becomes one `SinkFailed` diagnostic.
//! - **Panics**: caught with `catch_unwind` and turned into one `SinkPanicked` diagnostic.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave a sink's own shared state
//! inconsistent if it panics while holding a lock.

use std::any::Any;
use std::sync::{Arc, PoisonError, RwLock};

use futures::FutureExt;
use tracing::warn;

use crate::events::{Diagnostic, DiagnosticBus, EventRecord};
use crate::sinks::LogSink;

/// Outcome of handing one record to the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// No sink was installed; the record was dropped on the floor.
    Consumed,
    /// The sink accepted the record.
    Delivered,
    /// The sink returned an error.
    Failed,
    /// The sink panicked.
    Panicked,
}

impl Delivery {
    /// True if a sink was invoked and did not succeed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Delivery::Failed | Delivery::Panicked)
    }
}

struct Slot {
    sink: Option<Arc<dyn LogSink>>,
    closed: bool,
}

/// Holder of the replaceable logging sink.
pub(crate) struct SinkAdapter {
    current: RwLock<Slot>,
    bus: DiagnosticBus,
}

impl SinkAdapter {
    pub fn new(sink: Option<Arc<dyn LogSink>>, bus: DiagnosticBus) -> Self {
        Self {
            current: RwLock::new(Slot {
                sink,
                closed: false,
            }),
            bus,
        }
    }

    /// Installs `sink` (or removes the current one with `None`), returning the previous sink.
    ///
    /// After [`close`](Self::close) this does nothing and returns `None`; the incoming
    /// sink is dropped.
    pub fn replace(&self, sink: Option<Arc<dyn LogSink>>) -> Option<Arc<dyn LogSink>> {
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if slot.closed {
            return None;
        }
        std::mem::replace(&mut slot.sink, sink)
    }

    /// Releases the sink for good. Returns `false` if already closed.
    pub fn close(&self) -> bool {
        let released = {
            let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
            if slot.closed {
                return false;
            }
            slot.closed = true;
            slot.sink.take()
        };
        // dropped outside the lock: the sink's own Drop may be arbitrary
        drop(released);
        true
    }

    /// True once [`close`](Self::close) ran.
    pub fn is_closed(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }

    /// True if a sink is installed.
    pub fn is_installed(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sink
            .is_some()
    }

    /// Name of the installed sink, if any.
    pub fn sink_name(&self) -> Option<&'static str> {
        self.snapshot().map(|s| s.name())
    }

    fn snapshot(&self) -> Option<Arc<dyn LogSink>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sink
            .clone()
    }

    /// Invokes the installed sink with `record`.
    ///
    /// Must only be called from the serialization worker.
    pub async fn deliver(&self, record: &EventRecord) -> Delivery {
        let Some(sink) = self.snapshot() else {
            return Delivery::Consumed;
        };

        let fut = sink.on_record(record);
        match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(())) => Delivery::Delivered,
            Ok(Err(err)) => {
                warn!(
                    sink = sink.name(),
                    seq = record.seq,
                    kind = record.kind().as_label(),
                    error = %err,
                    "logging sink failed"
                );
                self.bus.publish(Diagnostic::sink_failed(
                    sink.name(),
                    record.seq,
                    record.kind(),
                    err.as_message(),
                ));
                Delivery::Failed
            }
            Err(panic_err) => {
                let info = panic_message(&*panic_err);
                warn!(
                    sink = sink.name(),
                    seq = record.seq,
                    kind = record.kind().as_label(),
                    panic = %info,
                    "logging sink panicked"
                );
                self.bus.publish(Diagnostic::sink_panicked(
                    sink.name(),
                    record.seq,
                    record.kind(),
                    info,
                ));
                Delivery::Panicked
            }
        }
    }
}

fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
