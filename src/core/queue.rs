//! # Serialization worker.
//!
//! One tokio task per consumer drains the unbounded record queue and hands each
//! record to the [`SinkAdapter`], awaiting it before taking the next one. It is the
//! only caller of the sink, which is what makes sink calls strictly sequential.
//!
//! ## Loop
//! ```text
//! loop {
//!   select! (biased) {
//!     stop.cancelled()  ─► discard: close queue, count leftovers, exit
//!     rx.recv()
//!       ├─ Some(record) ─► adapter.deliver(&record).await ─► stats
//!       └─ None          ─► drain complete (ingress closed, queue empty), exit
//!   }
//! }
//! on exit: state → Detached, sink released
//! ```
//!
//! ## Rules
//! - The stop token is only cancelled in discard mode; drain mode ends when the
//!   ingress drops the sender and the queue runs dry.
//! - A delivery that already started always completes; the stop signal is checked
//!   between records.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::state::{ConsumerState, StateCell};
use crate::events::{Diagnostic, DiagnosticBus, DiagnosticKind, EventRecord};
use crate::sinks::{Delivery, SinkAdapter};

/// Delivery counters shared between the worker and the consumer handle.
#[derive(Default)]
pub(crate) struct Counters {
    pub(crate) delivered: AtomicU64,
    pub(crate) failed: AtomicU64,
    pub(crate) dropped_after_detach: AtomicU64,
    pub(crate) rejected: AtomicU64,
    pub(crate) discarded: AtomicU64,
}

/// Why the worker stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    /// Every queued record was handed to the sink.
    Drained,
    /// Stopped on the stop signal; this many records were abandoned.
    Discarded(u64),
}

pub(crate) struct SerialQueue {
    pub(crate) rx: mpsc::UnboundedReceiver<EventRecord>,
    pub(crate) adapter: Arc<SinkAdapter>,
    pub(crate) stop: CancellationToken,
    pub(crate) state: Arc<StateCell>,
    pub(crate) counters: Arc<Counters>,
    pub(crate) bus: DiagnosticBus,
    pub(crate) consumer: Arc<str>,
}

impl SerialQueue {
    /// Runs until the queue is drained or the stop signal fires.
    pub(crate) async fn run(mut self) -> WorkerExit {
        debug!(consumer = %self.consumer, "serialization worker started");

        let exit = loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => {
                    break WorkerExit::Discarded(self.discard_rest());
                }
                msg = self.rx.recv() => match msg {
                    Some(record) => self.deliver(record).await,
                    None => break WorkerExit::Drained,
                },
            }
        };

        self.finish(exit);
        exit
    }

    async fn deliver(&self, record: EventRecord) {
        let outcome = self.adapter.deliver(&record).await;
        if outcome.is_failure() {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
        }
        if outcome != Delivery::Consumed {
            self.counters.delivered.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn discard_rest(&mut self) -> u64 {
        self.rx.close();
        let mut n = 0;
        while self.rx.try_recv().is_ok() {
            n += 1;
        }
        if n > 0 {
            self.counters.discarded.fetch_add(n, Ordering::Relaxed);
            self.bus.publish(
                Diagnostic::new(DiagnosticKind::Discarded).with_reason(n.to_string()),
            );
        }
        n
    }

    fn finish(&self, exit: WorkerExit) {
        if let Some(prev) = self.state.advance(ConsumerState::Detached) {
            self.bus.publish(
                Diagnostic::new(DiagnosticKind::StateChanged)
                    .with_reason(format!("{}->detached", prev.as_label())),
            );
        }
        // release whatever the caller captured in the sink
        self.adapter.close();

        match exit {
            WorkerExit::Drained => info!(consumer = %self.consumer, "consumer detached (drained)"),
            WorkerExit::Discarded(n) => {
                info!(consumer = %self.consumer, discarded = n, "consumer detached (discarded)")
            }
        }
    }
}
