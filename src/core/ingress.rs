//! # Ingress: sequence assignment and enqueue.
//!
//! [`Ingress`] is the only point of mutual exclusion on the producer path. Under one
//! short lock it checks that ingestion is still open, assigns the next sequence
//! number and appends the record to the unbounded queue. Doing both under the same
//! lock is what makes queue order equal sequence order.
//!
//! ## Rules
//! - Sequences start at 1 and have no gaps among accepted records.
//! - `close()` drops the queue sender; after it every `push` is refused.
//! - `push` never waits on the worker or the sink.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::events::{EventRecord, Payload};

struct Inner {
    next_seq: u64,
    tx: Option<mpsc::UnboundedSender<EventRecord>>,
}

pub(crate) struct Ingress {
    inner: Mutex<Inner>,
}

impl Ingress {
    pub(crate) fn new(tx: mpsc::UnboundedSender<EventRecord>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_seq: 1,
                tx: Some(tx),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sequences and enqueues `payload`. Returns the assigned sequence, or `None`
    /// if ingestion is closed.
    pub(crate) fn push(&self, payload: Payload) -> Option<u64> {
        let mut inner = self.lock();
        let seq = inner.next_seq;
        let tx = inner.tx.as_ref()?;
        tx.send(EventRecord::new(seq, payload)).ok()?;
        inner.next_seq += 1;
        Some(seq)
    }

    /// Closes ingestion and runs `on_close` while still holding the lock, so no
    /// producer can slip a record in between.
    ///
    /// Returns `false` if ingestion was already closed (`on_close` is not called).
    pub(crate) fn close_with(&self, on_close: impl FnOnce()) -> bool {
        let mut inner = self.lock();
        match inner.tx.take() {
            Some(tx) => {
                on_close();
                drop(tx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.lock().tx.is_some()
    }

    /// Number of sequences handed out so far.
    pub(crate) fn issued(&self) -> u64 {
        self.lock().next_seq - 1
    }
}
