//! # Consumer lifecycle state.
//!
//! ```text
//! Active ──detach()/drop──► Detaching ──worker drained or discarded──► Detached
//! ```
//!
//! ## Rules
//! - Transitions only move forward; `Detached` is terminal.
//! - The current value lives in a `watch` channel so async callers can wait for
//!   `Detached` without polling.

use std::fmt;

use tokio::sync::watch;

/// Lifecycle state of a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConsumerState {
    /// Accepting notifications.
    Active,
    /// Detach requested; ingestion is closed, the worker is draining or discarding.
    Detaching,
    /// Terminal. The sink will not be called again.
    Detached,
}

impl ConsumerState {
    pub fn as_label(&self) -> &'static str {
        match self {
            ConsumerState::Active => "active",
            ConsumerState::Detaching => "detaching",
            ConsumerState::Detached => "detached",
        }
    }
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConsumerState::Active => "Active",
            ConsumerState::Detaching => "Detaching",
            ConsumerState::Detached => "Detached",
        };
        f.write_str(s)
    }
}

/// Forward-only state holder.
pub(crate) struct StateCell {
    tx: watch::Sender<ConsumerState>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(ConsumerState::Active);
        Self { tx }
    }

    pub(crate) fn get(&self) -> ConsumerState {
        *self.tx.borrow()
    }

    /// Moves to `to` if it is ahead of the current state.
    ///
    /// Returns the previous state when a transition happened.
    pub(crate) fn advance(&self, to: ConsumerState) -> Option<ConsumerState> {
        let mut prev = None;
        self.tx.send_if_modified(|cur| {
            if *cur < to {
                prev = Some(*cur);
                *cur = to;
                true
            } else {
                false
            }
        });
        prev
    }

    /// Resolves once the state is at least `target`.
    pub(crate) async fn reached(&self, target: ConsumerState) {
        let mut rx = self.tx.subscribe();
        // the sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|s| *s >= target).await;
    }
}
