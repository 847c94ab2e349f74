//! # Diagnostic bus.
//!
//! [`DiagnosticBus`] is a thin wrapper around [`tokio::sync::broadcast`] carrying
//! [`Diagnostic`]s from the serialization worker and the lifecycle controller to
//! whoever is watching. It is the side channel: display records never travel here.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks and is safe from sync code.
//! - **Bounded capacity**: one ring buffer shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: diagnostics are lost if nobody is subscribed at send time.

use tokio::sync::broadcast;

use super::diagnostic::Diagnostic;

/// Broadcast channel for diagnostics.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct DiagnosticBus {
    tx: broadcast::Sender<Diagnostic>,
}

impl DiagnosticBus {
    /// Creates a new bus with the given channel capacity (minimum 1, clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Diagnostic>(capacity);
        Self { tx }
    }

    /// Publishes a diagnostic to all active receivers.
    ///
    /// If there are no receivers, the diagnostic is dropped.
    pub fn publish(&self, d: Diagnostic) {
        let _ = self.tx.send(d);
    }

    /// Creates a new receiver that observes diagnostics sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Diagnostic> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DiagnosticKind;

    #[tokio::test]
    async fn publish_reaches_every_receiver() {
        let bus = DiagnosticBus::new(4);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        bus.publish(Diagnostic::new(DiagnosticKind::StateChanged).with_reason("x"));

        assert_eq!(a.recv().await.unwrap().reason.as_deref(), Some("x"));
        assert_eq!(b.recv().await.unwrap().reason.as_deref(), Some("x"));
    }

    #[test]
    fn publish_without_receivers_is_silent() {
        let bus = DiagnosticBus::new(0);
        bus.publish(Diagnostic::new(DiagnosticKind::Discarded));
        assert_eq!(bus.receiver_count(), 0);
    }
}
