//! # In-memory port multiplexer.
//!
//! [`PortMultiplexer`] keeps registered consumers in a map keyed by routing token,
//! with a secondary index by identity id, and forwards notifications to them.
//!
//! ## Rules
//! - One registration per identity; a second one fails with `DuplicateIdentity`.
//! - Tokens come from a counter and are never reused.
//! - `unregister` is idempotent.
//! - Routing clones the target handle and releases the lock before calling it,
//!   so a consumer may detach from inside a notification without deadlocking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;
use uuid::Uuid;

use super::{DisplayEvent, DisplayEvents, PortRegistry, RoutingToken};
use crate::error::RegistryError;
use crate::identity::Identity;

struct Port {
    id: Uuid,
    events: Arc<dyn DisplayEvents>,
}

#[derive(Default)]
struct Ports {
    by_token: HashMap<RoutingToken, Port>,
    by_id: HashMap<Uuid, RoutingToken>,
}

/// Identity-routed registry of display consumers.
pub struct PortMultiplexer {
    ports: RwLock<Ports>,
    next_token: AtomicU64,
    closed: AtomicBool,
}

impl PortMultiplexer {
    /// Creates an empty multiplexer.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ports: RwLock::new(Ports::default()),
            next_token: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }

    /// Routes `event` to the consumer registered under `id`.
    ///
    /// Returns `false` if nobody is registered under that id.
    pub fn route(&self, id: Uuid, event: DisplayEvent) -> bool {
        let target = {
            let ports = self.ports.read().unwrap_or_else(PoisonError::into_inner);
            ports
                .by_id
                .get(&id)
                .and_then(|t| ports.by_token.get(t))
                .map(|p| Arc::clone(&p.events))
        };
        match target {
            Some(events) => {
                event.dispatch_to(events.as_ref());
                true
            }
            None => false,
        }
    }

    /// Sends `event` to every registered consumer; returns how many received it.
    pub fn broadcast(&self, event: DisplayEvent) -> usize {
        let targets: Vec<Arc<dyn DisplayEvents>> = {
            let ports = self.ports.read().unwrap_or_else(PoisonError::into_inner);
            ports
                .by_token
                .values()
                .map(|p| Arc::clone(&p.events))
                .collect()
        };
        for t in &targets {
            event.clone().dispatch_to(t.as_ref());
        }
        targets.len()
    }

    /// True if a consumer is registered under `id`.
    pub fn contains(&self, id: Uuid) -> bool {
        self.ports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .contains_key(&id)
    }

    /// Number of registered consumers.
    pub fn len(&self) -> usize {
        self.ports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_token
            .len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refuses further registrations. Existing ones keep routing until unregistered.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl PortRegistry for PortMultiplexer {
    fn register(
        &self,
        identity: &Identity,
        events: Arc<dyn DisplayEvents>,
    ) -> Result<RoutingToken, RegistryError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RegistryError::Closed);
        }

        let id = identity.id();
        let mut ports = self.ports.write().unwrap_or_else(PoisonError::into_inner);
        if ports.by_id.contains_key(&id) {
            return Err(RegistryError::DuplicateIdentity { id });
        }

        let token = RoutingToken::new(self.next_token.fetch_add(1, Ordering::Relaxed));
        ports.by_token.insert(token, Port { id, events });
        ports.by_id.insert(id, token);
        drop(ports);

        debug!(%token, consumer = identity.label(), %id, "port registered");
        Ok(token)
    }

    fn unregister(&self, token: RoutingToken) {
        let mut ports = self.ports.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(port) = ports.by_token.remove(&token) {
            ports.by_id.remove(&port.id);
            drop(ports);
            debug!(%token, id = %port.id, "port unregistered");
        }
    }
}
