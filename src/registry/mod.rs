//! # Port registry: routing display notifications to consumers.
//!
//! The registry (the device's port multiplexer) is an external collaborator. This
//! module defines the seam the console talks to, plus an in-memory implementation.
//!
//! ## Protocol
//! ```text
//! Consumer::attach ──► registry.register(identity, ingest handle) ──► RoutingToken
//! display server   ──► registry routes by identity ──► DisplayEvents::on_*()
//! Consumer::detach ──► registry.unregister(token)   (first action, exactly once)
//! ```
//!
//! ## Contents
//! - [`DisplayEvents`]: the three push entry points a producer calls
//! - [`DisplayEvent`]: one notification as a value (for routing/broadcast)
//! - [`PortRegistry`], [`RoutingToken`]: the attach/detach contract
//! - [`PortMultiplexer`]: in-memory registry keyed by identity

mod multiplexer;

use std::fmt;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::events::{Rect, SurfaceHandle};
use crate::identity::Identity;

pub use multiplexer::PortMultiplexer;

/// Push interface for display notifications.
///
/// Each call is a discrete, self-contained notification. Implementations must be
/// callable from any thread, concurrently, and must not block.
pub trait DisplayEvents: Send + Sync + 'static {
    /// A region of the display was damaged.
    fn on_damage_rect(&self, rect: Rect);

    /// The render surface changed; `None` if the display lost its surface.
    fn on_surface_changed(&self, surface: Option<SurfaceHandle>);

    /// The display rotation changed (degrees, any range).
    fn on_rotation_changed(&self, degrees: f64);
}

/// One display notification as a value.
#[derive(Debug, Clone)]
pub enum DisplayEvent {
    DamageRect(Rect),
    SurfaceChanged(Option<SurfaceHandle>),
    RotationChanged(f64),
}

impl DisplayEvent {
    /// Calls the matching entry point on `target`.
    pub fn dispatch_to(self, target: &dyn DisplayEvents) {
        match self {
            DisplayEvent::DamageRect(rect) => target.on_damage_rect(rect),
            DisplayEvent::SurfaceChanged(surface) => target.on_surface_changed(surface),
            DisplayEvent::RotationChanged(degrees) => target.on_rotation_changed(degrees),
        }
    }
}

/// Registry's handle for a registered consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutingToken(u64);

impl RoutingToken {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoutingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port#{}", self.0)
    }
}

/// Attach/detach contract with the port multiplexer.
///
/// Both calls are synchronous so they can run from `Drop`.
pub trait PortRegistry: Send + Sync + 'static {
    /// Starts routing notifications addressed to `identity` into `events`.
    fn register(
        &self,
        identity: &Identity,
        events: Arc<dyn DisplayEvents>,
    ) -> Result<RoutingToken, RegistryError>;

    /// Stops routing for `token`. Unknown tokens are ignored.
    fn unregister(&self, token: RoutingToken);
}
