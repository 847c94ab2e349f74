//! # Consumer identity.
//!
//! An [`Identity`] is the routing key a [`PortRegistry`](crate::PortRegistry) uses to
//! address a consumer. It pairs a random v4 UUID, fixed at construction, with a
//! mutable human-readable label.
//!
//! ## Rules
//! - `id` is generated once and never changes.
//! - Equality and hashing use `id` only; the label is for display.

use std::fmt;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

/// Stable identity of a display console consumer.
#[derive(Clone)]
pub struct Identity {
    id: Uuid,
    label: String,
}

impl Identity {
    /// Creates a fresh identity with the default label.
    #[must_use]
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        Self {
            label: default_label(&id),
            id,
        }
    }

    /// Creates a fresh identity with a caller-chosen label.
    #[must_use]
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
        }
    }

    /// Routing key.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current label.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Replaces the label. Has no effect on routing or equality.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }
}

fn default_label(id: &Uuid) -> String {
    let simple = id.simple().to_string();
    format!("display-console-{}", &simple[..8])
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.id)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}
