//! # Consumer configuration.
//!
//! Provides [`ConsumerConfig`] centralized settings for a display console consumer,
//! and [`TeardownPolicy`] which decides what happens to buffered records on detach.
//!
//! ## Sentinel values
//! - `label = None` → a default label derived from the identity (`display-console-<8 hex>`)
//! - `diagnostics_capacity = 0` → clamped to 1

/// What the serialization worker does with records still buffered when detach begins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TeardownPolicy {
    /// Deliver every record enqueued before detach was requested, then stop.
    #[default]
    Drain,
    /// Stop immediately; buffered but undelivered records are abandoned.
    Discard,
}

impl TeardownPolicy {
    /// Short label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            TeardownPolicy::Drain => "drain",
            TeardownPolicy::Discard => "discard",
        }
    }
}

/// Configuration for a single consumer.
///
/// ## Field semantics
/// - `teardown`: drain vs discard on detach (default: drain)
/// - `label`: initial human-readable label (display only, never used for routing)
/// - `diagnostics_capacity`: ring size of the diagnostic broadcast bus (min 1)
#[derive(Clone, Debug)]
pub struct ConsumerConfig {
    /// Teardown behavior for buffered records.
    pub teardown: TeardownPolicy,

    /// Initial label. `None` picks a default derived from the identity.
    pub label: Option<String>,

    /// Capacity of the diagnostic bus.
    ///
    /// Diagnostic receivers that fall behind observe `Lagged` and skip older items.
    pub diagnostics_capacity: usize,
}

impl ConsumerConfig {
    /// Returns the diagnostic bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn diagnostics_capacity_clamped(&self) -> usize {
        self.diagnostics_capacity.max(1)
    }
}

impl Default for ConsumerConfig {
    /// Default configuration:
    ///
    /// - `teardown = Drain`
    /// - `label = None`
    /// - `diagnostics_capacity = 256`
    fn default() -> Self {
        Self {
            teardown: TeardownPolicy::Drain,
            label: None,
            diagnostics_capacity: 256,
        }
    }
}
