//! Error types used by the display console.
//!
//! This module defines three enums:
//!
//! - [`SinkError`]: failures returned by a logging sink while handling a record.
//! - [`RegistryError`]: failures raised by a [`PortRegistry`](crate::PortRegistry).
//! - [`ConsumerError`]: failures surfaced to the owner of a consumer (attach / detach).
//!
//! Nothing here ever reaches a producer: ingestion calls are fire-and-forget.
//! Every type provides `as_label` (stable snake_case, for logs/metrics) and
//! `as_message` helpers.

use thiserror::Error;
use uuid::Uuid;

/// # Errors produced by a logging sink.
///
/// Returned from [`LogSink::on_record`](crate::LogSink::on_record). The adapter
/// catches it, publishes a `SinkFailed` diagnostic and moves on to the next record.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The sink could not handle this particular record.
    #[error("sink failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The sink's own backend is unavailable (closed file, dropped channel, ...).
    #[error("sink unavailable: {error}")]
    Unavailable {
        /// The underlying error message.
        error: String,
    },
}

impl SinkError {
    /// Shorthand for [`SinkError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        SinkError::Failed {
            error: error.into(),
        }
    }

    /// Shorthand for [`SinkError::Unavailable`].
    pub fn unavailable(error: impl Into<String>) -> Self {
        SinkError::Unavailable {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use display_console::SinkError;
    ///
    /// let err = SinkError::failed("disk full");
    /// assert_eq!(err.as_label(), "sink_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SinkError::Failed { .. } => "sink_failed",
            SinkError::Unavailable { .. } => "sink_unavailable",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SinkError::Failed { error } => format!("failed: {error}"),
            SinkError::Unavailable { error } => format!("unavailable: {error}"),
        }
    }
}

/// # Errors produced by a port registry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A consumer with the same identity is already registered.
    #[error("consumer {id} is already registered")]
    DuplicateIdentity {
        /// Identity that was already present.
        id: Uuid,
    },

    /// The registry no longer accepts registrations.
    #[error("registry is closed")]
    Closed,
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::DuplicateIdentity { .. } => "registry_duplicate_identity",
            RegistryError::Closed => "registry_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RegistryError::DuplicateIdentity { id } => format!("duplicate identity: {id}"),
            RegistryError::Closed => "registry closed".to_string(),
        }
    }
}

/// # Errors surfaced to the owner of a consumer.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// The registry refused the registration during attach.
    #[error("attach failed: {0}")]
    Registry(#[from] RegistryError),

    /// The serialization worker terminated abnormally (aborted or panicked outside the sink boundary).
    #[error("serialization worker lost: {reason}")]
    WorkerLost {
        /// Join error description.
        reason: String,
    },
}

impl ConsumerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use display_console::{ConsumerError, RegistryError};
    ///
    /// let err = ConsumerError::from(RegistryError::Closed);
    /// assert_eq!(err.as_label(), "consumer_attach_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConsumerError::Registry(_) => "consumer_attach_failed",
            ConsumerError::WorkerLost { .. } => "consumer_worker_lost",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ConsumerError::Registry(e) => format!("attach: {}", e.as_message()),
            ConsumerError::WorkerLost { reason } => format!("worker lost: {reason}"),
        }
    }
}
