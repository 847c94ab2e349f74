//! # Diagnostics published on the side channel.
//!
//! The [`DiagnosticKind`] enum classifies everything the console reports about
//! itself, as opposed to the display records it forwards:
//! - **Sink events**: the logging sink failed or panicked on a record
//! - **Ingestion events**: a notification was rejected before sequencing
//! - **Lifecycle events**: state transitions and discarded buffers
//!
//! ## Ordering guarantees
//! Each diagnostic has a process-wide sequence number (`seq`) of its own, unrelated
//! to record sequence numbers. A diagnostic about a record carries that record's
//! sequence in `record_seq`.
//!
//! ## Example
//! ```rust
//! use display_console::{Diagnostic, DiagnosticKind, EventKind};
//!
//! let d = Diagnostic::new(DiagnosticKind::SinkFailed)
//!     .with_record(4, EventKind::RotationChanged)
//!     .with_sink("file")
//!     .with_reason("disk full");
//!
//! assert_eq!(d.kind, DiagnosticKind::SinkFailed);
//! assert_eq!(d.record_seq, Some(4));
//! assert_eq!(d.reason.as_deref(), Some("disk full"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use super::record::EventKind;

/// Global sequence counter for diagnostic ordering.
static DIAGNOSTIC_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    // === Sink events ===
    /// The sink returned an error for a record.
    ///
    /// Sets:
    /// - `record_seq`, `record_kind`: the failing record
    /// - `sink`: sink name
    /// - `reason`: error message
    SinkFailed,

    /// The sink panicked while handling a record.
    ///
    /// Sets:
    /// - `record_seq`, `record_kind`: the failing record
    /// - `sink`: sink name
    /// - `reason`: panic payload
    SinkPanicked,

    // === Ingestion events ===
    /// A rotation angle could not be normalized (NaN or infinite) and was dropped.
    ///
    /// Sets:
    /// - `record_kind`: `RotationChanged`
    /// - `reason`: the raw value
    AngleRejected,

    // === Lifecycle events ===
    /// Consumer state changed.
    ///
    /// Sets:
    /// - `reason`: `"<from>-><to>"`
    StateChanged,

    /// Discard teardown abandoned buffered records.
    ///
    /// Sets:
    /// - `reason`: number of abandoned records
    Discarded,
}

/// Diagnostic with optional metadata.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Process-wide, monotonically increasing diagnostic sequence.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Classification.
    pub kind: DiagnosticKind,
    /// Sequence of the record this diagnostic is about, if any.
    pub record_seq: Option<u64>,
    /// Kind of the record this diagnostic is about, if any.
    pub record_kind: Option<EventKind>,
    /// Name of the sink involved, if any.
    pub sink: Option<&'static str>,
    /// Human-readable detail.
    pub reason: Option<Arc<str>>,
}

impl Diagnostic {
    /// Creates a new diagnostic of the given kind with current timestamp and next sequence number.
    pub fn new(kind: DiagnosticKind) -> Self {
        Self {
            seq: DIAGNOSTIC_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            record_seq: None,
            record_kind: None,
            sink: None,
            reason: None,
        }
    }

    /// Attaches the record this diagnostic refers to.
    #[inline]
    pub fn with_record(mut self, seq: u64, kind: EventKind) -> Self {
        self.record_seq = Some(seq);
        self.record_kind = Some(kind);
        self
    }

    /// Attaches a record kind without a sequence (record never got one).
    #[inline]
    pub fn with_record_kind(mut self, kind: EventKind) -> Self {
        self.record_kind = Some(kind);
        self
    }

    /// Attaches a sink name.
    #[inline]
    pub fn with_sink(mut self, sink: &'static str) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a sink failure diagnostic.
    #[inline]
    pub fn sink_failed(sink: &'static str, seq: u64, kind: EventKind, error: String) -> Self {
        Diagnostic::new(DiagnosticKind::SinkFailed)
            .with_record(seq, kind)
            .with_sink(sink)
            .with_reason(error)
    }

    /// Creates a sink panic diagnostic.
    #[inline]
    pub fn sink_panicked(sink: &'static str, seq: u64, kind: EventKind, info: String) -> Self {
        Diagnostic::new(DiagnosticKind::SinkPanicked)
            .with_record(seq, kind)
            .with_sink(sink)
            .with_reason(info)
    }

    /// True for `SinkFailed` and `SinkPanicked`.
    #[inline]
    pub fn is_sink_failure(&self) -> bool {
        matches!(
            self.kind,
            DiagnosticKind::SinkFailed | DiagnosticKind::SinkPanicked
        )
    }
}
