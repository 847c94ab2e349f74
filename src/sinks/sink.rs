//! # Logging sink trait.
//!
//! [`LogSink`] is the extension point for plugging a debug logging callback into
//! a consumer. The consumer drives it from its single serialization worker.
//!
//! ## Contract
//! - One call per delivered record, in ascending `seq` order.
//! - Never called concurrently with itself.
//! - A slow sink stalls later deliveries (there is no per-record timeout); it never
//!   blocks producers, which only append to an unbounded buffer.
//! - Returning `Err` or panicking is reported on the diagnostic bus and the worker
//!   moves on to the next record.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use display_console::{EventKind, EventRecord, LogSink, SinkError};
//!
//! struct DamageCounter(std::sync::atomic::AtomicU64);
//!
//! #[async_trait]
//! impl LogSink for DamageCounter {
//!     async fn on_record(&self, record: &EventRecord) -> Result<(), SinkError> {
//!         if record.kind() == EventKind::DamageRect {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &'static str { "damage-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::error::SinkError;
use crate::events::EventRecord;

/// Debug logging sink for display records.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Keep it short or hand work off elsewhere: a stalled sink stalls the console.
#[async_trait]
pub trait LogSink: Send + Sync + 'static {
    /// Handles a single record.
    ///
    /// Called from the consumer's worker task, never from the producer context.
    async fn on_record(&self, record: &EventRecord) -> Result<(), SinkError>;

    /// Name used in logs and failure diagnostics.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
