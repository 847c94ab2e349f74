//! # LogWriter: record printer
//!
//! A minimal sink that renders each [`EventRecord`] through `tracing` at debug level.
//! Use it for tests or demos; install a `tracing` subscriber to see the output.
//!
//! ## Example output
//! ```text
//! [damage] seq=1 rect=(0, 0, 320x240)
//! [rotation] seq=2 angle=90
//! [surface] seq=3 handle=SurfaceHandle(0x6000031b4010)
//! [surface] seq=4 handle=none
//! ```

use async_trait::async_trait;
use tracing::debug;

use crate::error::SinkError;
use crate::events::EventRecord;
use crate::sinks::LogSink;

/// Record writer sink.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LogSink for LogWriter {
    async fn on_record(&self, record: &EventRecord) -> Result<(), SinkError> {
        debug!(
            target: "display_console::record",
            seq = record.seq,
            kind = record.kind().as_label(),
            "{record}"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Payload;

    #[tokio::test]
    async fn never_fails() {
        let w = LogWriter::new();
        let r = EventRecord::new(1, Payload::SurfaceChanged(None));
        assert!(w.on_record(&r).await.is_ok());
        assert_eq!(w.name(), "LogWriter");
    }
}
