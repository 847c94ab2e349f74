use std::sync::Arc;

use crate::{
    config::{ConsumerConfig, TeardownPolicy},
    error::{ConsumerError, SinkError},
    events::EventRecord,
    registry::PortRegistry,
    sinks::{LogSink, SinkFn},
};

use super::consumer::Consumer;

/// Builder for attaching a [`Consumer`] with optional settings.
pub struct ConsumerBuilder {
    cfg: ConsumerConfig,
    sink: Option<Arc<dyn LogSink>>,
}

impl ConsumerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ConsumerConfig) -> Self {
        Self { cfg, sink: None }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: ConsumerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Human-readable label used in logs and `Display`.
    ///
    /// Defaults to `display-console-<id prefix>`.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.cfg.label = Some(label.into());
        self
    }

    /// What happens to buffered records on detach.
    pub fn with_teardown(mut self, policy: TeardownPolicy) -> Self {
        self.cfg.teardown = policy;
        self
    }

    /// Capacity of the diagnostic side channel.
    pub fn with_diagnostics_capacity(mut self, capacity: usize) -> Self {
        self.cfg.diagnostics_capacity = capacity;
        self
    }

    /// Sink installed from the start.
    ///
    /// Without one, records are consumed silently until [`Consumer::set_sink`].
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Installs a closure as the sink.
    pub fn with_sink_fn<F>(self, name: &'static str, f: F) -> Self
    where
        F: Fn(&EventRecord) -> Result<(), SinkError> + Send + Sync + 'static,
    {
        self.with_sink(SinkFn::arc(name, f))
    }

    /// Registers with `registry`, starts the serialization worker and returns the
    /// attached consumer.
    ///
    /// # Errors
    /// [`ConsumerError::Registry`] if the registry refuses the registration.
    ///
    /// # Panics
    /// If called outside a tokio runtime.
    pub fn attach(self, registry: Arc<dyn PortRegistry>) -> Result<Consumer, ConsumerError> {
        Consumer::attach(self.cfg, self.sink, registry)
    }
}

impl Default for ConsumerBuilder {
    fn default() -> Self {
        Self::new(ConsumerConfig::default())
    }
}
