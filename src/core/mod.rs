//! Consumer core: ingestion, serialization and lifecycle.
//!
//! The only public API from this module is [`Consumer`] (with its builder, stats
//! and state). Everything else is an implementation detail.
//!
//! Internal modules:
//! - [`ingress`]: sequence assignment and enqueue under one lock;
//! - [`queue`]: the serialization worker that alone calls the sink;
//! - [`state`]: forward-only lifecycle state with async waiting;
//! - [`consumer`]: attach/detach orchestration and the public handle;
//! - [`builder`]: fluent construction.

mod builder;
mod consumer;
mod ingress;
mod queue;
mod state;

pub use builder::ConsumerBuilder;
pub use consumer::{Consumer, ConsumerStats};
pub use state::ConsumerState;
