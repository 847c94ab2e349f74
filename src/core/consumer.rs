//! # Consumer: the display console itself.
//!
//! A [`Consumer`] attaches to a [`PortRegistry`], accepts display notifications on
//! its ingestion surface and forwards them, one at a time and in sequence order, to
//! the installed [`LogSink`].
//!
//! ## Architecture
//! ```text
//! producers (any thread) ──► on_damage_rect / on_surface_changed / on_rotation_changed
//!                                 │ Ingress (lock: seq++ + enqueue)
//!                                 ▼
//!                          [unbounded queue] ──► SerialQueue worker ──► SinkAdapter ──► sink
//!                                                       │                   └─► DiagnosticBus
//!                                                       └─► state → Detached on exit
//! ```
//!
//! ## Detach sequence
//! 1. `registry.unregister(token)` (exactly once, first)
//! 2. ingress closed and state → `Detaching` (atomically w.r.t. producers)
//! 3. discard mode only: stop token cancelled
//! 4. worker drains or discards, releases the sink, state → `Detached`
//!
//! Dropping a consumer runs steps 1-3; the worker finishes step 4 in the background.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::config::{ConsumerConfig, TeardownPolicy};
use crate::core::builder::ConsumerBuilder;
use crate::core::ingress::Ingress;
use crate::core::queue::{Counters, SerialQueue, WorkerExit};
use crate::core::state::{ConsumerState, StateCell};
use crate::error::ConsumerError;
use crate::events::{
    Diagnostic, DiagnosticBus, DiagnosticKind, EventKind, Payload, Rect, SurfaceHandle,
    normalize_angle,
};
use crate::identity::Identity;
use crate::registry::{DisplayEvents, PortRegistry, RoutingToken};
use crate::sinks::{LogSink, SinkAdapter};

/// Point-in-time delivery statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Records accepted and sequenced.
    pub ingested: u64,
    /// Records handed to an installed sink (successfully or not).
    pub delivered: u64,
    /// Deliveries where the sink returned an error or panicked.
    pub failed: u64,
    /// Notifications ignored because detach had begun.
    pub dropped_after_detach: u64,
    /// Rotation notifications with a non-finite angle.
    pub rejected: u64,
    /// Buffered records abandoned by discard teardown.
    pub discarded: u64,
}

/// The ingestion surface, shared with the registry.
struct Shared {
    identity: RwLock<Identity>,
    ingress: Ingress,
    state: Arc<StateCell>,
    bus: DiagnosticBus,
    counters: Arc<Counters>,
}

impl Shared {
    fn ingest(&self, payload: Payload) {
        let kind = payload.kind();
        match self.ingress.push(payload) {
            Some(seq) => trace!(seq, kind = kind.as_label(), "record queued"),
            None => {
                self.counters
                    .dropped_after_detach
                    .fetch_add(1, Ordering::Relaxed);
                trace!(kind = kind.as_label(), "notification after detach ignored");
            }
        }
    }

    fn label(&self) -> String {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .label()
            .to_string()
    }
}

impl DisplayEvents for Shared {
    fn on_damage_rect(&self, rect: Rect) {
        self.ingest(Payload::DamageRect(rect));
    }

    fn on_surface_changed(&self, surface: Option<SurfaceHandle>) {
        self.ingest(Payload::SurfaceChanged(surface));
    }

    fn on_rotation_changed(&self, degrees: f64) {
        match normalize_angle(degrees) {
            Some(angle) => self.ingest(Payload::RotationChanged(angle)),
            None if !self.ingress.is_open() => {
                self.ingest(Payload::RotationChanged(degrees));
            }
            None => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(degrees, "rotation angle rejected: not finite");
                self.bus.publish(
                    Diagnostic::new(DiagnosticKind::AngleRejected)
                        .with_record_kind(EventKind::RotationChanged)
                        .with_reason(degrees.to_string()),
                );
            }
        }
    }
}

/// Display console consumer.
///
/// Created with [`Consumer::builder`]. Must be attached from within a tokio runtime
/// (the serialization worker is spawned at attach); the `on_*` entry points may be
/// called from any thread.
pub struct Consumer {
    id: Uuid,
    shared: Arc<Shared>,
    adapter: Arc<SinkAdapter>,
    registry: Arc<dyn PortRegistry>,
    token: Mutex<Option<RoutingToken>>,
    stop: CancellationToken,
    worker: AsyncMutex<Option<JoinHandle<WorkerExit>>>,
    teardown: TeardownPolicy,
}

impl Consumer {
    /// Starts building a consumer with default configuration.
    pub fn builder() -> ConsumerBuilder {
        ConsumerBuilder::new(ConsumerConfig::default())
    }

    /// Registers with `registry` and starts the serialization worker.
    ///
    /// # Panics
    /// If called outside a tokio runtime.
    pub(crate) fn attach(
        cfg: ConsumerConfig,
        sink: Option<Arc<dyn LogSink>>,
        registry: Arc<dyn PortRegistry>,
    ) -> Result<Self, ConsumerError> {
        let capacity = cfg.diagnostics_capacity_clamped();
        let identity = match cfg.label {
            Some(label) => Identity::with_label(label),
            None => Identity::new(),
        };
        let id = identity.id();
        let label: Arc<str> = Arc::from(identity.label());

        let bus = DiagnosticBus::new(capacity);
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(StateCell::new());
        let counters = Arc::new(Counters::default());

        let shared = Arc::new(Shared {
            ingress: Ingress::new(tx),
            state: Arc::clone(&state),
            bus: bus.clone(),
            counters: Arc::clone(&counters),
            identity: RwLock::new(identity.clone()),
        });

        let token = registry.register(&identity, Arc::clone(&shared) as Arc<dyn DisplayEvents>)?;

        let adapter = Arc::new(SinkAdapter::new(sink, bus.clone()));
        let stop = CancellationToken::new();
        let queue = SerialQueue {
            rx,
            adapter: Arc::clone(&adapter),
            stop: stop.clone(),
            state,
            counters,
            bus,
            consumer: Arc::clone(&label),
        };
        let worker = tokio::spawn(queue.run());

        info!(
            consumer = %label,
            %id,
            %token,
            teardown = cfg.teardown.as_label(),
            sink = adapter.sink_name().unwrap_or("none"),
            "consumer attached"
        );

        Ok(Self {
            id,
            shared,
            adapter,
            registry,
            token: Mutex::new(Some(token)),
            stop,
            worker: AsyncMutex::new(Some(worker)),
            teardown: cfg.teardown,
        })
    }

    /// Routing key of this consumer.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Snapshot of the identity (id + current label).
    pub fn identity(&self) -> Identity {
        self.shared
            .identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current label.
    pub fn label(&self) -> String {
        self.shared.label()
    }

    /// Changes the display label. Routing is unaffected.
    pub fn set_label(&self, label: impl Into<String>) {
        self.shared
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_label(label);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConsumerState {
        self.shared.state.get()
    }

    /// Teardown policy this consumer was built with.
    pub fn teardown(&self) -> TeardownPolicy {
        self.teardown
    }

    /// Installs (or replaces) the logging sink.
    ///
    /// Takes effect from the next record; a call already in progress finishes with
    /// the previous sink. Ignored once the worker has released its sink on detach.
    pub fn set_sink(&self, sink: Arc<dyn LogSink>) {
        self.adapter.replace(Some(sink));
        if self.adapter.is_closed() {
            debug!(consumer = %self.label(), "set_sink after detach ignored");
        }
    }

    /// Removes the logging sink; records are consumed silently until a new one is set.
    pub fn clear_sink(&self) {
        self.adapter.replace(None);
    }

    /// True if a sink is installed.
    pub fn has_sink(&self) -> bool {
        self.adapter.is_installed()
    }

    /// New receiver on the diagnostic side channel.
    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.shared.bus.subscribe()
    }

    /// A handle to the ingestion surface that can be given to producers directly.
    ///
    /// The handle does not keep the consumer attached; once detach begins, calls on
    /// it are ignored.
    pub fn ingest_handle(&self) -> Arc<dyn DisplayEvents> {
        Arc::clone(&self.shared) as Arc<dyn DisplayEvents>
    }

    /// Delivery statistics.
    pub fn stats(&self) -> ConsumerStats {
        let c = &self.shared.counters;
        ConsumerStats {
            ingested: self.shared.ingress.issued(),
            delivered: c.delivered.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            dropped_after_detach: c.dropped_after_detach.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            discarded: c.discarded.load(Ordering::Relaxed),
        }
    }

    /// Detaches the consumer and waits until it is `Detached`.
    ///
    /// - Drain: returns after every record queued before this call was delivered.
    /// - Discard: returns once the in-flight delivery (if any) completes; buffered
    ///   records are abandoned.
    ///
    /// Idempotent: later calls only wait for the terminal state.
    pub async fn detach(&self) -> Result<ConsumerStats, ConsumerError> {
        self.begin_detach();

        let handle = self.worker.lock().await.take();
        match handle {
            Some(handle) => match handle.await {
                Ok(exit) => debug!(consumer = %self.label(), ?exit, "worker joined"),
                Err(e) => {
                    // the worker never got to record the transition
                    self.shared.state.advance(ConsumerState::Detached);
                    self.adapter.close();
                    return Err(ConsumerError::WorkerLost {
                        reason: e.to_string(),
                    });
                }
            },
            None => self.shared.state.reached(ConsumerState::Detached).await,
        }
        Ok(self.stats())
    }

    /// Waits until the consumer reaches `Detached` without initiating detach.
    pub async fn wait_detached(&self) {
        self.shared.state.reached(ConsumerState::Detached).await;
    }

    /// Steps of detach that need no waiting: unregister, close ingress, signal stop.
    ///
    /// Returns `false` if detach had already begun.
    fn begin_detach(&self) -> bool {
        let token = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(token) = token else {
            return false;
        };

        self.registry.unregister(token);

        let shared = &self.shared;
        shared.ingress.close_with(|| {
            shared.state.advance(ConsumerState::Detaching);
        });
        shared.bus.publish(
            Diagnostic::new(DiagnosticKind::StateChanged).with_reason("active->detaching"),
        );

        if self.teardown == TeardownPolicy::Discard {
            self.stop.cancel();
        }

        info!(
            consumer = %shared.label(),
            %token,
            teardown = self.teardown.as_label(),
            "consumer detaching"
        );
        true
    }
}

impl DisplayEvents for Consumer {
    fn on_damage_rect(&self, rect: Rect) {
        self.shared.on_damage_rect(rect);
    }

    fn on_surface_changed(&self, surface: Option<SurfaceHandle>) {
        self.shared.on_surface_changed(surface);
    }

    fn on_rotation_changed(&self, degrees: f64) {
        self.shared.on_rotation_changed(degrees);
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.begin_detach();
    }
}

impl fmt::Display for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "display-console[{}] {} state={}",
            self.label(),
            self.id,
            self.state()
        )
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("id", &self.id)
            .field("label", &self.label())
            .field("state", &self.state())
            .field("teardown", &self.teardown)
            .field("sink", &self.adapter.sink_name())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RegistryError, SinkError};
    use crate::events::EventRecord;
    use crate::registry::{DisplayEvent, PortMultiplexer};
    use crate::sinks::SinkFn;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;
    use tokio::sync::{Notify, Semaphore};

    type Seen = Arc<Mutex<Vec<(u64, EventKind)>>>;

    fn collector() -> (Seen, Arc<dyn LogSink>) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink: Arc<dyn LogSink> = SinkFn::arc("collect", {
            let seen = Arc::clone(&seen);
            move |r: &EventRecord| -> Result<(), SinkError> {
                seen.lock().unwrap().push((r.seq, r.kind()));
                Ok(())
            }
        });
        (seen, sink)
    }

    fn seqs(seen: &Seen) -> Vec<u64> {
        seen.lock().unwrap().iter().map(|(s, _)| *s).collect()
    }

    /// Registry wrapper that counts unregister calls.
    struct CountingRegistry {
        inner: Arc<PortMultiplexer>,
        unregisters: AtomicUsize,
    }

    impl CountingRegistry {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: PortMultiplexer::new(),
                unregisters: AtomicUsize::new(0),
            })
        }
    }

    impl PortRegistry for CountingRegistry {
        fn register(
            &self,
            identity: &Identity,
            events: Arc<dyn DisplayEvents>,
        ) -> Result<RoutingToken, RegistryError> {
            self.inner.register(identity, events)
        }

        fn unregister(&self, token: RoutingToken) {
            self.unregisters.fetch_add(1, Ordering::SeqCst);
            self.inner.unregister(token);
        }
    }

    async fn eventually(mut cond: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn mixed_kinds_delivered_in_arrival_order() {
        let (seen, sink) = collector();
        let consumer = Consumer::builder()
            .with_sink(sink)
            .attach(PortMultiplexer::new())
            .unwrap();

        consumer.on_damage_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        consumer.on_rotation_changed(90.0);
        consumer.on_surface_changed(None);

        let stats = consumer.detach().await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (1, EventKind::DamageRect),
                (2, EventKind::RotationChanged),
                (3, EventKind::SurfaceChanged),
            ]
        );
        assert_eq!(stats.ingested, 3);
        assert_eq!(stats.delivered, 3);
        assert_eq!(consumer.state(), ConsumerState::Detached);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_producers_see_total_gap_free_order() {
        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 250;

        let (seen, sink) = collector();
        let consumer = Consumer::builder()
            .with_sink(sink)
            .attach(PortMultiplexer::new())
            .unwrap();

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let events = consumer.ingest_handle();
                std::thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        match (p + i) % 3 {
                            0 => events.on_damage_rect(Rect::new(i as f64, 0.0, 1.0, 1.0)),
                            1 => events.on_surface_changed(None),
                            _ => events.on_rotation_changed(i as f64),
                        }
                    }
                })
            })
            .collect();
        for p in producers {
            p.join().unwrap();
        }

        consumer.detach().await.unwrap();

        let got = seqs(&seen);
        let expected: Vec<u64> = (1..=(PRODUCERS * PER_PRODUCER) as u64).collect();
        assert_eq!(got, expected);
    }

    struct OverlapProbe {
        in_flight: AtomicBool,
        overlaps: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LogSink for OverlapProbe {
        async fn on_record(&self, _record: &EventRecord) -> Result<(), SinkError> {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            tokio::task::yield_now().await;
            tokio::time::sleep(Duration::from_micros(50)).await;
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.in_flight.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "overlap-probe"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sink_is_never_invoked_concurrently() {
        let probe = Arc::new(OverlapProbe {
            in_flight: AtomicBool::new(false),
            overlaps: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        });
        let consumer = Consumer::builder()
            .with_sink(probe.clone())
            .attach(PortMultiplexer::new())
            .unwrap();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let events = consumer.ingest_handle();
                tokio::spawn(async move {
                    for i in 0..50 {
                        events.on_rotation_changed(i as f64);
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for t in tasks {
            t.await.unwrap();
        }

        consumer.detach().await.unwrap();

        assert_eq!(probe.calls.load(Ordering::SeqCst), 200);
        assert_eq!(probe.overlaps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn silent_after_detach() {
        let (seen, sink) = collector();
        let registry = PortMultiplexer::new();
        let consumer = Consumer::builder()
            .with_sink(sink)
            .attach(registry.clone())
            .unwrap();
        let handle = consumer.ingest_handle();
        let id = consumer.id();

        consumer.on_damage_rect(Rect::default());
        consumer.detach().await.unwrap();
        let delivered = seqs(&seen);

        consumer.on_damage_rect(Rect::default());
        handle.on_surface_changed(None);
        handle.on_rotation_changed(f64::NAN);
        assert!(!registry.route(id, DisplayEvent::RotationChanged(1.0)));
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(seqs(&seen), delivered);
        let stats = consumer.stats();
        assert_eq!(stats.ingested, 1);
        assert_eq!(stats.dropped_after_detach, 3);
        assert_eq!(stats.rejected, 0);
    }

    #[tokio::test]
    async fn detach_twice_unregisters_once() {
        let registry = CountingRegistry::new();
        let consumer = Consumer::builder()
            .attach(registry.clone())
            .unwrap();
        assert!(registry.inner.contains(consumer.id()));

        consumer.detach().await.unwrap();
        let first = consumer.state();
        consumer.detach().await.unwrap();

        assert_eq!(first, ConsumerState::Detached);
        assert_eq!(consumer.state(), ConsumerState::Detached);
        assert_eq!(registry.unregisters.load(Ordering::SeqCst), 1);
        assert!(registry.inner.is_empty());

        drop(consumer);
        assert_eq!(registry.unregisters.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_detach_calls_all_return_detached() {
        let registry = CountingRegistry::new();
        let consumer = Arc::new(Consumer::builder().attach(registry.clone()).unwrap());
        for _ in 0..100 {
            consumer.on_surface_changed(None);
        }

        let calls: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&consumer);
                tokio::spawn(async move { c.detach().await.map(|_| c.state()) })
            })
            .collect();
        for call in calls {
            assert_eq!(call.await.unwrap().unwrap(), ConsumerState::Detached);
        }
        assert_eq!(registry.unregisters.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_sink_does_not_stop_the_queue() {
        let called: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = SinkFn::arc("flaky", {
            let called = Arc::clone(&called);
            move |r: &EventRecord| -> Result<(), SinkError> {
                called.lock().unwrap().push(r.seq);
                match r.seq {
                    2 => Err(SinkError::failed("cannot log record 2")),
                    4 => panic!("sink exploded on record 4"),
                    _ => Ok(()),
                }
            }
        });
        let consumer = Consumer::builder()
            .with_sink(sink)
            .attach(PortMultiplexer::new())
            .unwrap();
        let mut diags = consumer.diagnostics();

        for i in 0..6 {
            consumer.on_rotation_changed(i as f64 * 10.0);
        }
        let stats = consumer.detach().await.unwrap();

        assert_eq!(*called.lock().unwrap(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(stats.delivered, 6);
        assert_eq!(stats.failed, 2);

        let mut failures = Vec::new();
        while let Ok(d) = diags.try_recv() {
            if d.is_sink_failure() {
                failures.push((d.kind, d.record_seq));
            }
        }
        assert_eq!(
            failures,
            vec![
                (DiagnosticKind::SinkFailed, Some(2)),
                (DiagnosticKind::SinkPanicked, Some(4)),
            ]
        );
    }

    #[tokio::test]
    async fn drain_delivers_everything_queued_before_detach() {
        let seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));

        struct Slow(Arc<Mutex<Vec<u64>>>);

        #[async_trait]
        impl LogSink for Slow {
            async fn on_record(&self, record: &EventRecord) -> Result<(), SinkError> {
                tokio::time::sleep(Duration::from_millis(1)).await;
                self.0.lock().unwrap().push(record.seq);
                Ok(())
            }
        }

        let consumer = Consumer::builder()
            .with_sink(Arc::new(Slow(Arc::clone(&seen))))
            .attach(PortMultiplexer::new())
            .unwrap();

        for i in 0..10 {
            consumer.on_damage_rect(Rect::new(i as f64, 0.0, 1.0, 1.0));
        }
        consumer.detach().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), (1..=10).collect::<Vec<u64>>());
        assert_eq!(consumer.state(), ConsumerState::Detached);
        assert!(!consumer.has_sink());
    }

    struct Gate {
        entered: Notify,
        permits: Semaphore,
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl LogSink for Gate {
        async fn on_record(&self, record: &EventRecord) -> Result<(), SinkError> {
            self.entered.notify_one();
            if let Ok(p) = self.permits.acquire().await {
                p.forget();
            }
            self.seen.lock().unwrap().push(record.seq);
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn discard_abandons_buffered_records() {
        let gate = Arc::new(Gate {
            entered: Notify::new(),
            permits: Semaphore::new(0),
            seen: Mutex::new(Vec::new()),
        });
        let consumer = Arc::new(
            Consumer::builder()
                .with_teardown(TeardownPolicy::Discard)
                .with_sink(gate.clone())
                .attach(PortMultiplexer::new())
                .unwrap(),
        );
        let mut diags = consumer.diagnostics();

        for _ in 0..10 {
            consumer.on_surface_changed(None);
        }
        // record 1 is now blocked inside the sink
        gate.entered.notified().await;

        let detach = {
            let c = Arc::clone(&consumer);
            tokio::spawn(async move { c.detach().await })
        };
        eventually(|| consumer.state() >= ConsumerState::Detaching).await;
        gate.permits.add_permits(100);

        let stats = detach.await.unwrap().unwrap();

        assert_eq!(*gate.seen.lock().unwrap(), vec![1]);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.discarded, 9);
        assert_eq!(consumer.state(), ConsumerState::Detached);

        let mut discarded = None;
        while let Ok(d) = diags.try_recv() {
            if d.kind == DiagnosticKind::Discarded {
                discarded = d.reason;
            }
        }
        assert_eq!(discarded.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn drop_unregisters_and_drains_in_background() {
        let (seen, sink) = collector();
        let registry = CountingRegistry::new();
        let consumer = Consumer::builder()
            .with_sink(sink)
            .attach(registry.clone())
            .unwrap();

        consumer.on_damage_rect(Rect::default());
        consumer.on_rotation_changed(-90.0);
        consumer.on_surface_changed(None);
        drop(consumer);

        assert_eq!(registry.unregisters.load(Ordering::SeqCst), 1);
        assert!(registry.inner.is_empty());
        eventually(|| seqs(&seen) == vec![1, 2, 3]).await;
    }

    #[tokio::test]
    async fn rotation_is_normalized_and_non_finite_is_rejected() {
        let angles: Arc<Mutex<Vec<(u64, f64)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = SinkFn::arc("angles", {
            let angles = Arc::clone(&angles);
            move |r: &EventRecord| -> Result<(), SinkError> {
                if let Some(a) = r.angle() {
                    angles.lock().unwrap().push((r.seq, a));
                }
                Ok(())
            }
        });
        let consumer = Consumer::builder()
            .with_sink(sink)
            .attach(PortMultiplexer::new())
            .unwrap();
        let mut diags = consumer.diagnostics();

        consumer.on_rotation_changed(f64::NAN);
        consumer.on_rotation_changed(-90.0);
        consumer.on_rotation_changed(f64::INFINITY);
        consumer.on_rotation_changed(450.0);
        let stats = consumer.detach().await.unwrap();

        assert_eq!(*angles.lock().unwrap(), vec![(1, 270.0), (2, 90.0)]);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.ingested, 2);

        let rejected = std::iter::from_fn(|| diags.try_recv().ok())
            .filter(|d| d.kind == DiagnosticKind::AngleRejected)
            .count();
        assert_eq!(rejected, 2);
    }

    #[tokio::test]
    async fn replaced_sink_takes_over_from_next_record() {
        let (first, sink_a) = collector();
        let (second, sink_b) = collector();
        let consumer = Consumer::builder()
            .with_sink(sink_a)
            .attach(PortMultiplexer::new())
            .unwrap();

        consumer.on_damage_rect(Rect::default());
        consumer.on_damage_rect(Rect::default());
        eventually(|| seqs(&first).len() == 2).await;

        consumer.set_sink(sink_b);
        consumer.on_damage_rect(Rect::default());
        consumer.detach().await.unwrap();

        assert_eq!(seqs(&first), vec![1, 2]);
        assert_eq!(seqs(&second), vec![3]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sink_installed_during_detach_is_released() {
        for _ in 0..200 {
            let (_, sink) = collector();
            let consumer = Arc::new(
                Consumer::builder()
                    .with_sink(Arc::clone(&sink))
                    .attach(PortMultiplexer::new())
                    .unwrap(),
            );
            consumer.on_surface_changed(None);

            let installer = {
                let c = Arc::clone(&consumer);
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        c.set_sink(Arc::clone(&sink));
                    }
                })
            };
            consumer.detach().await.unwrap();
            installer.join().unwrap();

            assert_eq!(consumer.state(), ConsumerState::Detached);
            assert!(!consumer.has_sink());
            // only the local handle is left
            assert_eq!(Arc::strong_count(&sink), 1);
        }
    }

    #[tokio::test]
    async fn set_sink_after_detach_is_ignored() {
        let (seen, sink) = collector();
        let consumer = Consumer::builder().attach(PortMultiplexer::new()).unwrap();
        consumer.detach().await.unwrap();

        consumer.set_sink(sink);
        consumer.on_damage_rect(Rect::default());

        assert!(!consumer.has_sink());
        assert!(seqs(&seen).is_empty());
    }

    #[tokio::test]
    async fn without_sink_records_are_consumed() {
        let consumer = Consumer::builder().attach(PortMultiplexer::new()).unwrap();
        assert!(!consumer.has_sink());

        consumer.on_surface_changed(None);
        let stats = consumer.detach().await.unwrap();

        assert_eq!(stats.ingested, 1);
        assert_eq!(stats.delivered, 0);
    }

    #[tokio::test]
    async fn routed_events_reach_the_sink() {
        let (seen, sink) = collector();
        let registry = PortMultiplexer::new();
        let consumer = Consumer::builder()
            .with_label("simulator display 0")
            .with_sink(sink)
            .attach(registry.clone())
            .unwrap();

        assert!(registry.route(consumer.id(), DisplayEvent::RotationChanged(180.0)));
        assert_eq!(registry.broadcast(DisplayEvent::SurfaceChanged(None)), 1);
        consumer.detach().await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(1, EventKind::RotationChanged), (2, EventKind::SurfaceChanged)]
        );
    }

    #[tokio::test]
    async fn attach_fails_when_registry_refuses() {
        let registry = PortMultiplexer::new();
        registry.close();

        let err = Consumer::builder().attach(registry).unwrap_err();
        assert!(matches!(err, ConsumerError::Registry(RegistryError::Closed)));
    }

    #[tokio::test]
    async fn label_changes_do_not_affect_routing() {
        let registry = PortMultiplexer::new();
        let consumer = Consumer::builder().attach(registry.clone()).unwrap();
        let id = consumer.id();
        assert!(consumer.label().starts_with("display-console-"));

        consumer.set_label("renamed");
        assert_eq!(consumer.label(), "renamed");
        assert_eq!(consumer.identity().id(), id);
        assert!(registry.contains(id));
        assert_eq!(
            consumer.to_string(),
            format!("display-console[renamed] {id} state=Active")
        );

        consumer.detach().await.unwrap();
        assert!(consumer.to_string().ends_with("state=Detached"));
    }

    #[tokio::test]
    async fn wait_detached_follows_detach_from_elsewhere() {
        let consumer = Arc::new(Consumer::builder().attach(PortMultiplexer::new()).unwrap());
        let waiter = {
            let c = Arc::clone(&consumer);
            tokio::spawn(async move { c.wait_detached().await })
        };

        consumer.detach().await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }
}
