//! # Example: console
//!
//! Two display consumers behind one [`PortMultiplexer`], fed by concurrent
//! producers.
//!
//! Shows how to:
//! - Attach consumers with a built-in [`LogWriter`] and a closure sink.
//! - Route notifications by identity and broadcast to every consumer.
//! - Watch the diagnostic side channel (a sink that fails on purpose).
//! - Detach with drain and discard teardown.
//!
//! ## Flow
//! ```text
//! producer threads ──► PortMultiplexer::route(id, ..) ──► Consumer::on_*()
//!                                                          ├─► seq++ + enqueue
//!                                                          └─► worker ──► sink
//! sink Err ──► DiagnosticBus ──► diagnostics task (prints)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=display_console=debug cargo run --example console
//! ```

use std::sync::Arc;
use std::time::Duration;

use display_console::{
    Consumer, DiagnosticKind, DisplayEvent, DisplayEvents, EventRecord, LogWriter,
    PortMultiplexer, Rect, SinkError, SurfaceHandle, TeardownPolicy,
};
use tracing_subscriber::EnvFilter;

/// Stand-in for a real render surface.
#[derive(Debug)]
struct Framebuffer {
    width: u32,
    height: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let registry = PortMultiplexer::new();

    let primary = Consumer::builder()
        .with_label("primary")
        .with_sink(Arc::new(LogWriter::new()))
        .attach(registry.clone())?;

    let secondary = Consumer::builder()
        .with_label("secondary")
        .with_teardown(TeardownPolicy::Discard)
        .with_sink_fn("picky", |r: &EventRecord| -> Result<(), SinkError> {
            let surface = r.surface().flatten();
            if let Some(fb) = surface.and_then(|h| h.downcast_ref::<Framebuffer>()) {
                println!("[secondary] seq={} framebuffer {}x{}", r.seq, fb.width, fb.height);
                return Ok(());
            }
            match r.angle() {
                Some(a) if a >= 180.0 => Err(SinkError::failed(format!("upside down: {a}"))),
                _ => {
                    println!("[secondary] {r}");
                    Ok(())
                }
            }
        })
        .attach(registry.clone())?;

    let mut diags = secondary.diagnostics();
    let watcher = tokio::spawn(async move {
        while let Ok(d) = diags.recv().await {
            match d.kind {
                DiagnosticKind::SinkFailed | DiagnosticKind::SinkPanicked => println!(
                    "[diag] {:?} sink={} seq={} reason={}",
                    d.kind,
                    d.sink.unwrap_or("<unknown>"),
                    d.record_seq.unwrap_or(0),
                    d.reason.as_deref().unwrap_or("<none>")
                ),
                _ => println!(
                    "[diag] {:?} {}",
                    d.kind,
                    d.reason.as_deref().unwrap_or("")
                ),
            }
        }
    });

    println!("{primary}");
    println!("{secondary}");

    // display server: damage, routed to the primary display only
    let damage = {
        let registry = Arc::clone(&registry);
        let id = primary.id();
        std::thread::spawn(move || {
            for i in 0..5 {
                let rect = Rect::new(f64::from(i) * 16.0, 0.0, 16.0, 16.0);
                registry.route(id, DisplayEvent::DamageRect(rect));
            }
        })
    };

    // orientation controller: rotations, broadcast to every display
    let rotation = {
        let registry = Arc::clone(&registry);
        std::thread::spawn(move || {
            for angle in [0.0, 90.0, 180.0, -90.0, 720.0] {
                registry.broadcast(DisplayEvent::RotationChanged(angle));
            }
        })
    };

    // windowing layer: one framebuffer shared by every display
    registry.broadcast(DisplayEvent::SurfaceChanged(Some(SurfaceHandle::new(
        Framebuffer {
            width: 320,
            height: 240,
        },
    ))));

    damage.join().map_err(|_| "damage producer panicked")?;
    rotation.join().map_err(|_| "rotation producer panicked")?;

    let primary_stats = primary.detach().await?;
    let secondary_stats = secondary.detach().await?;
    println!("primary:   {primary_stats:?}");
    println!("secondary: {secondary_stats:?}");

    // late events are ignored
    primary.on_rotation_changed(45.0);
    println!("after detach: {:?}", primary.stats());

    drop(secondary);
    let _ = tokio::time::timeout(Duration::from_millis(100), watcher).await;
    Ok(())
}
