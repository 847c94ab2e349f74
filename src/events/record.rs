//! # Event records produced by the ingestion surface.
//!
//! An [`EventRecord`] wraps one display notification together with its sequencing
//! metadata. The [`EventKind`] enum classifies the three notification types:
//! - **DamageRect**: a region of the display changed and needs redraw
//! - **SurfaceChanged**: the render surface backing the display was swapped
//! - **RotationChanged**: the display rotation angle changed
//!
//! ## Ordering guarantees
//! `seq` is assigned per consumer at ingestion and strictly increases across all
//! kinds. `ingested_at` is for diagnostics only; ordering never looks at it.
//!
//! ## Example
//! ```rust
//! use display_console::{normalize_angle, Rect};
//!
//! assert_eq!(normalize_angle(-90.0), Some(270.0));
//! assert_eq!(normalize_angle(720.0), Some(0.0));
//! assert_eq!(normalize_angle(f64::NAN), None);
//!
//! let r = Rect::new(0.0, 0.0, 320.0, 240.0);
//! assert_eq!(r.area(), 76_800.0);
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Classification of display notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A damaged display region.
    ///
    /// Payload: [`Payload::DamageRect`].
    DamageRect,

    /// The render surface handle changed (or went away).
    ///
    /// Payload: [`Payload::SurfaceChanged`].
    SurfaceChanged,

    /// The display rotation changed.
    ///
    /// Payload: [`Payload::RotationChanged`], degrees in `[0, 360)`.
    RotationChanged,
}

impl EventKind {
    /// Short label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::DamageRect => "damage",
            EventKind::SurfaceChanged => "surface",
            EventKind::RotationChanged => "rotation",
        }
    }
}

/// Axis-aligned rectangle in display points.
///
/// Passed through as reported by the display server; not validated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}x{})", self.x, self.y, self.width, self.height)
    }
}

/// Opaque reference to the pixel buffer currently backing a display.
///
/// The console never looks inside; it only carries the handle to the sink.
/// Cloning is cheap (shared `Arc`).
#[derive(Clone)]
pub struct SurfaceHandle {
    inner: Arc<dyn Any + Send + Sync>,
}

impl SurfaceHandle {
    /// Wraps an arbitrary surface object.
    pub fn new<T: Any + Send + Sync>(surface: T) -> Self {
        Self {
            inner: Arc::new(surface),
        }
    }

    /// Wraps an already shared surface object.
    pub fn from_arc(inner: Arc<dyn Any + Send + Sync>) -> Self {
        Self { inner }
    }

    /// Borrows the surface as `T` if that is what it holds.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_ref().downcast_ref::<T>()
    }

    /// True if both handles point at the same surface object.
    pub fn same_as(&self, other: &SurfaceHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.inner) as *const ()
    }
}

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceHandle({:p})", self.addr())
    }
}

/// Kind-specific payload of a record.
#[derive(Debug, Clone)]
pub enum Payload {
    DamageRect(Rect),
    /// `None` when the display lost its backing surface.
    SurfaceChanged(Option<SurfaceHandle>),
    /// Degrees, normalized to `[0, 360)`.
    RotationChanged(f64),
}

impl Payload {
    pub fn kind(&self) -> EventKind {
        match self {
            Payload::DamageRect(_) => EventKind::DamageRect,
            Payload::SurfaceChanged(_) => EventKind::SurfaceChanged,
            Payload::RotationChanged(_) => EventKind::RotationChanged,
        }
    }
}

/// One display notification, as handed to the logging sink.
///
/// - `seq`: per-consumer sequence, strictly increasing across all kinds
/// - `ingested_at`: monotonic arrival time (diagnostics only)
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// Sequence number assigned at ingestion (starts at 1).
    pub seq: u64,
    /// Monotonic timestamp taken when the producer call arrived.
    pub ingested_at: Instant,
    /// Notification payload.
    pub payload: Payload,
}

impl EventRecord {
    pub(crate) fn new(seq: u64, payload: Payload) -> Self {
        Self {
            seq,
            ingested_at: Instant::now(),
            payload,
        }
    }

    /// Notification kind.
    #[inline]
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// The damaged region, for `DamageRect` records.
    pub fn damage_rect(&self) -> Option<&Rect> {
        match &self.payload {
            Payload::DamageRect(r) => Some(r),
            _ => None,
        }
    }

    /// The new surface, for `SurfaceChanged` records (`Some(None)` = surface removed).
    pub fn surface(&self) -> Option<Option<&SurfaceHandle>> {
        match &self.payload {
            Payload::SurfaceChanged(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// The normalized angle, for `RotationChanged` records.
    pub fn angle(&self) -> Option<f64> {
        match self.payload {
            Payload::RotationChanged(a) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Payload::DamageRect(r) => write!(f, "[damage] seq={} rect={}", self.seq, r),
            Payload::SurfaceChanged(Some(s)) => {
                write!(f, "[surface] seq={} handle={:?}", self.seq, s)
            }
            Payload::SurfaceChanged(None) => write!(f, "[surface] seq={} handle=none", self.seq),
            Payload::RotationChanged(a) => write!(f, "[rotation] seq={} angle={}", self.seq, a),
        }
    }
}

/// Normalizes an angle in degrees into `[0, 360)`.
///
/// Returns `None` for NaN and infinities, which have no position on the circle.
pub fn normalize_angle(degrees: f64) -> Option<f64> {
    if !degrees.is_finite() {
        return None;
    }
    let a = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if a >= 360.0 { Some(0.0) } else { Some(a) }
}
