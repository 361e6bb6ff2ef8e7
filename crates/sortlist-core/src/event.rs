#![forbid(unsafe_code)]

//! Raw pointer events delivered by the host view system.
//!
//! The host reports every touch on a row with both page-absolute and
//! row-relative coordinates, the number of active touches, and the identity
//! of the view that received the original pointer-down. Nothing here is
//! interpreted; see [`crate::gesture`] for the state machine that consumes
//! these events.

use crate::geometry::Point;

/// Identity of the host view that received a touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TargetId(pub u64);

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    /// The host cancelled the touch (e.g. the system took it over).
    Cancel,
}

/// A single pointer sample addressed to one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    /// Position in page (absolute) coordinates.
    pub page: Point,
    /// Position relative to the row's own origin.
    pub local: Point,
    /// Number of touches currently on the screen.
    pub touches: u8,
    pub target: TargetId,
}

impl PointerEvent {
    /// Create a single-touch event.
    #[must_use]
    pub const fn new(kind: PointerEventKind, page: Point, local: Point) -> Self {
        Self {
            kind,
            page,
            local,
            touches: 1,
            target: TargetId(0),
        }
    }

    /// Set the touch count.
    #[must_use]
    pub const fn with_touches(mut self, touches: u8) -> Self {
        self.touches = touches;
        self
    }

    /// Set the originating target.
    #[must_use]
    pub const fn with_target(mut self, target: TargetId) -> Self {
        self.target = target;
        self
    }

    #[inline]
    #[must_use]
    pub const fn is_multi_touch(&self) -> bool {
        self.touches > 1
    }
}

/// Terse constructors for pointer events in tests.
///
/// Rows in tests sit at a fixed page origin, so each builder takes the page
/// position and the row-relative position explicitly.
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use super::{PointerEvent, PointerEventKind};
    use crate::geometry::Point;

    #[must_use]
    pub fn down(page: (f32, f32), local: (f32, f32)) -> PointerEvent {
        PointerEvent::new(PointerEventKind::Down, page.into(), local.into())
    }

    #[must_use]
    pub fn moved(page: (f32, f32), local: (f32, f32)) -> PointerEvent {
        PointerEvent::new(PointerEventKind::Move, page.into(), local.into())
    }

    #[must_use]
    pub fn up(page: (f32, f32), local: (f32, f32)) -> PointerEvent {
        PointerEvent::new(PointerEventKind::Up, page.into(), local.into())
    }

    #[must_use]
    pub fn cancel() -> PointerEvent {
        PointerEvent::new(PointerEventKind::Cancel, Point::ORIGIN, Point::ORIGIN)
    }
}
