#![forbid(unsafe_code)]

//! Per-row drag gesture: long-press to activate, then follow the pointer.
//!
//! [`RowGesture`] turns the raw [`PointerEvent`]s a row receives into
//! [`RowIntent`]s for the list orchestrator. It owns the row's rendered
//! location, the location the list wants the row at, and at most one
//! [`RowSession`] describing the touch in progress.
//!
//! # State Machine
//!
//! ```text
//!            down                 deadline / activate()
//!   Idle ─────────────▶ Pending ─────────────────────────▶ Active
//!    ▲                   │  up ⇒ Press                       │
//!    │                   │  left bounds / 2nd touch ⇒ (none) │ up / terminate()
//!    └───────────────────┴───────────────────────────────────┘ ⇒ Release
//! ```
//!
//! # Invariants
//!
//! 1. `Activate` and `Press` never both emit for the same touch.
//! 2. Every `Activate` is followed by exactly one `Release`; no `Move` is
//!    emitted outside `Active`.
//! 3. Moves only change the location along the configured axis.
//! 4. A disabled row never leaves `Idle`.
//! 5. After `Release`, the row rests at its target location.
//!
//! # Failure Modes
//!
//! - Time is never read from a clock: every entry point takes `now`. A host
//!   that stops calling [`RowGesture::poll`] still activates on the next
//!   pointer event past the deadline, before that event is handled.
//! - An `Up` with no session (out-of-order delivery) is ignored.

use std::time::Duration;

use web_time::Instant;

use crate::event::{PointerEvent, PointerEventKind, TargetId};
use crate::geometry::{Axis, Point, Rect, Size};

#[cfg(feature = "tracing")]
use crate::logging::{debug, trace};
#[cfg(not(feature = "tracing"))]
use crate::{debug, trace};

/// Default press duration before a row becomes draggable.
pub const DEFAULT_ACTIVATION_DELAY: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-row gesture settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGestureConfig {
    /// Press duration before activation (default: 200ms).
    pub activation_delay: Duration,
    /// Axis moves are projected onto (default: vertical).
    pub axis: Axis,
    /// Skip the activation timer; only [`RowGesture::activate`] activates.
    pub manual_activation: bool,
}

impl Default for RowGestureConfig {
    fn default() -> Self {
        Self {
            activation_delay: DEFAULT_ACTIVATION_DELAY,
            axis: Axis::Vertical,
            manual_activation: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// What a row asks of the list after handling an input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowIntent {
    /// Short press released before activation.
    Press { page: Point },
    /// The row became draggable.
    Activate { location: Point, page: Point },
    /// The active row moved by `delta` along the primary axis.
    Move {
        delta: f32,
        location: Point,
        page: Point,
    },
    /// The drag ended, by release or forced termination.
    ///
    /// `location` is where the row was dragged to; `settle_to` is set when
    /// the row jumped back to its target location because the two differed.
    Release {
        location: Point,
        page: Point,
        settle_to: Option<Point>,
    },
}

/// Coarse gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowGestureState {
    #[default]
    Idle,
    Pending,
    Active,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One touch on the row, from pointer-down to release or cancellation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSession {
    /// Page position of the pointer-down.
    pub origin: Point,
    /// Page position of the last accepted event.
    pub last_page: Point,
    /// Host view that received the pointer-down.
    pub target: TargetId,
    pub pressed_at: Instant,
    /// Activation deadline; `None` in manual activation mode.
    pub deadline: Option<Instant>,
}

// ---------------------------------------------------------------------------
// RowGesture
// ---------------------------------------------------------------------------

/// Gesture state machine for a single row.
#[derive(Debug, Clone)]
pub struct RowGesture {
    config: RowGestureConfig,
    state: RowGestureState,
    session: Option<RowSession>,
    location: Point,
    target: Point,
    size: Option<Size>,
    disabled: bool,
}

impl RowGesture {
    /// Create an idle row resting at `location`.
    #[must_use]
    pub fn new(config: RowGestureConfig, location: Point) -> Self {
        Self {
            config,
            state: RowGestureState::Idle,
            session: None,
            location,
            target: location,
            size: None,
            disabled: false,
        }
    }

    /// Process a pointer event, returning any intents produced.
    ///
    /// An elapsed activation deadline is honored first, so a release that
    /// arrives after the deadline yields `Activate` followed by `Release`.
    pub fn process(&mut self, event: &PointerEvent, now: Instant) -> Vec<RowIntent> {
        let mut out = Vec::with_capacity(2);

        if let Some(intent) = self.poll(now) {
            out.push(intent);
        }

        match event.kind {
            PointerEventKind::Down => self.on_down(event, now),
            PointerEventKind::Move => self.on_move(event, &mut out),
            PointerEventKind::Up => self.on_up(event, &mut out),
            PointerEventKind::Cancel => {
                if let Some(intent) = self.terminate() {
                    out.push(intent);
                }
            }
        }

        out
    }

    /// Fire the activation timer if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<RowIntent> {
        if self.state != RowGestureState::Pending {
            return None;
        }
        let deadline = self.session.as_ref()?.deadline?;
        if now < deadline {
            return None;
        }
        self.enter_active()
    }

    /// Activate a pending row immediately (manual activation).
    ///
    /// No-op unless a pointer is down on the row.
    pub fn activate(&mut self) -> Option<RowIntent> {
        if self.state != RowGestureState::Pending {
            return None;
        }
        self.enter_active()
    }

    /// Forced termination: the gesture was taken away from the row.
    ///
    /// A pending touch is dropped silently; an active drag is released.
    pub fn terminate(&mut self) -> Option<RowIntent> {
        match self.state {
            RowGestureState::Idle => None,
            RowGestureState::Pending => {
                trace!("pending row gesture cancelled");
                self.cancel();
                None
            }
            RowGestureState::Active => {
                let page = self
                    .session
                    .as_ref()
                    .map_or(self.location, |s| s.last_page);
                debug!("active row gesture terminated");
                Some(self.release(page))
            }
        }
    }

    /// Responder negotiation: may an ancestor take over the gesture?
    ///
    /// Active rows refuse. Any other row yields, dropping a pending touch.
    pub fn should_yield(&mut self) -> bool {
        match self.state {
            RowGestureState::Active => false,
            RowGestureState::Pending => {
                self.cancel();
                true
            }
            RowGestureState::Idle => true,
        }
    }

    /// Move an active row without pointer input (autoscroll follow).
    ///
    /// Returns the new location, or `None` if the row is not active.
    pub fn shift(&mut self, delta: f32) -> Option<Point> {
        if self.state != RowGestureState::Active {
            return None;
        }
        self.location = self.config.axis.offset(self.location, delta);
        Some(self.location)
    }

    /// Set where the list wants this row.
    ///
    /// Idle and pending rows move there at once; an active row keeps
    /// following the pointer and settles on release.
    pub fn set_target(&mut self, target: Point) {
        self.target = target;
        if self.state != RowGestureState::Active {
            self.location = target;
        }
    }

    /// Record the row's measured size, used for the pending bounds check.
    pub fn set_size(&mut self, size: Size) {
        self.size = Some(size);
    }

    /// Enable or disable the row. Disabling drops a pending touch.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled && self.state == RowGestureState::Pending {
            self.cancel();
        }
    }

    /// Reset to idle at the target location without emitting anything.
    pub fn reset(&mut self) {
        self.cancel();
        self.location = self.target;
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> RowGestureState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == RowGestureState::Active
    }

    #[inline]
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Where the row is rendered right now.
    #[inline]
    #[must_use]
    pub fn location(&self) -> Point {
        self.location
    }

    /// Where the list wants the row.
    #[inline]
    #[must_use]
    pub fn target(&self) -> Point {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<&RowSession> {
        self.session.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &RowGestureConfig {
        &self.config
    }
}

// ---------------------------------------------------------------------------
// Internal event handlers
// ---------------------------------------------------------------------------

impl RowGesture {
    fn on_down(&mut self, event: &PointerEvent, now: Instant) {
        match self.state {
            RowGestureState::Idle => {
                if self.disabled || event.is_multi_touch() {
                    return;
                }
                let deadline = (!self.config.manual_activation)
                    .then(|| now + self.config.activation_delay);
                self.session = Some(RowSession {
                    origin: event.page,
                    last_page: event.page,
                    target: event.target,
                    pressed_at: now,
                    deadline,
                });
                self.state = RowGestureState::Pending;
            }
            RowGestureState::Pending => {
                // A second finger landed before activation.
                if event.is_multi_touch() {
                    self.cancel();
                }
            }
            RowGestureState::Active => {}
        }
    }

    fn on_move(&mut self, event: &PointerEvent, out: &mut Vec<RowIntent>) {
        match self.state {
            RowGestureState::Idle => {}
            RowGestureState::Pending => {
                if event.is_multi_touch() || !self.within_bounds(event.local) {
                    trace!("pending row gesture left the row");
                    self.cancel();
                } else if let Some(session) = self.session.as_mut() {
                    session.last_page = event.page;
                }
            }
            RowGestureState::Active => {
                let axis = self.config.axis;
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                // Only the delta since the previous event counts.
                let delta = axis.main(event.page) - axis.main(session.last_page);
                session.last_page = event.page;
                if delta == 0.0 {
                    return;
                }
                self.location = axis.offset(self.location, delta);
                out.push(RowIntent::Move {
                    delta,
                    location: self.location,
                    page: event.page,
                });
            }
        }
    }

    fn on_up(&mut self, event: &PointerEvent, out: &mut Vec<RowIntent>) {
        match self.state {
            RowGestureState::Idle => {}
            RowGestureState::Pending => {
                self.cancel();
                out.push(RowIntent::Press { page: event.page });
            }
            RowGestureState::Active => {
                out.push(self.release(event.page));
            }
        }
    }

    fn within_bounds(&self, local: Point) -> bool {
        self.size
            .is_none_or(|size| Rect::from_size(size).contains(local))
    }

    fn enter_active(&mut self) -> Option<RowIntent> {
        let session = self.session.as_mut()?;
        let page = session.last_page;
        self.state = RowGestureState::Active;
        debug!(x = self.location.x, y = self.location.y, "row gesture activated");
        Some(RowIntent::Activate {
            location: self.location,
            page,
        })
    }

    fn release(&mut self, page: Point) -> RowIntent {
        let location = self.location;
        let settle_to = (self.target != location).then_some(self.target);
        self.location = self.target;
        self.session = None;
        self.state = RowGestureState::Idle;
        RowIntent::Release {
            location,
            page,
            settle_to,
        }
    }

    fn cancel(&mut self) {
        self.session = None;
        self.state = RowGestureState::Idle;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
