#![forbid(unsafe_code)]

//! Edge autoscroll while a row is being dragged.
//!
//! When the pointer of an active drag enters the band of width
//! [`AutoscrollConfig::area`] at either end of the viewport, the
//! [`Autoscroller`] starts a periodic run. Each tick scrolls the content by
//! an accelerating step towards that edge; the list applies the same delta
//! to the dragged row so it stays under the pointer.
//!
//! # State Machine
//!
//! ```text
//!            pointer in band && can scroll
//!   Stopped ──────────────────────────────▶ Running { direction, ticks }
//!      ▲                                        │
//!      └────────────────────────────────────────┘
//!        pointer left both bands / bound reached / stop()
//! ```
//!
//! # Invariants
//!
//! 1. At most one run exists; a start request while running is ignored,
//!    whichever band the pointer is in.
//! 2. The offset never leaves `[0, max_offset]`: the last step before a
//!    bound is shortened to land exactly on it.
//! 3. A run never starts when there is nothing to scroll in its direction.
//!
//! # Failure Modes
//!
//! - Ticks are deadlines checked against the caller's `now`. A host that
//!   polls late gets every missed tick in one call, each with its own step,
//!   so the scrolled distance does not depend on polling frequency.

use web_time::Instant;

use sortlist_core::geometry::{Axis, Rect};

use crate::config::AutoscrollConfig;
use crate::reorder::Direction;

// ---------------------------------------------------------------------------
// Scroll bounds
// ---------------------------------------------------------------------------

/// Scroll offset along the primary axis and its upper bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollBounds {
    pub offset: f32,
    /// `content_extent - viewport_extent`, never negative.
    pub max_offset: f32,
}

impl ScrollBounds {
    #[must_use]
    pub fn new(offset: f32, content_extent: f32, viewport_extent: f32) -> Self {
        Self {
            offset,
            max_offset: (content_extent - viewport_extent).max(0.0),
        }
    }

    /// Whether the offset can still move in `direction`.
    #[must_use]
    pub fn can_scroll(&self, direction: Direction) -> bool {
        match direction {
            Direction::Backward => self.offset > 0.0,
            Direction::Forward => self.offset < self.max_offset,
        }
    }

    /// Clamp an offset into `[0, max_offset]`.
    #[must_use]
    pub fn clamp(&self, offset: f32) -> f32 {
        offset.clamp(0.0, self.max_offset)
    }

    /// Signed delta for a step of `step` in `direction`, shortened so the
    /// offset lands on the bound instead of passing it.
    #[must_use]
    pub fn step_delta(&self, direction: Direction, step: f32) -> f32 {
        self.clamp(self.offset + direction.sign() * step) - self.offset
    }
}

// ---------------------------------------------------------------------------
// Autoscroller
// ---------------------------------------------------------------------------

/// A running autoscroll.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AutoscrollRun {
    direction: Direction,
    next_tick: Instant,
    ticks: u32,
}

/// Result of feeding a pointer position to [`Autoscroller::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoscrollChange {
    Started(Direction),
    Stopped,
    Unchanged,
}

/// Periodic edge scroller; at most one run at a time.
#[derive(Debug, Clone)]
pub struct Autoscroller {
    config: AutoscrollConfig,
    run: Option<AutoscrollRun>,
}

impl Autoscroller {
    #[must_use]
    pub fn new(config: AutoscrollConfig) -> Self {
        Self { config, run: None }
    }

    /// Which edge band, if any, `pointer` (a page coordinate on `axis`) is in.
    ///
    /// The backward band wins when the viewport is too small for the two
    /// bands to be disjoint.
    #[must_use]
    pub fn band(&self, pointer: f32, viewport: Rect, axis: Axis) -> Option<Direction> {
        if pointer < viewport.start(axis) + self.config.area {
            Some(Direction::Backward)
        } else if pointer > viewport.end(axis) - self.config.area {
            Some(Direction::Forward)
        } else {
            None
        }
    }

    /// Start or stop according to the band the pointer is in.
    ///
    /// Leaving both bands stops a run. Entering a band starts a run only if
    /// none is running and `bounds` allows scrolling that way; the first tick
    /// fires one interval after `now`.
    pub fn update(
        &mut self,
        band: Option<Direction>,
        bounds: ScrollBounds,
        now: Instant,
    ) -> AutoscrollChange {
        let Some(direction) = band else {
            return if self.run.take().is_some() {
                AutoscrollChange::Stopped
            } else {
                AutoscrollChange::Unchanged
            };
        };
        if self.run.is_some() || !bounds.can_scroll(direction) {
            return AutoscrollChange::Unchanged;
        }
        self.run = Some(AutoscrollRun {
            direction,
            next_tick: now + self.config.interval(),
            ticks: 0,
        });
        AutoscrollChange::Started(direction)
    }

    /// Run every tick due at `now`, returning the total signed offset delta.
    ///
    /// A tick that finds nothing left to scroll stops the run, as does a
    /// step that lands on the bound. Returns `None` when nothing scrolled.
    pub fn tick(&mut self, now: Instant, bounds: ScrollBounds) -> Option<f32> {
        let interval = self.config.interval();
        let mut bounds = bounds;
        let mut total = 0.0f32;

        while let Some(run) = self.run.as_mut() {
            if run.next_tick > now {
                break;
            }
            if !bounds.can_scroll(run.direction) {
                self.run = None;
                break;
            }
            let step = self.config.step_for(run.ticks);
            let delta = bounds.step_delta(run.direction, step);
            run.ticks = run.ticks.saturating_add(1);
            run.next_tick += interval;
            bounds.offset += delta;
            total += delta;
            if !bounds.can_scroll(run.direction) {
                self.run = None;
            }
        }

        (total != 0.0).then_some(total)
    }

    /// Stop any run. Returns whether one was running.
    pub fn stop(&mut self) -> bool {
        self.run.take().is_some()
    }

    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Direction of the current run.
    #[inline]
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        self.run.map(|run| run.direction)
    }

    /// Ticks completed by the current run.
    #[inline]
    #[must_use]
    pub fn ticks(&self) -> u32 {
        self.run.map_or(0, |run| run.ticks)
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &AutoscrollConfig {
        &self.config
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
