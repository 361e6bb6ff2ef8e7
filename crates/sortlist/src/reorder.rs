#![forbid(unsafe_code)]

//! Reorder policy: when does the dragged row displace a neighbor?
//!
//! [`Reorderer`] is evaluated on every accepted move of the active row. It
//! scans the neighbors in the direction of travel and compares the dragged
//! row's leading edge against each neighbor's [`SwapZone`]:
//!
//! - moving forward, the dragged row's end edge must reach the neighbor's
//!   `from_before` range, its last third;
//! - moving backward, the dragged row's start edge must reach the neighbor's
//!   `from_after` range, its first third.
//!
//! Neither range covers the neighbor's middle third, so a row parked near a
//! boundary cannot oscillate: undoing a swap means travelling back across
//! that third first.
//!
//! The farthest crossed neighbor wins, so a fast move lands the row under
//! the pointer in one step. Neighbors with zero extent (not yet measured) are
//! skipped. An adjacent neighbor is swapped; a distant one is reached by
//! removing the active key and reinserting it (shift).
//!
//! After a reorder the displaced key is remembered and never displaced again
//! until the direction of travel changes.
//!
//! While autoscroll moves the row, reordering is suspended and the row's slot
//! falls behind. [`Reorderer::resync`] makes the next evaluation check both
//! directions, travel direction first, so the slot catches up whichever way
//! the pointer moves next.
//!
//! [`SwapZone`]: sortlist_core::registry::SwapZone

use std::hash::Hash;

use sortlist_core::registry::{Positions, Slot};

/// Direction of travel along the primary axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards lower offsets (up / left).
    Backward,
    /// Towards higher offsets (down / right).
    Forward,
}

impl Direction {
    /// Direction of a displacement; `None` for zero.
    #[must_use]
    pub fn of(delta: f32) -> Option<Self> {
        if delta > 0.0 {
            Some(Self::Forward)
        } else if delta < 0.0 {
            Some(Self::Backward)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Backward => Self::Forward,
            Self::Forward => Self::Backward,
        }
    }

    /// `+1.0` forward, `-1.0` backward.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Backward => -1.0,
            Self::Forward => 1.0,
        }
    }
}

/// How the order was changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderKind {
    /// Two adjacent keys exchanged places.
    Swap,
    /// The active key was removed and reinserted further away.
    Shift,
}

/// A reorder decided by [`Reorderer::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reorder<K> {
    /// The full order after the change.
    pub order: Vec<K>,
    /// Index of the active key before the change.
    pub from: usize,
    /// Index of the active key after the change.
    pub to: usize,
    /// The neighbor whose zone was crossed.
    pub displaced: K,
    pub kind: ReorderKind,
}

/// Per-drag reorder state: travel direction and the anti-flicker guard.
#[derive(Debug, Clone)]
pub struct Reorderer<K> {
    direction: Option<Direction>,
    last_displaced: Option<K>,
    resync: bool,
}

impl<K> Default for Reorderer<K> {
    fn default() -> Self {
        Self {
            direction: None,
            last_displaced: None,
            resync: false,
        }
    }
}

impl<K: Clone + Eq + Hash> Reorderer<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest displacement of the active row.
    ///
    /// Returns `true` if the direction of travel changed, which also clears
    /// the anti-flicker guard. Zero displacements keep the last direction.
    pub fn observe(&mut self, delta: f32) -> bool {
        let Some(direction) = Direction::of(delta) else {
            return false;
        };
        let changed = self.direction != Some(direction);
        if changed {
            self.last_displaced = None;
        }
        self.direction = Some(direction);
        changed
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// The key that may not be displaced again before a direction change.
    #[inline]
    #[must_use]
    pub fn last_displaced(&self) -> Option<&K> {
        self.last_displaced.as_ref()
    }

    /// The row was moved without being evaluated (autoscroll). The next
    /// evaluation checks both directions and ignores the guard.
    pub fn resync(&mut self) {
        self.resync = true;
        self.last_displaced = None;
    }

    #[inline]
    #[must_use]
    pub fn needs_resync(&self) -> bool {
        self.resync
    }

    /// Decide whether the active row displaces a neighbor.
    ///
    /// `dragged_start` is the active row's current start edge along the
    /// primary axis; `positions` must have been computed for `order`. A stale
    /// `active_index` is re-resolved from `order`.
    pub fn evaluate(
        &mut self,
        active_key: &K,
        active_index: usize,
        dragged_start: f32,
        order: &[K],
        positions: &Positions<K>,
    ) -> Option<Reorder<K>> {
        let direction = self.direction?;
        if order.len() < 2 || positions.len() != order.len() {
            return None;
        }

        let from = if order.get(active_index) == Some(active_key) {
            active_index
        } else {
            order.iter().position(|k| k == active_key)?
        };
        let extent = positions.get(active_key)?.extent;

        let resync = std::mem::take(&mut self.resync);
        let crossed = if resync {
            farthest_crossed(positions, from, dragged_start, extent, direction).or_else(|| {
                farthest_crossed(positions, from, dragged_start, extent, direction.reverse())
            })
        } else {
            farthest_crossed(positions, from, dragged_start, extent, direction)
        };
        let (to, neighbor) = crossed?;
        if self.last_displaced.as_ref() == Some(&neighbor.key) {
            return None;
        }

        let displaced = neighbor.key.clone();
        let (order, kind) = if to.abs_diff(from) == 1 {
            (swap_elements(order, from, to), ReorderKind::Swap)
        } else {
            (move_element(order, from, to), ReorderKind::Shift)
        };

        // Catch-up jumps leave the guard disarmed.
        self.last_displaced = (!resync).then(|| displaced.clone());
        Some(Reorder {
            order,
            from,
            to,
            displaced,
            kind,
        })
    }
}

/// Farthest measured neighbor of `from` in `direction` whose zone the dragged
/// row has reached.
///
/// Zones are ordered along the axis, so the crossed neighbors form a prefix
/// of the scan and the scan stops at the first one not reached.
fn farthest_crossed<K: Clone + Eq + Hash>(
    positions: &Positions<K>,
    from: usize,
    dragged_start: f32,
    extent: f32,
    direction: Direction,
) -> Option<(usize, &Slot<K>)> {
    let slots = positions.slots();
    match direction {
        Direction::Forward => {
            let dragged_end = dragged_start + extent;
            slots
                .iter()
                .enumerate()
                .skip(from + 1)
                .filter(|(_, slot)| slot.extent > 0.0)
                .take_while(|(_, slot)| dragged_end >= slot.swap_zone().from_before.start)
                .last()
        }
        Direction::Backward => slots
            .iter()
            .enumerate()
            .take(from)
            .rev()
            .filter(|(_, slot)| slot.extent > 0.0)
            .take_while(|(_, slot)| dragged_start <= slot.swap_zone().from_after.end)
            .last(),
    }
}

/// Exchange two elements, returning a new order.
#[must_use]
pub fn swap_elements<K: Clone>(order: &[K], a: usize, b: usize) -> Vec<K> {
    let mut next = order.to_vec();
    if a < next.len() && b < next.len() {
        next.swap(a, b);
    }
    next
}

/// Remove the element at `from` and reinsert it at `to`, returning a new
/// order. `to` is clamped to the valid range.
#[must_use]
pub fn move_element<K: Clone>(order: &[K], from: usize, to: usize) -> Vec<K> {
    let mut next = order.to_vec();
    if from >= next.len() {
        return next;
    }
    let item = next.remove(from);
    let to = to.min(next.len());
    next.insert(to, item);
    next
}
