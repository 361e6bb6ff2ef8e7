#![forbid(unsafe_code)]

//! Count-down latch over a fixed set of completion slots.
//!
//! [`MeasureLatch`] gates the first position computation of a list until
//! every row (and any declared header/footer) has reported a measurement.
//! It is an all-of combinator over per-slot flags: each slot completes at
//! most once, and the latch opens exactly once per arming.
//!
//! # Invariants
//!
//! 1. `remaining() == 0` iff every armed slot has completed.
//! 2. Completing an unknown or already-completed slot never changes the count.
//! 3. [`MeasureLatch::complete`] returns [`LatchStatus::Opened`] exactly once
//!    per arming; later completions report [`LatchStatus::AlreadyOpen`].
//! 4. Re-arming discards every previous flag.

use std::hash::Hash;

use ahash::AHashMap;

/// Outcome of completing one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchStatus {
    /// The slot is not part of the current arming.
    Unknown,
    /// The slot completed (or had completed); other slots are still pending.
    Waiting { remaining: usize },
    /// This completion opened the latch.
    Opened,
    /// The latch was already open.
    AlreadyOpen,
}

/// Count-down latch keyed by slot identity.
#[derive(Debug, Clone)]
pub struct MeasureLatch<S: Eq + Hash> {
    slots: AHashMap<S, bool>,
    remaining: usize,
    opened: bool,
}

impl<S: Eq + Hash> Default for MeasureLatch<S> {
    fn default() -> Self {
        Self::armed(std::iter::empty())
    }
}

impl<S: Eq + Hash> MeasureLatch<S> {
    /// Create a latch waiting on `slots`. Duplicates count once.
    ///
    /// A latch armed with no slots is open immediately.
    #[must_use]
    pub fn armed(slots: impl IntoIterator<Item = S>) -> Self {
        let mut latch = Self {
            slots: AHashMap::new(),
            remaining: 0,
            opened: false,
        };
        latch.rearm(slots);
        latch
    }

    /// Discard all flags and wait on a new slot set.
    pub fn rearm(&mut self, slots: impl IntoIterator<Item = S>) {
        self.slots.clear();
        for slot in slots {
            self.slots.insert(slot, false);
        }
        self.remaining = self.slots.len();
        self.opened = self.remaining == 0;
    }

    /// Mark `slot` as complete.
    pub fn complete(&mut self, slot: &S) -> LatchStatus {
        let Some(done) = self.slots.get_mut(slot) else {
            return LatchStatus::Unknown;
        };
        if self.opened {
            *done = true;
            return LatchStatus::AlreadyOpen;
        }
        if !*done {
            *done = true;
            self.remaining -= 1;
        }
        if self.remaining == 0 {
            self.opened = true;
            LatchStatus::Opened
        } else {
            LatchStatus::Waiting {
                remaining: self.remaining,
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.opened
    }

    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Whether `slot` belongs to the current arming.
    #[must_use]
    pub fn contains(&self, slot: &S) -> bool {
        self.slots.contains_key(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_every_slot_completes() {
        let mut latch = MeasureLatch::armed(["a", "b", "c"]);
        assert!(!latch.is_open());
        assert_eq!(latch.complete(&"a"), LatchStatus::Waiting { remaining: 2 });
        assert_eq!(latch.complete(&"c"), LatchStatus::Waiting { remaining: 1 });
        assert_eq!(latch.complete(&"b"), LatchStatus::Opened);
        assert!(latch.is_open());
    }

    #[test]
    fn duplicate_completion_counts_once() {
        let mut latch = MeasureLatch::armed([1, 2]);
        latch.complete(&1);
        assert_eq!(latch.complete(&1), LatchStatus::Waiting { remaining: 1 });
        assert_eq!(latch.remaining(), 1);
    }

    #[test]
    fn opened_reported_once() {
        let mut latch = MeasureLatch::armed([1]);
        assert_eq!(latch.complete(&1), LatchStatus::Opened);
        assert_eq!(latch.complete(&1), LatchStatus::AlreadyOpen);
    }

    #[test]
    fn unknown_slot_is_ignored() {
        let mut latch = MeasureLatch::armed([1, 2]);
        assert_eq!(latch.complete(&9), LatchStatus::Unknown);
        assert_eq!(latch.remaining(), 2);
    }

    #[test]
    fn empty_latch_is_open() {
        let latch: MeasureLatch<u32> = MeasureLatch::default();
        assert!(latch.is_open());
        assert_eq!(latch.remaining(), 0);
    }

    #[test]
    fn duplicate_slots_in_arming_count_once() {
        let latch = MeasureLatch::armed([1, 1, 2]);
        assert_eq!(latch.remaining(), 2);
    }

    #[test]
    fn rearm_discards_previous_flags() {
        let mut latch = MeasureLatch::armed([1, 2]);
        latch.complete(&1);
        latch.complete(&2);
        assert!(latch.is_open());

        latch.rearm([1, 3]);
        assert!(!latch.is_open());
        assert!(!latch.contains(&2));
        assert_eq!(latch.remaining(), 2);
    }
}
