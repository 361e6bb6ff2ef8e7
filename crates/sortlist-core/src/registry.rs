#![forbid(unsafe_code)]

//! Geometry registry: measured row sizes and the positions derived from them.
//!
//! The registry stores one [`Size`] per row key as the host reports it, plus
//! optional header and footer sizes. [`GeometryRegistry::positions`] turns a
//! row order into a [`Positions`] table in one pass: every row's start offset
//! along the primary axis, its extent, and its [`SwapZone`].
//!
//! # Invariants
//!
//! 1. Slot starts are the running sum of preceding extents (plus the header
//!    extent), so they are non-decreasing in order and the last slot's end
//!    equals the rows extent.
//! 2. A key with no measurement has zero extent; computing positions never
//!    fails.
//! 3. `all_measured()` is true iff every declared row (and declared
//!    header/footer) of the current generation has a measurement.
//! 4. `reset` increments the generation and forgets every measurement.
//!
//! # Failure Modes
//!
//! - Measurements for keys outside the current generation are dropped. A
//!   late report from a previous data set therefore cannot leak into the new
//!   one.

use std::hash::Hash;

use ahash::AHashMap;

use crate::geometry::{Axis, Point, Size, Span};
use crate::latch::{LatchStatus, MeasureLatch};

/// Width of each swap zone as a fraction of the row's extent.
pub const SWAP_ZONE_FRACTION: f32 = 1.0 / 3.0;

/// A measurable participant in the "all measured" gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MeasureSlot<K> {
    Row(K),
    Header,
    Footer,
}

/// Hysteresis thresholds of one row.
///
/// A dragged row arriving from a lower index displaces this row once its end
/// edge enters `from_before`, the far third; a dragged row arriving from a
/// higher index displaces it once its start edge enters `from_after`, the
/// near third. The middle third belongs to neither: after a swap the dragged
/// row has to travel back across it before the pair swaps again.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SwapZone {
    pub from_before: Span,
    pub from_after: Span,
}

impl SwapZone {
    /// Zones for a row occupying `[start, start + extent]`.
    #[must_use]
    pub fn for_span(start: f32, extent: f32) -> Self {
        let end = start + extent;
        let inset = extent * SWAP_ZONE_FRACTION;
        Self {
            from_before: Span::new(end - inset, end),
            from_after: Span::new(start, start + inset),
        }
    }
}

/// Placement of one row along the primary axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot<K> {
    pub key: K,
    pub start: f32,
    pub extent: f32,
}

impl<K> Slot<K> {
    #[inline]
    #[must_use]
    pub fn end(&self) -> f32 {
        self.start + self.extent
    }

    #[inline]
    #[must_use]
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end())
    }

    #[must_use]
    pub fn swap_zone(&self) -> SwapZone {
        SwapZone::for_span(self.start, self.extent)
    }
}

/// Row positions for one specific order.
#[derive(Debug, Clone)]
pub struct Positions<K: Eq + Hash> {
    axis: Axis,
    slots: Vec<Slot<K>>,
    index: AHashMap<K, usize>,
    header_extent: f32,
    footer_extent: f32,
    cross_extent: f32,
}

impl<K: Clone + Eq + Hash> Positions<K> {
    /// A table with no rows.
    #[must_use]
    pub fn empty(axis: Axis) -> Self {
        Self {
            axis,
            slots: Vec::new(),
            index: AHashMap::new(),
            header_extent: 0.0,
            footer_extent: 0.0,
            cross_extent: 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[Slot<K>] {
        &self.slots
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&Slot<K>> {
        self.index_of(key).map(|i| &self.slots[i])
    }

    #[must_use]
    pub fn slot_at(&self, index: usize) -> Option<&Slot<K>> {
        self.slots.get(index)
    }

    /// Location of `key` as a point on the primary axis.
    #[must_use]
    pub fn location(&self, key: &K) -> Option<Point> {
        self.get(key).map(|slot| self.axis.point(slot.start))
    }

    /// Sum of row extents, excluding header and footer.
    #[must_use]
    pub fn rows_extent(&self) -> f32 {
        self.slots.iter().map(|s| s.extent).sum()
    }

    /// Total scrollable extent: header + rows + footer.
    #[must_use]
    pub fn content_extent(&self) -> f32 {
        self.header_extent + self.rows_extent() + self.footer_extent
    }

    /// Largest measured cross-axis size; every row is laid out at this size.
    #[inline]
    #[must_use]
    pub fn cross_extent(&self) -> f32 {
        self.cross_extent
    }

    #[inline]
    #[must_use]
    pub fn header_extent(&self) -> f32 {
        self.header_extent
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot<K>> {
        self.slots.iter()
    }
}

/// Measured geometry for the current data generation.
#[derive(Debug, Clone)]
pub struct GeometryRegistry<K: Eq + Hash> {
    axis: Axis,
    generation: u64,
    declared: Vec<K>,
    layouts: AHashMap<K, Size>,
    header: Option<Size>,
    footer: Option<Size>,
    has_header: bool,
    has_footer: bool,
    latch: MeasureLatch<MeasureSlot<K>>,
}

impl<K: Clone + Eq + Hash> GeometryRegistry<K> {
    /// Create a registry waiting on `keys`.
    #[must_use]
    pub fn new(axis: Axis, keys: impl IntoIterator<Item = K>) -> Self {
        let mut registry = Self {
            axis,
            generation: 0,
            declared: keys.into_iter().collect(),
            layouts: AHashMap::new(),
            header: None,
            footer: None,
            has_header: false,
            has_footer: false,
            latch: MeasureLatch::default(),
        };
        registry.arm();
        registry
    }

    /// Also wait for a header and/or footer measurement.
    #[must_use]
    pub fn with_decorations(mut self, has_header: bool, has_footer: bool) -> Self {
        self.has_header = has_header;
        self.has_footer = has_footer;
        self.layouts.clear();
        self.header = None;
        self.footer = None;
        self.arm();
        self
    }

    fn arm(&mut self) {
        let mut slots: Vec<MeasureSlot<K>> =
            self.declared.iter().cloned().map(MeasureSlot::Row).collect();
        if self.has_header {
            slots.push(MeasureSlot::Header);
        }
        if self.has_footer {
            slots.push(MeasureSlot::Footer);
        }
        self.latch.rearm(slots);
    }

    /// Forget every measurement and wait on a new key set.
    ///
    /// Returns the new generation id.
    pub fn reset(&mut self, keys: impl IntoIterator<Item = K>) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.declared = keys.into_iter().collect();
        self.layouts.clear();
        self.header = None;
        self.footer = None;
        self.arm();
        self.generation
    }

    /// Store a row measurement.
    ///
    /// Keys outside the current generation are dropped and reported as
    /// [`LatchStatus::Unknown`].
    pub fn record_layout(&mut self, key: K, size: Size) -> LatchStatus {
        let status = self.latch.complete(&MeasureSlot::Row(key.clone()));
        if status != LatchStatus::Unknown {
            self.layouts.insert(key, size);
        }
        status
    }

    /// Store the header measurement. Ignored unless a header was declared.
    pub fn record_header(&mut self, size: Size) -> LatchStatus {
        let status = self.latch.complete(&MeasureSlot::Header);
        if status != LatchStatus::Unknown {
            self.header = Some(size);
        }
        status
    }

    /// Store the footer measurement. Ignored unless a footer was declared.
    pub fn record_footer(&mut self, size: Size) -> LatchStatus {
        let status = self.latch.complete(&MeasureSlot::Footer);
        if status != LatchStatus::Unknown {
            self.footer = Some(size);
        }
        status
    }

    /// Whether every declared participant has reported.
    #[inline]
    #[must_use]
    pub fn all_measured(&self) -> bool {
        self.latch.is_open()
    }

    /// Participants still waiting for a measurement.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.latch.remaining()
    }

    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    #[must_use]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Keys declared for the current generation, in declaration order.
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[K] {
        &self.declared
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.latch.contains(&MeasureSlot::Row(key.clone()))
    }

    #[must_use]
    pub fn layout(&self, key: &K) -> Option<Size> {
        self.layouts.get(key).copied()
    }

    /// Extent of `key` along the primary axis; zero until measured.
    #[must_use]
    pub fn extent(&self, key: &K) -> f32 {
        self.layout(key)
            .map_or(0.0, |size| self.axis.extent(size).max(0.0))
    }

    #[must_use]
    pub fn header_extent(&self) -> f32 {
        self.header
            .map_or(0.0, |size| self.axis.extent(size).max(0.0))
    }

    #[must_use]
    pub fn footer_extent(&self) -> f32 {
        self.footer
            .map_or(0.0, |size| self.axis.extent(size).max(0.0))
    }

    /// Compute positions for `order` in a single pass.
    #[must_use]
    pub fn positions(&self, order: &[K]) -> Positions<K> {
        let header_extent = self.header_extent();
        let mut slots = Vec::with_capacity(order.len());
        let mut index = AHashMap::with_capacity(order.len());
        let mut cross_extent: f32 = 0.0;
        let mut cursor = header_extent;

        for key in order {
            let extent = self.extent(key);
            if let Some(size) = self.layout(key) {
                cross_extent = cross_extent.max(self.axis.cross_extent(size));
            }
            index.insert(key.clone(), slots.len());
            slots.push(Slot {
                key: key.clone(),
                start: cursor,
                extent,
            });
            cursor += extent;
        }

        Positions {
            axis: self.axis,
            slots,
            index,
            header_extent,
            footer_extent: self.footer_extent(),
            cross_extent,
        }
    }
}
