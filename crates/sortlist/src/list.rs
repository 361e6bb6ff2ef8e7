#![forbid(unsafe_code)]

//! The list orchestrator.
//!
//! [`SortableList`] owns the visible order, the per-row gesture machines,
//! the geometry registry, the content offset, and at most one drag session.
//! The host feeds it measurements, pointer events, scroll reports, and clock
//! ticks; every mutating call returns the [`ListEvent`]s the host should act
//! on, and the query methods describe where each row should be drawn.
//!
//! # Lifecycle
//!
//! ```text
//!  new / replace_data ──▶ waiting for layouts ──(all measured)──▶ LayoutReady
//!                                                                   │
//!         ┌─────────────────────────────────────────────────────────┘
//!         ▼
//!  idle ──(long press)──▶ dragging ──(release / terminate)──▶ idle
//!              │            │  ▲
//!              │            ▼  │ move: reorder, autoscroll band check
//!              └──▶ RowPressed (short press)
//! ```
//!
//! # Invariants
//!
//! 1. `order` is always a permutation of the current keys.
//! 2. At most one row is active; `RowActivated` and `RowReleased` alternate.
//! 3. Positions are recomputed after every order or measurement change, and
//!    every idle row is moved to its slot at once.
//! 4. Reordering is suspended while autoscroll runs; the first move after it
//!    catches the slot up with the row.
//! 5. The content offset set by this type never leaves `[0, max_offset]`.
//!
//! # Failure Modes
//!
//! - Events for unknown keys, layouts from a previous generation, releases
//!   without a session, and autoscroll ticks without a session are dropped
//!   and logged at trace level.

use std::fmt;
use std::hash::Hash;

use ahash::{AHashMap, AHashSet};
use tracing::{debug, trace};
use web_time::Instant;

use sortlist_core::event::PointerEvent;
use sortlist_core::geometry::{Point, Rect, Size};
use sortlist_core::gesture::{RowGesture, RowIntent};
use sortlist_core::latch::LatchStatus;
use sortlist_core::registry::{GeometryRegistry, Positions};

use crate::autoscroll::{AutoscrollChange, Autoscroller, ScrollBounds};
use crate::config::{ListConfig, ListConfigError};
use crate::reorder::{Direction, ReorderKind, Reorderer};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// What the host should react to after a call into the list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent<K> {
    /// Every row (and declared header/footer) of `generation` is measured.
    LayoutReady { generation: u64 },
    /// Short press released before activation.
    RowPressed { key: K },
    /// The row is now being dragged.
    RowActivated { key: K },
    /// The active row moved, by pointer or by autoscroll.
    RowMoved { key: K, location: Point },
    /// The order changed during a drag.
    OrderChanged { order: Vec<K> },
    /// The drag ended; `order` is the final order.
    RowReleased { key: K, order: Vec<K> },
    /// Scroll the viewport to `offset`.
    ScrollTo { offset: Point, animated: bool },
}

/// Stacking hint for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ZHint {
    #[default]
    Base,
    /// Drawn above its siblings: the active row, or the last released one.
    Raised,
}

/// Where and how to draw one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement<K> {
    pub key: K,
    pub location: Point,
    /// Cross-axis size shared by every row.
    pub cross_extent: f32,
    pub z: ZHint,
    /// Whether a location change should be animated.
    pub animate: bool,
}

/// The drag in progress.
#[derive(Debug, Clone)]
pub struct DragSession<K> {
    key: K,
    index: usize,
    last_page: Point,
    reorder: Reorderer<K>,
}

impl<K: Clone + Eq + Hash> DragSession<K> {
    #[inline]
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Index of the active key in the current order.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Page position of the last pointer event of the drag.
    #[inline]
    #[must_use]
    pub fn last_page(&self) -> Point {
        self.last_page
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        self.reorder.direction()
    }
}

type RowPredicate<K> = Box<dyn Fn(&K) -> bool>;

// ---------------------------------------------------------------------------
// SortableList
// ---------------------------------------------------------------------------

/// A headless drag-to-reorder list.
pub struct SortableList<K: Clone + Eq + Hash + fmt::Debug> {
    config: ListConfig,
    order: Vec<K>,
    registry: GeometryRegistry<K>,
    positions: Positions<K>,
    rows: AHashMap<K, RowGesture>,
    session: Option<DragSession<K>>,
    autoscroll: Autoscroller,
    /// Scroll offset along the primary axis.
    content_offset: f32,
    viewport: Option<Rect>,
    released_key: Option<K>,
    disabled_rows: Option<RowPredicate<K>>,
    layout_ready: bool,
    animate_rows: bool,
}

impl<K: Clone + Eq + Hash + fmt::Debug> fmt::Debug for SortableList<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortableList")
            .field("config", &self.config)
            .field("order", &self.order)
            .field("generation", &self.registry.generation())
            .field("session", &self.session)
            .field("autoscroll", &self.autoscroll)
            .field("content_offset", &self.content_offset)
            .field("viewport", &self.viewport)
            .field("released_key", &self.released_key)
            .field("has_disabled_rows", &self.disabled_rows.is_some())
            .field("layout_ready", &self.layout_ready)
            .finish_non_exhaustive()
    }
}

impl<K: Clone + Eq + Hash + fmt::Debug> SortableList<K> {
    /// Create a list showing `keys` in their given order.
    ///
    /// Duplicate keys are dropped, keeping the first occurrence.
    pub fn new(
        keys: impl IntoIterator<Item = K>,
        config: ListConfig,
    ) -> Result<Self, ListConfigError> {
        Self::build(keys, None, config)
    }

    /// Create a list with an explicit initial order.
    ///
    /// An `order` that is not a permutation of `keys` is ignored.
    pub fn with_order(
        keys: impl IntoIterator<Item = K>,
        order: impl IntoIterator<Item = K>,
        config: ListConfig,
    ) -> Result<Self, ListConfigError> {
        Self::build(keys, Some(order.into_iter().collect()), config)
    }

    fn build(
        keys: impl IntoIterator<Item = K>,
        order: Option<Vec<K>>,
        config: ListConfig,
    ) -> Result<Self, ListConfigError> {
        let config = config.validated()?;
        let keys = dedup(keys);
        let order = resolve_order(&keys, order);
        let registry = GeometryRegistry::new(config.axis, keys)
            .with_decorations(config.has_header, config.has_footer);
        let positions = registry.positions(&order);
        let autoscroll = Autoscroller::new(config.autoscroll.clone());
        let layout_ready = registry.all_measured();

        let mut list = Self {
            config,
            order,
            registry,
            positions,
            rows: AHashMap::new(),
            session: None,
            autoscroll,
            content_offset: 0.0,
            viewport: None,
            released_key: None,
            disabled_rows: None,
            layout_ready,
            animate_rows: false,
        };
        list.rebuild_rows();
        debug!(
            rows = list.order.len(),
            generation = list.registry.generation(),
            "sortable list created"
        );
        Ok(list)
    }

    // -- Geometry input ----------------------------------------------------

    /// Report the measured size of a row.
    pub fn record_layout(&mut self, key: K, size: Size) -> Vec<ListEvent<K>> {
        let status = self.registry.record_layout(key.clone(), size);
        if status == LatchStatus::Unknown {
            trace!(?key, "layout for unknown key ignored");
            return Vec::new();
        }
        if let Some(row) = self.rows.get_mut(&key) {
            row.set_size(size);
        }
        self.after_measure(status)
    }

    /// Report the measured size of the header. Ignored unless declared.
    pub fn record_header(&mut self, size: Size) -> Vec<ListEvent<K>> {
        let status = self.registry.record_header(size);
        if status == LatchStatus::Unknown {
            trace!("header layout ignored: no header declared");
            return Vec::new();
        }
        self.after_measure(status)
    }

    /// Report the measured size of the footer. Ignored unless declared.
    pub fn record_footer(&mut self, size: Size) -> Vec<ListEvent<K>> {
        let status = self.registry.record_footer(size);
        if status == LatchStatus::Unknown {
            trace!("footer layout ignored: no footer declared");
            return Vec::new();
        }
        self.after_measure(status)
    }

    fn after_measure(&mut self, status: LatchStatus) -> Vec<ListEvent<K>> {
        self.refresh_positions();
        if status != LatchStatus::Opened {
            return Vec::new();
        }
        self.layout_ready = true;
        self.animate_rows = false;
        let generation = self.registry.generation();
        debug!(
            generation,
            content_extent = self.positions.content_extent(),
            "all rows measured"
        );
        vec![ListEvent::LayoutReady { generation }]
    }

    /// Set the viewport bounds in page coordinates.
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = Some(viewport);
    }

    /// Record a scroll offset reported by the host.
    pub fn on_scroll(&mut self, offset: Point) {
        self.content_offset = self.config.axis.main(offset);
    }

    // -- Scrolling ---------------------------------------------------------

    /// Scroll by `delta` along the primary axis, clamped to the content.
    pub fn scroll_by(&mut self, delta: f32, animated: bool) -> ListEvent<K> {
        self.scroll_to(self.content_offset + delta, animated)
    }

    /// Scroll to `offset` along the primary axis, clamped to the content.
    pub fn scroll_to(&mut self, offset: f32, animated: bool) -> ListEvent<K> {
        self.content_offset = self.scroll_bounds().clamp(offset);
        ListEvent::ScrollTo {
            offset: self.content_offset(),
            animated,
        }
    }

    /// Scroll so that `key` starts at the top of the viewport, unless its
    /// start already lies within the visible range. Does nothing before the
    /// first [`set_viewport`](Self::set_viewport).
    pub fn scroll_to_key(&mut self, key: &K, animated: bool) -> Option<ListEvent<K>> {
        if self.viewport.is_none() {
            return None;
        }
        let start = self.positions.get(key)?.start;
        let visible = self.content_offset..=self.content_offset + self.viewport_extent();
        if visible.contains(&start) {
            return None;
        }
        Some(self.scroll_to(start, animated))
    }

    // -- Data --------------------------------------------------------------

    /// Apply an order chosen by the host.
    ///
    /// Ignored unless `order` is a permutation of the current keys. Returns
    /// whether the order was applied.
    pub fn set_order(&mut self, order: Vec<K>) -> bool {
        if !is_permutation(&self.order, &order) {
            debug!(?order, "set_order ignored: not a permutation of the current keys");
            return false;
        }
        if order == self.order {
            return true;
        }
        self.order = order;
        if let Some(session) = self.session.as_mut() {
            if let Some(index) = self.order.iter().position(|k| *k == session.key) {
                session.index = index;
            }
        }
        self.animate_rows = self.layout_ready;
        self.refresh_positions();
        true
    }

    /// Replace the backing collection.
    ///
    /// Any drag ends (`RowReleased`), autoscroll stops, the offset returns to
    /// zero, and every row must be measured again under a new generation.
    /// An `order` that is not a permutation of `keys` is ignored.
    pub fn replace_data(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        order: Option<Vec<K>>,
    ) -> Vec<ListEvent<K>> {
        let mut events = Vec::new();

        if let Some(session) = self.session.take() {
            debug!(key = ?session.key, "drag ended by data replacement");
            events.push(ListEvent::RowReleased {
                key: session.key,
                order: self.order.clone(),
            });
        }
        if self.autoscroll.stop() {
            debug!("autoscroll stopped by data replacement");
        }

        let keys = dedup(keys);
        self.order = resolve_order(&keys, order);
        let generation = self.registry.reset(keys);
        self.positions = self.registry.positions(&self.order);
        self.layout_ready = self.registry.all_measured();
        self.animate_rows = false;
        self.released_key = None;
        self.rebuild_rows();

        self.content_offset = 0.0;
        events.push(ListEvent::ScrollTo {
            offset: Point::ORIGIN,
            animated: false,
        });
        debug!(generation, rows = self.order.len(), "data replaced");
        events
    }

    // -- Gesture input -----------------------------------------------------

    /// Route a pointer event received by the row `key`.
    ///
    /// Due timers run first.
    pub fn handle_pointer(
        &mut self,
        key: &K,
        event: &PointerEvent,
        now: Instant,
    ) -> Vec<ListEvent<K>> {
        let mut events = self.tick(now);
        let Some(row) = self.rows.get_mut(key) else {
            trace!(?key, "pointer event for unknown key ignored");
            return events;
        };
        for intent in row.process(event, now) {
            self.apply_intent(key, intent, now, &mut events);
        }
        events
    }

    /// Activate a pressed row without waiting (manual activation).
    pub fn activate_row(&mut self, key: &K, now: Instant) -> Vec<ListEvent<K>> {
        let mut events = self.tick(now);
        if let Some(intent) = self.rows.get_mut(key).and_then(RowGesture::activate) {
            self.apply_intent(key, intent, now, &mut events);
        }
        events
    }

    /// Ask whether the row `key` gives up its gesture to an ancestor.
    ///
    /// The active row refuses; any other row agrees and drops a pending press.
    pub fn request_termination(&mut self, key: &K) -> bool {
        self.rows.get_mut(key).is_none_or(RowGesture::should_yield)
    }

    /// The gesture was taken away from the row `key`.
    pub fn terminate_row(&mut self, key: &K, now: Instant) -> Vec<ListEvent<K>> {
        let mut events = Vec::new();
        if let Some(intent) = self.rows.get_mut(key).and_then(RowGesture::terminate) {
            self.apply_intent(key, intent, now, &mut events);
        }
        events
    }

    /// Run every timer due at `now`: activation deadlines and autoscroll.
    pub fn tick(&mut self, now: Instant) -> Vec<ListEvent<K>> {
        let mut events = Vec::new();

        let mut fired = Vec::new();
        for key in &self.order {
            if let Some(intent) = self.rows.get_mut(key).and_then(|row| row.poll(now)) {
                fired.push((key.clone(), intent));
            }
        }
        for (key, intent) in fired {
            self.apply_intent(&key, intent, now, &mut events);
        }

        self.tick_autoscroll(now, &mut events);
        events
    }

    // -- Settings ----------------------------------------------------------

    /// Enable or disable dragging for every row.
    ///
    /// A drag in progress continues until released.
    pub fn set_sorting_enabled(&mut self, enabled: bool) {
        self.config.sorting_enabled = enabled;
        self.sync_disabled();
    }

    /// Enable or disable scrolling, autoscroll included.
    pub fn set_scroll_enabled(&mut self, enabled: bool) {
        self.config.scroll_enabled = enabled;
        if !enabled && self.autoscroll.stop() {
            debug!("autoscroll stopped: scrolling disabled");
        }
    }

    /// Disable dragging for rows matching `predicate`.
    pub fn set_disabled_rows(&mut self, predicate: impl Fn(&K) -> bool + 'static) {
        self.disabled_rows = Some(Box::new(predicate));
        self.sync_disabled();
    }

    /// Re-enable every row disabled through [`Self::set_disabled_rows`].
    pub fn clear_disabled_rows(&mut self) {
        self.disabled_rows = None;
        self.sync_disabled();
    }

    // -- Queries -----------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn order(&self) -> &[K] {
        &self.order
    }

    /// Positions for the current order.
    #[inline]
    #[must_use]
    pub fn positions(&self) -> &Positions<K> {
        &self.positions
    }

    /// Where and how to draw every row, in order.
    #[must_use]
    pub fn placements(&self) -> Vec<Placement<K>> {
        let active = self.active_key();
        let cross_extent = self.positions.cross_extent();
        self.positions
            .iter()
            .map(|slot| {
                let is_active = active == Some(&slot.key);
                let raised = is_active || self.released_key.as_ref() == Some(&slot.key);
                let location = self.rows.get(&slot.key).map_or_else(
                    || self.config.axis.point(slot.start),
                    RowGesture::location,
                );
                Placement {
                    key: slot.key.clone(),
                    location,
                    cross_extent,
                    z: if raised { ZHint::Raised } else { ZHint::Base },
                    animate: self.animate_rows && !is_active,
                }
            })
            .collect()
    }

    /// Where the row `key` is drawn right now.
    #[must_use]
    pub fn row_location(&self, key: &K) -> Option<Point> {
        self.rows.get(key).map(RowGesture::location)
    }

    /// Current scroll offset as a point on the primary axis.
    #[must_use]
    pub fn content_offset(&self) -> Point {
        self.config.axis.point(self.content_offset)
    }

    /// Header, rows, and footer extent along the primary axis.
    #[must_use]
    pub fn content_extent(&self) -> f32 {
        self.positions.content_extent()
    }

    #[must_use]
    pub fn active_key(&self) -> Option<&K> {
        self.session.as_ref().map(|s| &s.key)
    }

    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<&DragSession<K>> {
        self.session.as_ref()
    }

    /// The most recently released row, until the next activation.
    #[inline]
    #[must_use]
    pub fn released_key(&self) -> Option<&K> {
        self.released_key.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    #[inline]
    #[must_use]
    pub fn is_autoscrolling(&self) -> bool {
        self.autoscroll.is_running()
    }

    /// Whether the host should let the user scroll: enabled and no drag.
    #[inline]
    #[must_use]
    pub fn scroll_enabled(&self) -> bool {
        self.config.scroll_enabled && self.session.is_none()
    }

    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.registry.generation()
    }

    /// Whether every row of the current generation has been measured.
    #[inline]
    #[must_use]
    pub fn is_layout_ready(&self) -> bool {
        self.layout_ready
    }
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

impl<K: Clone + Eq + Hash + fmt::Debug> SortableList<K> {
    fn apply_intent(
        &mut self,
        key: &K,
        intent: RowIntent,
        now: Instant,
        events: &mut Vec<ListEvent<K>>,
    ) {
        match intent {
            RowIntent::Press { .. } => {
                events.push(ListEvent::RowPressed { key: key.clone() });
            }
            RowIntent::Activate { page, .. } => self.begin_drag(key, page, events),
            RowIntent::Move {
                delta,
                location,
                page,
            } => self.drag_move(key, delta, location, page, now, events),
            RowIntent::Release { settle_to, .. } => self.end_drag(key, settle_to, events),
        }
    }

    fn begin_drag(&mut self, key: &K, page: Point, events: &mut Vec<ListEvent<K>>) {
        if let Some(session) = &self.session {
            trace!(?key, active = ?session.key, "second activation refused");
            if let Some(row) = self.rows.get_mut(key) {
                row.reset();
            }
            return;
        }
        let Some(index) = self.order.iter().position(|k| k == key) else {
            return;
        };
        self.session = Some(DragSession {
            key: key.clone(),
            index,
            last_page: page,
            reorder: Reorderer::new(),
        });
        self.released_key = None;
        debug!(?key, index, "row activated");
        events.push(ListEvent::RowActivated { key: key.clone() });
    }

    fn drag_move(
        &mut self,
        key: &K,
        delta: f32,
        location: Point,
        page: Point,
        now: Instant,
        events: &mut Vec<ListEvent<K>>,
    ) {
        let axis = self.config.axis;
        let Some(session) = self.session.as_mut().filter(|s| s.key == *key) else {
            trace!(?key, "move without a matching drag ignored");
            return;
        };
        session.last_page = page;
        session.reorder.observe(delta);
        events.push(ListEvent::RowMoved {
            key: key.clone(),
            location,
        });

        if !self.autoscroll.is_running() {
            let reorder = session.reorder.evaluate(
                key,
                session.index,
                axis.main(location),
                &self.order,
                &self.positions,
            );
            if let Some(reorder) = reorder {
                session.index = reorder.to;
                debug!(
                    ?key,
                    from = reorder.from,
                    to = reorder.to,
                    displaced = ?reorder.displaced,
                    shift = reorder.kind == ReorderKind::Shift,
                    "order changed"
                );
                self.order = reorder.order;
                self.animate_rows = true;
                self.refresh_positions();
                events.push(ListEvent::OrderChanged {
                    order: self.order.clone(),
                });
            }
        }

        self.update_autoscroll(page, now);
    }

    fn end_drag(&mut self, key: &K, settle_to: Option<Point>, events: &mut Vec<ListEvent<K>>) {
        if self.session.as_ref().is_none_or(|s| s.key != *key) {
            trace!(?key, "release without a matching drag ignored");
            return;
        }
        self.session = None;
        if self.autoscroll.stop() {
            debug!("autoscroll stopped by release");
        }
        self.released_key = Some(key.clone());
        debug!(?key, settled = settle_to.is_some(), "row released");
        events.push(ListEvent::RowReleased {
            key: key.clone(),
            order: self.order.clone(),
        });
    }

    fn update_autoscroll(&mut self, page: Point, now: Instant) {
        if !self.config.scroll_enabled {
            return;
        }
        let Some(viewport) = self.viewport else {
            return;
        };
        let axis = self.config.axis;
        let band = self.autoscroll.band(axis.main(page), viewport, axis);
        match self.autoscroll.update(band, self.scroll_bounds(), now) {
            AutoscrollChange::Started(direction) => {
                debug!(?direction, offset = self.content_offset, "autoscroll started");
            }
            AutoscrollChange::Stopped => debug!("autoscroll stopped: pointer left the edge"),
            AutoscrollChange::Unchanged => {}
        }
    }

    fn tick_autoscroll(&mut self, now: Instant, events: &mut Vec<ListEvent<K>>) {
        if !self.autoscroll.is_running() {
            return;
        }
        let Some(key) = self.session.as_ref().map(|s| s.key.clone()) else {
            trace!("stale autoscroll timer stopped");
            self.autoscroll.stop();
            return;
        };
        let bounds = self.scroll_bounds();
        let delta = self.autoscroll.tick(now, bounds);
        if !self.autoscroll.is_running() {
            debug!(offset = self.content_offset, "autoscroll stopped at bound");
        }
        let Some(delta) = delta else {
            return;
        };

        self.content_offset = bounds.clamp(self.content_offset + delta);
        trace!(delta, offset = self.content_offset, "autoscroll tick");
        events.push(ListEvent::ScrollTo {
            offset: self.content_offset(),
            animated: false,
        });
        if let Some(location) = self.rows.get_mut(&key).and_then(|row| row.shift(delta)) {
            events.push(ListEvent::RowMoved { key, location });
        }
        if let Some(session) = self.session.as_mut() {
            session.reorder.resync();
        }
    }

    fn scroll_bounds(&self) -> ScrollBounds {
        ScrollBounds::new(
            self.content_offset,
            self.positions.content_extent(),
            self.viewport_extent(),
        )
    }

    fn viewport_extent(&self) -> f32 {
        self.viewport
            .map_or(0.0, |v| self.config.axis.extent(v.size()))
    }

    /// Recompute positions for the current order and retarget every row.
    fn refresh_positions(&mut self) {
        self.positions = self.registry.positions(&self.order);
        for slot in self.positions.iter() {
            if let Some(row) = self.rows.get_mut(&slot.key) {
                row.set_target(self.config.axis.point(slot.start));
            }
        }
    }

    fn rebuild_rows(&mut self) {
        let gesture = self.config.to_gesture_config();
        self.rows = self
            .positions
            .iter()
            .map(|slot| {
                let location = self.config.axis.point(slot.start);
                (slot.key.clone(), RowGesture::new(gesture.clone(), location))
            })
            .collect();
        self.sync_disabled();
    }

    fn sync_disabled(&mut self) {
        let sorting = self.config.sorting_enabled;
        for (key, row) in &mut self.rows {
            let disabled = !sorting || self.disabled_rows.as_ref().is_some_and(|p| p(key));
            row.set_disabled(disabled);
        }
    }
}

/// Keep the first occurrence of every key.
fn dedup<K: Clone + Eq + Hash + fmt::Debug>(keys: impl IntoIterator<Item = K>) -> Vec<K> {
    let mut seen = AHashSet::new();
    keys.into_iter()
        .filter(|key| {
            let fresh = seen.insert(key.clone());
            if !fresh {
                trace!(?key, "duplicate key dropped");
            }
            fresh
        })
        .collect()
}

fn resolve_order<K: Clone + Eq + Hash + fmt::Debug>(keys: &[K], order: Option<Vec<K>>) -> Vec<K> {
    match order {
        Some(order) if is_permutation(keys, &order) => order,
        Some(order) => {
            debug!(?order, "initial order ignored: not a permutation of the keys");
            keys.to_vec()
        }
        None => keys.to_vec(),
    }
}

fn is_permutation<K: Eq + Hash>(keys: &[K], candidate: &[K]) -> bool {
    if keys.len() != candidate.len() {
        return false;
    }
    let expected: AHashSet<&K> = keys.iter().collect();
    let mut seen = AHashSet::with_capacity(candidate.len());
    candidate
        .iter()
        .all(|key| expected.contains(key) && seen.insert(key))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sortlist_core::event::test_helpers::{down, moved, up};
    use sortlist_core::geometry::Axis;
    use std::time::Duration;

    const MS_100: Duration = Duration::from_millis(100);
    const MS_200: Duration = Duration::from_millis(200);

    fn measured(n: u32) -> SortableList<u32> {
        let mut list = SortableList::new(0..n, ListConfig::default()).expect("valid config");
        for k in 0..n {
            list.record_layout(k, Size::new(320.0, 50.0));
        }
        list.set_viewport(Rect::new(0.0, 0.0, 320.0, 200.0));
        list
    }

    /// Press row `key` at page y `y` and hold past the activation delay.
    fn drag(list: &mut SortableList<u32>, key: u32, y: f32, t: Instant) -> Vec<ListEvent<u32>> {
        let top = list.row_location(&key).expect("row").y;
        list.handle_pointer(&key, &down((10.0, y), (10.0, y - top)), t);
        list.tick(t + MS_200)
    }

    fn has_order_change(events: &[ListEvent<u32>]) -> bool {
        events
            .iter()
            .any(|e| matches!(e, ListEvent::OrderChanged { .. }))
    }

    // --- Construction ---

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ListConfig::default();
        config.autoscroll.interval_ms = 0;
        let err = SortableList::new(0..3u32, config).unwrap_err();
        assert!(matches!(err, ListConfigError::Validation(_)));
    }

    #[test]
    fn duplicate_keys_are_dropped() {
        let list = SortableList::new([1u32, 2, 1, 3], ListConfig::default()).expect("list");
        assert_eq!(list.order(), &[1, 2, 3]);
    }

    #[test]
    fn with_order_requires_permutation() {
        let list = SortableList::with_order(0..3u32, [2, 0, 1], ListConfig::default())
            .expect("list");
        assert_eq!(list.order(), &[2, 0, 1]);
        let list = SortableList::with_order(0..3u32, [2, 2, 1], ListConfig::default())
            .expect("list");
        assert_eq!(list.order(), &[0, 1, 2]);
    }

    #[test]
    fn empty_list_is_ready_immediately() {
        let list = SortableList::<u32>::new([], ListConfig::default()).expect("list");
        assert!(list.is_layout_ready());
        assert_eq!(list.content_extent(), 0.0);
    }

    // --- Layout gate ---

    #[test]
    fn layout_ready_emitted_once() {
        let mut list = SortableList::new(0..3u32, ListConfig::default()).expect("list");
        assert!(list.record_layout(0, Size::new(320.0, 50.0)).is_empty());
        assert!(list.record_layout(1, Size::new(320.0, 40.0)).is_empty());
        assert!(!list.is_layout_ready());
        let events = list.record_layout(2, Size::new(300.0, 30.0));
        assert_eq!(events, vec![ListEvent::LayoutReady { generation: 0 }]);
        assert!(list.is_layout_ready());
        assert!(list.record_layout(2, Size::new(300.0, 60.0)).is_empty());
        assert_eq!(list.content_extent(), 150.0);
        assert_eq!(list.row_location(&2), Some(Point::new(0.0, 90.0)));
    }

    #[test]
    fn unknown_key_layout_is_ignored() {
        let mut list = SortableList::new(0..2u32, ListConfig::default()).expect("list");
        assert!(list.record_layout(9, Size::new(10.0, 10.0)).is_empty());
        assert_eq!(list.content_extent(), 0.0);
    }

    #[test]
    fn header_waits_and_offsets_rows() {
        let config = ListConfig {
            has_header: true,
            ..ListConfig::default()
        };
        let mut list = SortableList::new(0..2u32, config).expect("list");
        list.record_layout(0, Size::new(320.0, 50.0));
        assert!(list.record_layout(1, Size::new(320.0, 50.0)).is_empty());
        let events = list.record_header(Size::new(320.0, 20.0));
        assert_eq!(events, vec![ListEvent::LayoutReady { generation: 0 }]);
        assert_eq!(list.row_location(&0), Some(Point::new(0.0, 20.0)));
        assert_eq!(list.content_extent(), 120.0);
    }

    #[test]
    fn undeclared_footer_is_ignored() {
        let mut list = measured(2);
        assert!(list.record_footer(Size::new(320.0, 40.0)).is_empty());
        assert_eq!(list.content_extent(), 100.0);
    }

    #[test]
    fn placements_share_cross_extent() {
        let mut list = SortableList::new(0..2u32, ListConfig::default()).expect("list");
        list.record_layout(0, Size::new(200.0, 50.0));
        list.record_layout(1, Size::new(320.0, 50.0));
        let placements = list.placements();
        assert!(placements.iter().all(|p| p.cross_extent == 320.0));
        assert!(placements.iter().all(|p| !p.animate));
        assert!(placements.iter().all(|p| p.z == ZHint::Base));
    }

    // --- Press and drag ---

    #[test]
    fn short_press_emits_pressed() {
        let mut list = measured(3);
        let t = Instant::now();
        list.handle_pointer(&1, &down((10.0, 70.0), (10.0, 20.0)), t);
        let events = list.handle_pointer(&1, &up((10.0, 70.0), (10.0, 20.0)), t + MS_100);
        assert_eq!(events, vec![ListEvent::RowPressed { key: 1 }]);
        assert!(!list.is_dragging());
    }

    #[test]
    fn long_press_activates_and_blocks_user_scroll() {
        let mut list = measured(3);
        let t = Instant::now();
        assert!(list.scroll_enabled());
        let events = drag(&mut list, 1, 70.0, t);
        assert_eq!(events, vec![ListEvent::RowActivated { key: 1 }]);
        assert_eq!(list.active_key(), Some(&1));
        assert!(!list.scroll_enabled());
        assert_eq!(list.session().map(DragSession::index), Some(1));
    }

    #[test]
    fn drag_reorders_through_two_rows() {
        let mut list = measured(5);
        let t = Instant::now();
        drag(&mut list, 0, 25.0, t);

        let events = list.handle_pointer(&0, &moved((10.0, 93.0), (10.0, 93.0)), t + MS_200);
        assert!(events.contains(&ListEvent::RowMoved {
            key: 0,
            location: Point::new(0.0, 68.0)
        }));
        assert!(events.contains(&ListEvent::OrderChanged {
            order: vec![1, 0, 2, 3, 4]
        }));
        // The displaced row moved into the vacated slot; the active row did not.
        assert_eq!(list.row_location(&1), Some(Point::ORIGIN));
        assert_eq!(list.row_location(&0), Some(Point::new(0.0, 68.0)));

        let events = list.handle_pointer(&0, &moved((10.0, 125.0), (10.0, 125.0)), t + MS_200);
        assert!(events.contains(&ListEvent::OrderChanged {
            order: vec![1, 2, 0, 3, 4]
        }));

        let events = list.handle_pointer(&0, &up((10.0, 125.0), (10.0, 125.0)), t + MS_200);
        assert_eq!(
            events,
            vec![ListEvent::RowReleased {
                key: 0,
                order: vec![1, 2, 0, 3, 4]
            }]
        );
        assert_eq!(list.row_location(&0), Some(Point::new(0.0, 100.0)));
        assert_eq!(list.released_key(), Some(&0));
        assert!(list.scroll_enabled());
    }

    #[test]
    fn release_settles_to_slot_and_raises_row() {
        let mut list = measured(3);
        let t = Instant::now();
        drag(&mut list, 0, 25.0, t);
        list.handle_pointer(&0, &moved((10.0, 35.0), (10.0, 35.0)), t + MS_200);
        assert_eq!(list.row_location(&0), Some(Point::new(0.0, 10.0)));
        list.handle_pointer(&0, &up((10.0, 35.0), (10.0, 35.0)), t + MS_200);
        assert_eq!(list.row_location(&0), Some(Point::ORIGIN));

        let placements = list.placements();
        assert_eq!(placements[0].z, ZHint::Raised);
        assert_eq!(placements[1].z, ZHint::Base);

        // The next activation clears the released key.
        drag(&mut list, 2, 125.0, t + MS_200);
        assert_eq!(list.released_key(), None);
    }

    #[test]
    fn active_row_is_never_animated() {
        let mut list = measured(3);
        let t = Instant::now();
        drag(&mut list, 0, 25.0, t);
        list.handle_pointer(&0, &moved((10.0, 95.0), (10.0, 95.0)), t + MS_200);
        let placements = list.placements();
        for p in placements {
            assert_eq!(p.animate, p.key != 0, "row {}", p.key);
            if p.key == 0 {
                assert_eq!(p.z, ZHint::Raised);
            }
        }
    }

    #[test]
    fn second_row_cannot_activate_during_drag() {
        let mut list = measured(3);
        let t = Instant::now();
        drag(&mut list, 0, 25.0, t);
        let events = drag(&mut list, 2, 125.0, t + MS_200);
        assert!(events.is_empty());
        assert_eq!(list.active_key(), Some(&0));
    }

    #[test]
    fn terminate_releases_active_row() {
        let mut list = measured(3);
        let t = Instant::now();
        drag(&mut list, 1, 75.0, t);
        assert!(!list.request_termination(&1));
        let events = list.terminate_row(&1, t + MS_200);
        assert_eq!(
            events,
            vec![ListEvent::RowReleased {
                key: 1,
                order: vec![0, 1, 2]
            }]
        );
        assert!(list.terminate_row(&1, t + MS_200).is_empty());
    }

    #[test]
    fn yielding_cancels_pending_press() {
        let mut list = measured(3);
        let t = Instant::now();
        list.handle_pointer(&1, &down((10.0, 70.0), (10.0, 20.0)), t);
        assert!(list.request_termination(&1));
        assert!(list.tick(t + MS_200).is_empty());
        assert!(!list.is_dragging());
    }

    #[test]
    fn manual_activation() {
        let config = ListConfig {
            manual_activation: true,
            ..ListConfig::default()
        };
        let mut list = SortableList::new(0..2u32, config).expect("list");
        let t = Instant::now();
        list.handle_pointer(&0, &down((10.0, 10.0), (10.0, 10.0)), t);
        assert!(list.tick(t + Duration::from_secs(2)).is_empty());
        let events = list.activate_row(&0, t + Duration::from_secs(2));
        assert_eq!(events, vec![ListEvent::RowActivated { key: 0 }]);
    }

    #[test]
    fn sorting_disabled_rows_ignore_touches() {
        let mut list = measured(3);
        list.set_sorting_enabled(false);
        let t = Instant::now();
        assert!(drag(&mut list, 0, 25.0, t).is_empty());
        list.set_sorting_enabled(true);
        assert_eq!(
            drag(&mut list, 0, 25.0, t + MS_200),
            vec![ListEvent::RowActivated { key: 0 }]
        );
    }

    #[test]
    fn disabled_rows_predicate() {
        let mut list = measured(3);
        list.set_disabled_rows(|k| *k == 1);
        let t = Instant::now();
        assert!(drag(&mut list, 1, 75.0, t).is_empty());
        assert_eq!(
            drag(&mut list, 2, 125.0, t),
            vec![ListEvent::RowActivated { key: 2 }]
        );
        list.handle_pointer(&2, &up((10.0, 125.0), (10.0, 25.0)), t + MS_200);
        list.clear_disabled_rows();
        assert_eq!(
            drag(&mut list, 1, 75.0, t + MS_200),
            vec![ListEvent::RowActivated { key: 1 }]
        );
    }

    #[test]
    fn unknown_key_pointer_is_ignored() {
        let mut list = measured(2);
        let events = list.handle_pointer(&7, &down((0.0, 0.0), (0.0, 0.0)), Instant::now());
        assert!(events.is_empty());
    }

    // --- Autoscroll ---

    #[test]
    fn autoscroll_scrolls_and_follows() {
        let mut list = measured(5);
        let t = Instant::now();
        drag(&mut list, 0, 25.0, t);

        let events = list.handle_pointer(&0, &moved((10.0, 170.0), (10.0, 170.0)), t + MS_200);
        assert!(has_order_change(&events));
        assert!(list.is_autoscrolling());

        let events = list.tick(t + MS_200 + MS_100);
        assert!(events.contains(&ListEvent::ScrollTo {
            offset: Point::new(0.0, 30.0),
            animated: false
        }));
        assert!(events.contains(&ListEvent::RowMoved {
            key: 0,
            location: Point::new(0.0, 175.0)
        }));

        // Max offset is 250 - 200 = 50: the second step is shortened.
        let events = list.tick(t + MS_200 + MS_100 * 2);
        assert!(events.contains(&ListEvent::ScrollTo {
            offset: Point::new(0.0, 50.0),
            animated: false
        }));
        assert!(!list.is_autoscrolling());
        assert_eq!(list.content_offset(), Point::new(0.0, 50.0));
        assert_eq!(list.row_location(&0), Some(Point::new(0.0, 195.0)));
    }

    #[test]
    fn reorder_suspended_while_autoscrolling() {
        let mut list = measured(10);
        let t = Instant::now();
        drag(&mut list, 0, 25.0, t);
        list.handle_pointer(&0, &moved((10.0, 170.0), (10.0, 170.0)), t + MS_200);
        assert!(list.is_autoscrolling());
        let order = list.order().to_vec();

        let events = list.handle_pointer(&0, &moved((10.0, 172.0), (10.0, 172.0)), t + MS_200);
        assert!(!has_order_change(&events));
        assert_eq!(list.order(), order.as_slice());
    }

    #[test]
    fn leaving_band_stops_autoscroll() {
        let mut list = measured(10);
        let t = Instant::now();
        drag(&mut list, 0, 25.0, t);
        list.handle_pointer(&0, &moved((10.0, 170.0), (10.0, 170.0)), t + MS_200);
        assert!(list.is_autoscrolling());
        list.handle_pointer(&0, &moved((10.0, 100.0), (10.0, 100.0)), t + MS_200);
        assert!(!list.is_autoscrolling());
    }

    #[test]
    fn autoscroll_disabled_with_scrolling() {
        let mut list = measured(10);
        list.set_scroll_enabled(false);
        let t = Instant::now();
        drag(&mut list, 0, 25.0, t);
        list.handle_pointer(&0, &moved((10.0, 170.0), (10.0, 170.0)), t + MS_200);
        assert!(!list.is_autoscrolling());
    }

    #[test]
    fn release_stops_autoscroll() {
        let mut list = measured(10);
        let t = Instant::now();
        drag(&mut list, 0, 25.0, t);
        list.handle_pointer(&0, &moved((10.0, 170.0), (10.0, 170.0)), t + MS_200);
        list.handle_pointer(&0, &up((10.0, 170.0), (10.0, 170.0)), t + MS_200);
        assert!(!list.is_autoscrolling());
        assert!(list.tick(t + Duration::from_secs(1)).is_empty());
    }

    // --- Scrolling ---

    #[test]
    fn scroll_commands_clamp() {
        let mut list = measured(10);
        assert_eq!(
            list.scroll_by(-20.0, true),
            ListEvent::ScrollTo {
                offset: Point::ORIGIN,
                animated: true
            }
        );
        list.scroll_to(1000.0, false);
        assert_eq!(list.content_offset(), Point::new(0.0, 300.0));
        list.scroll_by(-50.0, false);
        assert_eq!(list.content_offset(), Point::new(0.0, 250.0));
    }

    #[test]
    fn scroll_to_key_only_when_hidden() {
        let mut list = measured(10);
        assert_eq!(list.scroll_to_key(&2, false), None);
        assert_eq!(
            list.scroll_to_key(&6, true),
            Some(ListEvent::ScrollTo {
                offset: Point::new(0.0, 300.0),
                animated: true
            })
        );
        assert_eq!(list.scroll_to_key(&9, false), None);
        assert_eq!(list.scroll_to_key(&42, false), None);
    }

    #[test]
    fn scroll_to_key_waits_for_viewport() {
        let mut list = SortableList::new(0..10u32, ListConfig::default()).expect("list");
        for k in 0..10 {
            list.record_layout(k, Size::new(320.0, 50.0));
        }
        assert_eq!(list.scroll_to_key(&6, false), None);
        assert_eq!(list.content_offset(), Point::ORIGIN);

        list.set_viewport(Rect::new(0.0, 0.0, 320.0, 200.0));
        assert!(list.scroll_to_key(&6, false).is_some());
    }

    #[test]
    fn on_scroll_tracks_host_offset() {
        let mut list = measured(10);
        list.on_scroll(Point::new(0.0, 120.0));
        assert_eq!(list.content_offset(), Point::new(0.0, 120.0));
    }

    #[test]
    fn horizontal_axis() {
        let config = ListConfig {
            axis: Axis::Horizontal,
            ..ListConfig::default()
        };
        let mut list = SortableList::new(0..3u32, config).expect("list");
        for k in 0..3 {
            list.record_layout(k, Size::new(80.0, 40.0));
        }
        assert_eq!(list.row_location(&2), Some(Point::new(160.0, 0.0)));
        assert_eq!(list.content_extent(), 240.0);
    }

    // --- Data and order ---

    #[test]
    fn set_order_requires_permutation() {
        let mut list = measured(3);
        assert!(!list.set_order(vec![0, 1]));
        assert!(!list.set_order(vec![0, 1, 1]));
        assert!(!list.set_order(vec![0, 1, 5]));
        assert!(list.set_order(vec![2, 0, 1]));
        assert_eq!(list.row_location(&2), Some(Point::ORIGIN));
        assert_eq!(list.generation(), 0);
    }

    #[test]
    fn set_order_refreshes_active_index() {
        let mut list = measured(3);
        let t = Instant::now();
        drag(&mut list, 0, 25.0, t);
        assert!(list.set_order(vec![1, 2, 0]));
        assert_eq!(list.session().map(DragSession::index), Some(2));
    }

    #[test]
    fn replace_data_resets_geometry() {
        let mut list = measured(3);
        list.scroll_to(30.0, false);
        let events = list.replace_data(10..13u32, None);
        assert_eq!(
            events,
            vec![ListEvent::ScrollTo {
                offset: Point::ORIGIN,
                animated: false
            }]
        );
        assert_eq!(list.generation(), 1);
        assert!(!list.is_layout_ready());
        assert_eq!(list.content_extent(), 0.0);
        assert!(list.record_layout(0, Size::new(320.0, 50.0)).is_empty());
        for k in 10..12 {
            list.record_layout(k, Size::new(320.0, 50.0));
        }
        assert_eq!(
            list.record_layout(12, Size::new(320.0, 50.0)),
            vec![ListEvent::LayoutReady { generation: 1 }]
        );
    }

    #[test]
    fn replace_data_ends_drag() {
        let mut list = measured(3);
        let t = Instant::now();
        drag(&mut list, 0, 25.0, t);
        let events = list.replace_data(0..3u32, Some(vec![2, 1, 0]));
        assert_eq!(
            events[0],
            ListEvent::RowReleased {
                key: 0,
                order: vec![0, 1, 2]
            }
        );
        assert!(!list.is_dragging());
        assert_eq!(list.order(), &[2, 1, 0]);
        assert!(list.tick(t + Duration::from_secs(1)).is_empty());
    }
}
