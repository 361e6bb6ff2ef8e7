#![forbid(unsafe_code)]

//! Sortlist
//!
//! A headless drag-to-reorder list engine. The host renders rows and reports
//! measurements, pointer events, and scroll offsets; the list decides when a
//! row becomes draggable, when it displaces its neighbors, and when the
//! viewport should scroll under it.
//!
//! # Key Components
//!
//! - [`SortableList`] - Orchestrator owning order, drag session, and offset
//! - [`ListEvent`] - What the host should react to after each call
//! - [`ListConfig`] - Validated configuration, loadable from TOML/JSON
//! - [`Reorderer`] - Swap/shift policy with direction-aware hysteresis
//! - [`Autoscroller`] - Periodic edge scrolling with accelerating steps
//!
//! # Role in sortlist
//! `sortlist` sits on top of `sortlist-core`, which provides geometry,
//! pointer events, the measurement gate, and the per-row gesture machine.
//!
//! # Time
//! Nothing here reads a clock. Every call that can fire a timer takes a
//! `web_time::Instant`, and [`SortableList::tick`] should be called at least
//! every autoscroll interval while a row is dragged.

pub mod autoscroll;
pub mod config;
pub mod list;
pub mod reorder;

pub use autoscroll::{AutoscrollChange, Autoscroller, ScrollBounds};
pub use config::{AutoscrollConfig, ListConfig, ListConfigError};
pub use list::{DragSession, ListEvent, Placement, SortableList, ZHint};
pub use reorder::{Direction, Reorder, ReorderKind, Reorderer};

pub use sortlist_core::event::{PointerEvent, PointerEventKind, TargetId};
pub use sortlist_core::geometry::{Axis, Point, Rect, Size};
