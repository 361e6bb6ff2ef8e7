#![forbid(unsafe_code)]

//! Core: geometry, pointer events, measurement gating, and row gestures.
//!
//! # Role in sortlist
//! `sortlist-core` is the input and measurement layer of the drag-to-reorder
//! engine. It knows nothing about ordering policy or scrolling; the
//! `sortlist` crate composes these pieces into a list.
//!
//! # Primary responsibilities
//! - **Geometry**: [`geometry::Axis`] projection of points and sizes.
//! - **GeometryRegistry**: measured sizes, derived positions and swap zones,
//!   and the "all measured" gate with a generation id.
//! - **RowGesture**: the per-row long-press/drag state machine.
//! - **PointerEvent**: raw pointer input as the host reports it.

pub mod event;
pub mod geometry;
pub mod gesture;
pub mod latch;
pub mod logging;
pub mod registry;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, error, info, trace, trace_span, warn};
