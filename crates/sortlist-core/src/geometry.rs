#![forbid(unsafe_code)]

//! Geometric primitives in logical pixels.
//!
//! Everything here is `f32`: the host view system reports fractional layouts
//! and the engine never rounds. The [`Axis`] type projects points and sizes
//! onto the list's primary axis so that the rest of the engine can be written
//! once for vertical and horizontal lists.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The single axis along which rows are ordered and dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

impl Axis {
    /// Component of `point` along this axis.
    #[inline]
    #[must_use]
    pub const fn main(self, point: Point) -> f32 {
        match self {
            Self::Vertical => point.y,
            Self::Horizontal => point.x,
        }
    }

    /// Extent of `size` along this axis.
    #[inline]
    #[must_use]
    pub const fn extent(self, size: Size) -> f32 {
        match self {
            Self::Vertical => size.height,
            Self::Horizontal => size.width,
        }
    }

    /// Extent of `size` across this axis.
    #[inline]
    #[must_use]
    pub const fn cross_extent(self, size: Size) -> f32 {
        match self {
            Self::Vertical => size.width,
            Self::Horizontal => size.height,
        }
    }

    /// A point lying on this axis at distance `main` from the origin.
    #[inline]
    #[must_use]
    pub const fn point(self, main: f32) -> Point {
        match self {
            Self::Vertical => Point::new(0.0, main),
            Self::Horizontal => Point::new(main, 0.0),
        }
    }

    /// Returns `point` moved by `delta` along this axis only.
    #[inline]
    #[must_use]
    pub const fn offset(self, point: Point, delta: f32) -> Point {
        match self {
            Self::Vertical => Point::new(point.x, point.y + delta),
            Self::Horizontal => Point::new(point.x + delta, point.y),
        }
    }
}

/// A 2D position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Measured size of a row, header, or footer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[inline]
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Check if the size has zero area.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Rectangle in page (absolute) coordinates, used for the viewport bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f32,
    /// Top edge (inclusive).
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Start of the rectangle along `axis`.
    #[inline]
    #[must_use]
    pub const fn start(&self, axis: Axis) -> f32 {
        axis.main(self.origin())
    }

    /// End (exclusive) of the rectangle along `axis`.
    #[inline]
    #[must_use]
    pub const fn end(&self, axis: Axis) -> f32 {
        self.start(axis) + axis.extent(self.size())
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// A closed interval `[start, end]` along the primary axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Span {
    pub start: f32,
    pub end: f32,
}

impl Span {
    #[inline]
    #[must_use]
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> f32 {
        (self.end - self.start).max(0.0)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.start && value <= self.end
    }
}
