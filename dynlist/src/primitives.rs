//! Core geometry types for dynlist.
//!
//! Everything is in local layout units (f32). `PanelGeometry::scale` converts
//! screen-space pointer deltas into those units.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A point in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// A 2D size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl From<(f32, f32)> for Size {
    fn from((width, height): (f32, f32)) -> Self {
        Self { width, height }
    }
}

/// A rectangle in panel-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    /// Check if a point is inside this rectangle.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Direction the list scrolls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// A 2D vector split into scroll-axis and line-axis components.
///
/// For a vertical list the scroll axis is Y and the line axis is X; a
/// horizontal list swaps them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableViewDimensions {
    pub orientation: Orientation,
    pub scroll_axis: f32,
    pub line_axis: f32,
}

impl TableViewDimensions {
    pub const fn zero(orientation: Orientation) -> Self {
        Self {
            orientation,
            scroll_axis: 0.0,
            line_axis: 0.0,
        }
    }

    pub fn from_size(orientation: Orientation, size: Size) -> Self {
        match orientation {
            Orientation::Vertical => Self {
                orientation,
                scroll_axis: size.height,
                line_axis: size.width,
            },
            Orientation::Horizontal => Self {
                orientation,
                scroll_axis: size.width,
                line_axis: size.height,
            },
        }
    }

    pub fn from_point(orientation: Orientation, point: Point) -> Self {
        Self::from_size(orientation, Size::new(point.x, point.y))
    }

    pub fn to_point(self) -> Point {
        match self.orientation {
            Orientation::Vertical => Point::new(self.line_axis, self.scroll_axis),
            Orientation::Horizontal => Point::new(self.scroll_axis, self.line_axis),
        }
    }

    pub fn to_size(self) -> Size {
        let p = self.to_point();
        Size::new(p.x, p.y)
    }
}

/// Geometry allotted to the list panel for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelGeometry {
    /// Absolute position of the panel's top-left corner.
    pub position: Point,
    /// Local size of the panel.
    pub size: Size,
    /// Accumulated layout scale (screen units per local unit).
    pub scale: f32,
}

impl PanelGeometry {
    pub const fn new(position: Point, size: Size, scale: f32) -> Self {
        Self { position, size, scale }
    }

    /// Geometry at the origin with unit scale.
    pub const fn sized(width: f32, height: f32) -> Self {
        Self::new(Point::ORIGIN, Size::new(width, height), 1.0)
    }

    pub fn dimensions(&self, orientation: Orientation) -> TableViewDimensions {
        TableViewDimensions::from_size(orientation, self.size)
    }

    /// Viewport length along the scroll axis.
    pub fn viewport_length(&self, orientation: Orientation) -> f32 {
        self.dimensions(orientation).scroll_axis
    }

    /// Convert an absolute position into panel-local coordinates.
    pub fn absolute_to_local(&self, point: Point) -> Point {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        let local = point - self.position;
        Point::new(local.x / scale, local.y / scale)
    }

    /// Check if an absolute position lies under this geometry.
    pub fn is_under_location(&self, point: Point) -> bool {
        Rect::from_origin_size(Point::ORIGIN, self.size).contains(self.absolute_to_local(point))
    }
}

impl Default for PanelGeometry {
    fn default() -> Self {
        Self::new(Point::ORIGIN, Size::ZERO, 1.0)
    }
}
