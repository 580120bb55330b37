#![allow(missing_docs)]

//! Container-space geometry used for hit-testing.
//!
//! Coordinates are relative to the tile pool container, with `x` growing to
//! the right and `y` growing downwards.

use serde::{Deserialize, Serialize};

/// A point in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box described by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Normalize two arbitrary corners into a box with non-negative extent.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    /// Box of the given size centered on `center`.
    pub fn centered(center: Point, width: f32, height: f32) -> Self {
        Self {
            left: center.x - width / 2.0,
            top: center.y - height / 2.0,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// True unless one box lies strictly beyond the other on some axis.
    /// Touching edges count as overlap.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.left > other.right()
            || self.right() < other.left
            || self.top > other.bottom()
            || self.bottom() < other.top)
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_normalize_in_any_drag_direction() {
        let expected = BoundingBox::new(2.0, 3.0, 8.0, 4.0);
        let a = Point::new(2.0, 3.0);
        let b = Point::new(10.0, 7.0);
        assert_eq!(BoundingBox::from_corners(a, b), expected);
        assert_eq!(BoundingBox::from_corners(b, a), expected);
        assert_eq!(
            BoundingBox::from_corners(Point::new(2.0, 7.0), Point::new(10.0, 3.0)),
            expected
        );
    }

    #[test]
    fn touching_edges_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
        let right = BoundingBox::new(4.0, 0.0, 4.0, 4.0);
        let below = BoundingBox::new(0.0, 4.0, 4.0, 4.0);
        assert!(a.intersects(&right));
        assert!(a.intersects(&below));
        assert!(right.intersects(&a));
    }

    #[test]
    fn separated_boxes_are_disjoint() {
        let a = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
        assert!(!a.intersects(&BoundingBox::new(4.5, 0.0, 1.0, 1.0)));
        assert!(!a.intersects(&BoundingBox::new(0.0, -3.0, 1.0, 2.5)));
        // overlapping on one axis only
        assert!(!a.intersects(&BoundingBox::new(1.0, 10.0, 1.0, 1.0)));
    }

    #[test]
    fn degenerate_box_still_hits() {
        let tile = BoundingBox::new(1.0, 1.0, 2.0, 2.0);
        let click = BoundingBox::from_corners(Point::new(2.0, 2.0), Point::new(2.0, 2.0));
        assert!(tile.intersects(&click));
        assert!(tile.contains(Point::new(3.0, 3.0)));
        assert!(!tile.contains(Point::new(3.1, 3.0)));
    }
}
