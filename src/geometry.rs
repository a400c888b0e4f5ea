//! Integer geometry used by surfaces, displays and hit testing
//!
//! Everything is in compositor (scene) coordinates. Sizes are signed so that
//! deltas and frame padding can be added without casts; a surface is never
//! given a negative size (see [`Size::clamped`]).

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A position in scene coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Difference between two points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Displacement {
    pub dx: i32,
    pub dy: i32,
}

impl Displacement {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn length_squared(&self) -> i64 {
        let dx = self.dx as i64;
        let dy = self.dy as i64;
        dx * dx + dy * dy
    }
}

impl Add<Displacement> for Point {
    type Output = Point;

    fn add(self, d: Displacement) -> Point {
        Point::new(self.x.saturating_add(d.dx), self.y.saturating_add(d.dy))
    }
}

impl Sub<Displacement> for Point {
    type Output = Point;

    fn sub(self, d: Displacement) -> Point {
        Point::new(self.x.saturating_sub(d.dx), self.y.saturating_sub(d.dy))
    }
}

impl Sub for Point {
    type Output = Displacement;

    fn sub(self, other: Point) -> Displacement {
        Displacement::new(self.x.saturating_sub(other.x), self.y.saturating_sub(other.y))
    }
}

/// Width and height of a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Same size with negative components raised to zero
    pub fn clamped(self) -> Self {
        Self::new(self.width.max(0), self.height.max(0))
    }

    pub fn as_displacement(&self) -> Displacement {
        Displacement::new(self.width, self.height)
    }
}

/// Axis-aligned rectangle (top-left + size)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub top_left: Point,
    pub size: Size,
}

impl Rectangle {
    pub const fn new(top_left: Point, size: Size) -> Self {
        Self { top_left, size }
    }

    pub fn from_loc_and_size((x, y): (i32, i32), (width, height): (i32, i32)) -> Self {
        Self::new(Point::new(x, y), Size::new(width, height))
    }

    pub fn left(&self) -> i32 {
        self.top_left.x
    }

    pub fn top(&self) -> i32 {
        self.top_left.y
    }

    /// Exclusive right edge
    pub fn right(&self) -> i32 {
        self.top_left.x + self.size.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i32 {
        self.top_left.y + self.size.height
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.right(), self.top())
    }

    pub fn bottom_left(&self) -> Point {
        Point::new(self.left(), self.bottom())
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    pub fn is_empty(&self) -> bool {
        self.size.width <= 0 || self.size.height <= 0
    }

    pub fn contains(&self, point: Point) -> bool {
        !self.is_empty()
            && point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// Whether `other` lies entirely inside this rectangle
    pub fn contains_rect(&self, other: &Rectangle) -> bool {
        other.left() >= self.left()
            && other.top() >= self.top()
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn overlaps(&self, other: &Rectangle) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Smallest rectangle containing every rectangle in `rects`
    pub fn bounding<'a>(rects: impl IntoIterator<Item = &'a Rectangle>) -> Option<Rectangle> {
        let mut iter = rects.into_iter();
        let first = *iter.next()?;
        let (mut left, mut top, mut right, mut bottom) =
            (first.left(), first.top(), first.right(), first.bottom());
        for rect in iter {
            left = left.min(rect.left());
            top = top.min(rect.top());
            right = right.max(rect.right());
            bottom = bottom.max(rect.bottom());
        }
        Some(Rectangle::from_loc_and_size((left, top), (right - left, bottom - top)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_uses_exclusive_edges() {
        let rect = Rectangle::from_loc_and_size((10, 10), (100, 50));
        assert!(rect.contains(Point::new(10, 10)));
        assert!(rect.contains(Point::new(109, 59)));
        assert!(!rect.contains(Point::new(110, 30)));
        assert!(!rect.contains(Point::new(50, 60)));
    }

    #[test]
    fn test_empty_rectangle_contains_nothing() {
        let rect = Rectangle::from_loc_and_size((0, 0), (0, 10));
        assert!(rect.is_empty());
        assert!(!rect.contains(Point::new(0, 0)));
    }

    #[test]
    fn test_overlaps() {
        let a = Rectangle::from_loc_and_size((0, 0), (100, 100));
        let b = Rectangle::from_loc_and_size((50, 50), (100, 100));
        let c = Rectangle::from_loc_and_size((100, 0), (10, 10));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_bounding_rectangle() {
        let displays = [
            Rectangle::from_loc_and_size((0, 0), (1920, 1080)),
            Rectangle::from_loc_and_size((1920, 0), (1280, 1024)),
        ];
        let bounds = Rectangle::bounding(&displays).unwrap();
        assert_eq!(bounds, Rectangle::from_loc_and_size((0, 0), (3200, 1080)));
        assert_eq!(Rectangle::bounding(&[] as &[Rectangle]), None);
    }

    #[test]
    fn test_point_arithmetic() {
        let p = Point::new(5, 7);
        let d = Point::new(8, 3) - p;
        assert_eq!(d, Displacement::new(3, -4));
        assert_eq!(p + d, Point::new(8, 3));
        assert_eq!(d.length_squared(), 25);
    }
}
