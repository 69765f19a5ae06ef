//! Geometry primitives for column layout
//!
//! All values are CSS pixels stored as `f32`. Logical rectangles (inline
//! axis along `x`, block axis along `y`) are converted to physical ones with
//! [`Rect::transposed`] for vertical writing modes.

use std::ops::{Add, Neg, Sub};

/// A point in physical or logical space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Swap the axes
    pub fn transposed(&self) -> Point {
        Point::new(self.y, self.x)
    }
}

/// A translation between two coordinate spaces
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutSize {
    pub width: f32,
    pub height: f32,
}

impl LayoutSize {
    /// Create a new size
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Swap the axes
    pub fn transposed(&self) -> LayoutSize {
        LayoutSize::new(self.height, self.width)
    }
}

impl Add<LayoutSize> for Point {
    type Output = Point;

    fn add(self, rhs: LayoutSize) -> Point {
        Point::new(self.x + rhs.width, self.y + rhs.height)
    }
}

impl Sub<LayoutSize> for Point {
    type Output = Point;

    fn sub(self, rhs: LayoutSize) -> Point {
        Point::new(self.x - rhs.width, self.y - rhs.height)
    }
}

impl Sub for Point {
    type Output = LayoutSize;

    fn sub(self, rhs: Point) -> LayoutSize {
        LayoutSize::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add for LayoutSize {
    type Output = LayoutSize;

    fn add(self, rhs: LayoutSize) -> LayoutSize {
        LayoutSize::new(self.width + rhs.width, self.height + rhs.height)
    }
}

impl Neg for LayoutSize {
    type Output = LayoutSize;

    fn neg(self) -> LayoutSize {
        LayoutSize::new(-self.width, -self.height)
    }
}

/// Rectangle representing a column box or flow portion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create an empty rectangle
    pub fn empty() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Check if rectangle is empty
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Top-left corner
    pub fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// Check if rectangles intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.max_x()
            && self.max_x() > other.x
            && self.y < other.max_y()
            && self.max_y() > other.y
    }

    /// Inclusive containment, so points on the far edges count as inside
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.max_x()
            && point.y >= self.y
            && point.y <= self.max_y()
    }

    /// Union of two rectangles
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.max_x().max(other.max_x());
        let bottom = self.max_y().max(other.max_y());

        Rect::new(x, y, right - x, bottom - y)
    }

    /// Translate by an offset
    pub fn moved_by(&self, offset: LayoutSize) -> Rect {
        Rect::new(
            self.x + offset.width,
            self.y + offset.height,
            self.width,
            self.height,
        )
    }

    /// Swap the axes, turning a logical rectangle into a vertical-mode physical one
    pub fn transposed(&self) -> Rect {
        Rect::new(self.y, self.x, self.height, self.width)
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_intersects() {
        let r1 = Rect::new(0.0, 0.0, 100.0, 100.0);
        let r2 = Rect::new(50.0, 50.0, 100.0, 100.0);
        let r3 = Rect::new(200.0, 200.0, 50.0, 50.0);

        assert!(r1.intersects(&r2));
        assert!(!r1.intersects(&r3));
    }

    #[test]
    fn test_rect_union() {
        let r1 = Rect::new(0.0, 0.0, 50.0, 50.0);
        let r2 = Rect::new(25.0, 25.0, 50.0, 50.0);
        let union = r1.union(&r2);

        assert_eq!(union, Rect::new(0.0, 0.0, 75.0, 75.0));
        assert_eq!(Rect::empty().union(&r2), r2);
    }

    #[test]
    fn test_rect_contains_edges() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(rect.contains(Point::new(30.0, 30.0)));
        assert!(!rect.contains(Point::new(30.5, 30.0)));
    }

    #[test]
    fn test_rect_transposed() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(rect.transposed(), Rect::new(2.0, 1.0, 4.0, 3.0));
        assert_eq!(rect.transposed().transposed(), rect);
    }

    #[test]
    fn test_point_arithmetic() {
        let p = Point::new(10.0, 20.0);
        let offset = LayoutSize::new(5.0, -5.0);
        assert_eq!(p + offset, Point::new(15.0, 15.0));
        assert_eq!((p + offset) - p, offset);
        assert_eq!(p - offset, Point::new(5.0, 25.0));
        assert_eq!(-offset, LayoutSize::new(-5.0, 5.0));
    }
}
