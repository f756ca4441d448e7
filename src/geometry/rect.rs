use geo_traits::{CoordTrait, RectTrait};

use crate::error::{GeoRTreeError, Result};
use crate::geometry::Point;

/// An axis-aligned rectangle. Used both for query regions and for the minimum bounding
/// rectangle (MBR) of entries and subtrees.
///
/// A `Rectangle` always satisfies `min <= max` on both axes and has finite coordinates; the
/// checks happen once at construction so that tree traversal never has to deal with malformed
/// input.
///
/// All predicates treat the boundary as part of the rectangle: two rectangles that only touch
/// still intersect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Rectangle {
    /// Create a new rectangle, failing with [`GeoRTreeError::InvalidGeometry`] if a coordinate
    /// is not finite or `min > max` on either axis.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return Err(GeoRTreeError::InvalidGeometry(format!(
                "Rectangle coordinates must be finite, got ({}, {}, {}, {})",
                min_x, min_y, max_x, max_y
            )));
        }
        if min_x > max_x || min_y > max_y {
            return Err(GeoRTreeError::InvalidGeometry(format!(
                "Rectangle min must not exceed max, got ({}, {}, {}, {})",
                min_x, min_y, max_x, max_y
            )));
        }
        Ok(Self::new_unchecked(min_x, min_y, max_x, max_y))
    }

    /// The zero-area rectangle of a single point.
    pub fn from_point(point: Point) -> Result<Self> {
        Self::new(point.x(), point.y(), point.x(), point.y())
    }

    /// Create a rectangle from any [`RectTrait`] implementation.
    pub fn from_rect(rect: &impl RectTrait<T = f64>) -> Result<Self> {
        Self::new(
            rect.min().x(),
            rect.min().y(),
            rect.max().x(),
            rect.max().y(),
        )
    }

    /// The smallest rectangle enclosing all the given points, or `None` if there are none.
    pub fn bounding<'a>(points: impl IntoIterator<Item = &'a Point>) -> Result<Option<Self>> {
        let mut out: Option<Self> = None;
        for point in points {
            let rect = Self::from_point(*point)?;
            out = Some(match out {
                Some(acc) => acc.union(&rect),
                None => rect,
            });
        }
        Ok(out)
    }

    /// Only call with values derived from other valid rectangles.
    #[inline]
    pub(crate) const fn new_unchecked(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Get the minimum `x` value of this rectangle.
    #[inline]
    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    /// Get the minimum `y` value of this rectangle.
    #[inline]
    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    /// Get the maximum `x` value of this rectangle.
    #[inline]
    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    /// Get the maximum `y` value of this rectangle.
    #[inline]
    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Returns `true` if this rectangle has zero extent on both axes.
    #[inline]
    pub fn is_point(&self) -> bool {
        self.min_x == self.max_x && self.min_y == self.max_y
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns `true` if the two rectangles share at least one point.
    #[inline]
    pub fn intersects(&self, other: &Rectangle) -> bool {
        if self.max_x < other.min_x {
            return false;
        }
        if self.max_y < other.min_y {
            return false;
        }
        if self.min_x > other.max_x {
            return false;
        }
        if self.min_y > other.max_y {
            return false;
        }
        true
    }

    /// Returns `true` if `other` lies entirely within this rectangle.
    #[inline]
    pub fn contains(&self, other: &Rectangle) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    #[inline]
    pub fn contains_point(&self, point: &Point) -> bool {
        point.x() >= self.min_x
            && point.x() <= self.max_x
            && point.y() >= self.min_y
            && point.y() <= self.max_y
    }

    /// The smallest rectangle covering both inputs.
    #[inline]
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        Self::new_unchecked(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// The area this rectangle would have to grow by to cover `other`.
    #[inline]
    pub fn enlargement(&self, other: &Rectangle) -> f64 {
        self.union(other).area() - self.area()
    }

    /// Euclidean distance from `point` to the nearest point on or in this rectangle. Zero if
    /// the point is inside.
    #[inline]
    pub fn distance(&self, point: &Point) -> f64 {
        let dx = axis_dist(point.x(), self.min_x, self.max_x);
        let dy = axis_dist(point.y(), self.min_y, self.max_y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Euclidean distance between the centers of two rectangles.
    #[inline]
    pub fn center_distance(&self, other: &Rectangle) -> f64 {
        self.center().distance(&other.center())
    }

    /// Grow this rectangle by `distance` on every side.
    pub fn inflate(&self, distance: f64) -> Result<Rectangle> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(GeoRTreeError::InvalidGeometry(format!(
                "Inflation distance must be finite and non-negative, got {}",
                distance
            )));
        }
        Self::new(
            self.min_x - distance,
            self.min_y - distance,
            self.max_x + distance,
            self.max_y + distance,
        )
    }

    /// The four corners, counter-clockwise from `(min_x, min_y)`.
    pub(crate) fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}

/// 1D distance from a value to a range.
#[inline]
fn axis_dist(k: f64, min: f64, max: f64) -> f64 {
    if k < min {
        min - k
    } else if k <= max {
        0.0
    } else {
        k - max
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Rectangle {
        Rectangle::new(min_x, min_y, max_x, max_y).unwrap()
    }

    #[test]
    fn rejects_malformed_rectangles() {
        assert!(matches!(
            Rectangle::new(1.0, 0.0, 0.0, 1.0),
            Err(GeoRTreeError::InvalidGeometry(_))
        ));
        assert!(matches!(
            Rectangle::new(0.0, 0.0, f64::INFINITY, 1.0),
            Err(GeoRTreeError::InvalidGeometry(_))
        ));
        assert!(Rectangle::from_point(Point::new(f64::NAN, 0.0)).is_err());
    }

    #[test]
    fn touching_rectangles_intersect() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(1.0, 1.0, 2.0, 2.0);
        let c = rect(1.5, 0.0, 2.0, 0.5);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn containment_includes_boundary() {
        let outer = rect(0.0, 0.0, 10.0, 10.0);
        assert!(outer.contains(&rect(0.0, 0.0, 10.0, 10.0)));
        assert!(outer.contains(&rect(2.0, 2.0, 3.0, 3.0)));
        assert!(!outer.contains(&rect(2.0, 2.0, 11.0, 3.0)));
        assert!(outer.contains_point(&Point::new(10.0, 0.0)));
    }

    #[test]
    fn enlargement_and_union() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(3.0, 0.0, 4.0, 1.0);
        assert_eq!(a.union(&b), rect(0.0, 0.0, 4.0, 2.0));
        assert_eq!(a.enlargement(&b), 4.0);
        assert_eq!(a.enlargement(&rect(1.0, 1.0, 1.5, 1.5)), 0.0);
    }

    #[test]
    fn point_to_rectangle_distance() {
        let r = rect(0.0, 0.0, 2.0, 2.0);
        assert_eq!(r.distance(&Point::new(1.0, 1.0)), 0.0);
        assert_eq!(r.distance(&Point::new(2.0, 2.0)), 0.0);
        assert_eq!(r.distance(&Point::new(5.0, 1.0)), 3.0);
        assert_eq!(r.distance(&Point::new(5.0, 6.0)), 5.0);
    }

    #[test]
    fn center_distance() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(3.0, 4.0, 5.0, 6.0);
        assert_eq!(a.center_distance(&b), 5.0);
    }

    #[test]
    fn inflate() {
        let r = Rectangle::from_point(Point::new(1.0, 1.0)).unwrap();
        assert_eq!(r.inflate(0.5).unwrap(), rect(0.5, 0.5, 1.5, 1.5));
        assert!(r.inflate(-1.0).is_err());
    }

    #[test]
    fn bounding_points() {
        let points = [Point::new(1.0, 5.0), Point::new(-2.0, 3.0), Point::new(4.0, -1.0)];
        let bounds = Rectangle::bounding(&points).unwrap();
        assert_eq!(bounds, Some(rect(-2.0, -1.0, 4.0, 5.0)));
        assert_eq!(Rectangle::bounding(&Vec::<Point>::new()).unwrap(), None);
    }

    #[test]
    fn from_geo_rect() {
        let geo_rect = geo_0_31::Rect::new(
            geo_0_31::coord! { x: 3.0, y: 4.0 },
            geo_0_31::coord! { x: 1.0, y: 2.0 },
        );
        assert_eq!(
            Rectangle::from_rect(&geo_rect).unwrap(),
            rect(1.0, 2.0, 3.0, 4.0)
        );
    }
}
