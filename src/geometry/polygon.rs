use geo_traits::{CoordTrait, LineStringTrait, PolygonTrait};

use crate::error::{GeoRTreeError, Result};
use crate::geometry::{Point, Rectangle};

/// A simple polygon with optional holes, validated on construction.
///
/// Rings may be given open or closed; a trailing vertex equal to the first one is dropped.
/// Construction fails with [`GeoRTreeError::InvalidPolygon`] when a ring has fewer than three
/// distinct vertices, has zero area, or crosses itself, and with
/// [`GeoRTreeError::InvalidGeometry`] when a vertex is not finite.
///
/// Holes are validated as rings but are not checked for lying inside the exterior.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    exterior: Vec<Point>,
    interiors: Vec<Vec<Point>>,
    bounds: Rectangle,
}

/// Where a point lies relative to a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Inside,
    Boundary,
    Outside,
}

impl Polygon {
    /// Create a polygon without holes.
    ///
    /// ```
    /// use geo_rtree::{Point, Polygon};
    ///
    /// let square = Polygon::new(vec![
    ///     Point::new(0., 0.),
    ///     Point::new(4., 0.),
    ///     Point::new(4., 4.),
    ///     Point::new(0., 4.),
    /// ])
    /// .unwrap();
    /// assert!(square.contains_point(&Point::new(2., 2.)));
    /// assert!(square.contains_point(&Point::new(4., 2.)));
    /// assert!(!square.contains_point(&Point::new(5., 2.)));
    /// ```
    pub fn new(exterior: Vec<Point>) -> Result<Self> {
        Self::with_holes(exterior, vec![])
    }

    /// Create a polygon with interior rings (holes).
    pub fn with_holes(exterior: Vec<Point>, interiors: Vec<Vec<Point>>) -> Result<Self> {
        let exterior = validate_ring(exterior, "exterior")?;
        let interiors = interiors
            .into_iter()
            .map(|ring| validate_ring(ring, "interior"))
            .collect::<Result<Vec<_>>>()?;

        let bounds = Rectangle::bounding(&exterior)?.ok_or_else(|| {
            GeoRTreeError::InvalidPolygon("Polygon exterior is empty".to_string())
        })?;

        Ok(Self {
            exterior,
            interiors,
            bounds,
        })
    }

    /// Create a polygon from any [`PolygonTrait`] implementation.
    pub fn from_polygon(polygon: &impl PolygonTrait<T = f64>) -> Result<Self> {
        let exterior = polygon
            .exterior()
            .map(|ring| ring_points(&ring))
            .unwrap_or_default();
        let interiors = polygon.interiors().map(|ring| ring_points(&ring)).collect();
        Self::with_holes(exterior, interiors)
    }

    /// The exterior ring, without a repeated closing vertex.
    pub fn exterior(&self) -> &[Point] {
        &self.exterior
    }

    pub fn interiors(&self) -> &[Vec<Point>] {
        &self.interiors
    }

    /// The bounding rectangle of the exterior ring.
    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    /// Returns `true` if `point` lies inside the polygon or on its boundary.
    pub fn contains_point(&self, point: &Point) -> bool {
        if !self.bounds.contains_point(point) {
            return false;
        }
        match locate(&self.exterior, point) {
            Location::Outside => false,
            Location::Boundary => true,
            // The boundary of a hole still belongs to the polygon.
            Location::Inside => !self
                .interiors
                .iter()
                .any(|hole| locate(hole, point) == Location::Inside),
        }
    }

    /// Returns `true` if `rect` shares at least one point with the polygon.
    ///
    /// For a zero-area rectangle this is the same as [`Polygon::contains_point`].
    pub fn intersects_rect(&self, rect: &Rectangle) -> bool {
        if !self.bounds.intersects(rect) {
            return false;
        }
        if rect.is_point() {
            return self.contains_point(&rect.center());
        }

        let corners = rect.corners();
        if corners.iter().any(|corner| self.contains_point(corner)) {
            return true;
        }
        if self.exterior.iter().any(|v| rect.contains_point(v)) {
            return true;
        }

        let rect_edges = edges(&corners);
        self.rings().any(|ring| {
            edges(ring)
                .any(|(a, b)| rect_edges.clone().any(|(c, d)| segments_intersect(a, b, c, d)))
        })
    }

    fn rings(&self) -> impl Iterator<Item = &[Point]> {
        std::iter::once(self.exterior.as_slice()).chain(self.interiors.iter().map(Vec::as_slice))
    }
}

fn ring_points(ring: &impl LineStringTrait<T = f64>) -> Vec<Point> {
    ring.coords().map(|c| Point::new(c.x(), c.y())).collect()
}

/// Normalize a ring and reject it if it cannot bound an area.
fn validate_ring(mut ring: Vec<Point>, label: &str) -> Result<Vec<Point>> {
    if let Some(bad) = ring.iter().find(|p| !p.is_finite()) {
        return Err(GeoRTreeError::InvalidGeometry(format!(
            "Polygon {} vertex is not finite: ({}, {})",
            label,
            bad.x(),
            bad.y()
        )));
    }

    ring.dedup();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }

    if ring.len() < 3 {
        return Err(GeoRTreeError::InvalidPolygon(format!(
            "Polygon {} ring needs at least 3 distinct vertices, got {}",
            label,
            ring.len()
        )));
    }

    if signed_area(&ring) == 0.0 {
        return Err(GeoRTreeError::InvalidPolygon(format!(
            "Polygon {} ring has zero area",
            label
        )));
    }

    let n = ring.len();
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        for j in (i + 1)..n {
            // adjacent edges share a vertex
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let (c, d) = (ring[j], ring[(j + 1) % n]);
            if segments_intersect(a, b, c, d) {
                return Err(GeoRTreeError::InvalidPolygon(format!(
                    "Polygon {} ring is self-intersecting between edges {} and {}",
                    label, i, j
                )));
            }
        }
    }

    Ok(ring)
}

/// Closed edges of a ring, including the one from the last vertex back to the first.
fn edges(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + Clone + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
}

/// Shoelace formula.
fn signed_area(ring: &[Point]) -> f64 {
    edges(ring)
        .map(|(a, b)| a.x() * b.y() - b.x() * a.y())
        .sum::<f64>()
        / 2.0
}

/// Ray casting with an explicit boundary check.
fn locate(ring: &[Point], point: &Point) -> Location {
    let mut inside = false;
    for (a, b) in edges(ring) {
        if on_segment(a, b, *point) {
            return Location::Boundary;
        }
        if (a.y() > point.y()) != (b.y() > point.y()) {
            let x_cross = a.x() + (point.y() - a.y()) * (b.x() - a.x()) / (b.y() - a.y());
            if point.x() < x_cross {
                inside = !inside;
            }
        }
    }
    if inside {
        Location::Inside
    } else {
        Location::Outside
    }
}

#[inline]
fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x() - o.x()) * (b.y() - o.y()) - (a.y() - o.y()) * (b.x() - o.x())
}

/// `p` is on the closed segment `a-b`.
#[inline]
fn on_segment(a: Point, b: Point, p: Point) -> bool {
    cross(a, b, p) == 0.0
        && p.x() >= a.x().min(b.x())
        && p.x() <= a.x().max(b.x())
        && p.y() >= a.y().min(b.y())
        && p.y() <= a.y().max(b.y())
}

/// Closed segment intersection, collinear overlaps included.
fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    on_segment(c, d, a) || on_segment(c, d, b) || on_segment(a, b, c) || on_segment(a, b, d)
}
