use geo_traits::CoordTrait;

use crate::error::{GeoRTreeError, Result};

/// A two-dimensional coordinate, `x` being longitude and `y` latitude for geographic data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Create a new point. No validation is performed; use [`Point::geographic`] for
    /// longitude/latitude input coming from outside the process.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Create a point from a longitude/latitude pair, rejecting non-finite values and values
    /// outside `[-180, 180] x [-90, 90]`.
    ///
    /// ```
    /// use geo_rtree::Point;
    ///
    /// assert!(Point::geographic(-74.006, 40.7128).is_ok());
    /// assert!(Point::geographic(200.0, 40.0).is_err());
    /// ```
    pub fn geographic(lon: f64, lat: f64) -> Result<Self> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(GeoRTreeError::InvalidGeometry(format!(
                "Coordinates must be finite, got ({}, {})",
                lon, lat
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(GeoRTreeError::InvalidGeometry(format!(
                "Longitude out of range [-180.0, 180.0]: {}",
                lon
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeoRTreeError::InvalidGeometry(format!(
                "Latitude out of range [-90.0, 90.0]: {}",
                lat
            )));
        }
        Ok(Self::new(lon, lat))
    }

    /// Create a point from any [`CoordTrait`] implementation.
    pub fn from_coord(coord: &impl CoordTrait<T = f64>) -> Self {
        Self::new(coord.x(), coord.y())
    }

    /// The `x` (longitude) value.
    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// The `y` (latitude) value.
    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    #[inline]
    pub(crate) fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Convert a distance in kilometres into an approximate distance in degrees at the given
/// latitude.
///
/// One degree of latitude is roughly 111.32 km everywhere, while a degree of longitude shrinks
/// with `cos(latitude)`. The average of both is used, which is good enough to size search
/// regions; the exact check is always done in coordinate space afterwards.
pub fn km_to_degrees(km: f64, latitude: f64) -> f64 {
    let km_per_degree_lat = 111.32;
    let km_per_degree_lon = 111.32 * latitude.to_radians().cos();

    let avg_km_per_degree = (km_per_degree_lat + km_per_degree_lon) / 2.0;
    if avg_km_per_degree > 0.0 {
        km / avg_km_per_degree
    } else {
        km / km_per_degree_lat
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(Point::geographic(-180.0, 90.0).is_ok());
        assert!(matches!(
            Point::geographic(0.0, 91.0),
            Err(GeoRTreeError::InvalidGeometry(_))
        ));
        assert!(matches!(
            Point::geographic(f64::NAN, 0.0),
            Err(GeoRTreeError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn distance_between_points() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
    }

    #[test]
    fn km_to_degrees_at_equator() {
        let deg = km_to_degrees(111.32, 0.0);
        assert!((deg - 1.0).abs() < 1e-9);

        // Longitude degrees shrink away from the equator, so the same distance spans more.
        assert!(km_to_degrees(10.0, 60.0) > km_to_degrees(10.0, 0.0));
    }
}
