//! Translates caller-facing search shapes (bounding boxes, polygons, proximity radii, k-NN
//! requests) into tree searches, then refines and post-filters the candidates.
//!
//! The tree only knows rectangles, so every query here runs in two phases: a coarse range
//! search over bounding rectangles, followed by an exact test against the original shape.

mod filter;

use std::collections::HashMap;

use log::warn;

use crate::error::Result;
use crate::geometry::{Point, Polygon, Rectangle};
use crate::rtree::{RTree, RecordId};

pub use filter::{
    AcceptAll, AttributeFilter, AttributeSource, RecordAttributes, RecordFilter, SourceFilter,
};

/// A point of interest, such as a school or a park.
#[derive(Debug, Clone, PartialEq)]
pub struct Amenity {
    pub location: Point,
    /// Free-form category, for example `"school"`. Compared case-insensitively.
    pub kind: String,
}

impl Amenity {
    pub fn new(location: Point, kind: impl Into<String>) -> Self {
        Self {
            location,
            kind: kind.into(),
        }
    }
}

/// Summary of the records falling inside one region, as produced by
/// [`QueryEngine::region_stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegionStats<K> {
    pub key: K,
    pub count: usize,
    /// Mean price over the records that have attributes, `None` if none do.
    pub average_price: Option<f64>,
    pub ids: Vec<RecordId>,
}

/// Read-only query façade over a borrowed [`RTree`].
///
/// Every method takes a [`RecordFilter`], applied after the spatial refinement. Pass
/// [`AcceptAll`] to keep everything.
///
/// ```
/// use geo_rtree::query::{AcceptAll, QueryEngine};
/// use geo_rtree::rtree::RTree;
/// use geo_rtree::{Point, Polygon};
///
/// let mut tree = RTree::default();
/// tree.insert_point(Point::new(1., 1.), 1).unwrap();
/// tree.insert_point(Point::new(3., 1.), 2).unwrap();
///
/// let triangle = Polygon::new(vec![
///     Point::new(0., 0.),
///     Point::new(2., 0.),
///     Point::new(0., 2.),
/// ])
/// .unwrap();
/// let engine = QueryEngine::new(&tree);
/// assert_eq!(engine.within_polygon(&triangle, &AcceptAll), vec![1]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    tree: &'a RTree,
}

impl<'a> QueryEngine<'a> {
    pub fn new(tree: &'a RTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'a RTree {
        self.tree
    }

    /// Records whose rectangle intersects `bbox`.
    pub fn within_bbox(&self, bbox: &Rectangle, filter: &impl RecordFilter) -> Vec<RecordId> {
        self.tree
            .range_search(bbox)
            .filter(|id| filter.accept(*id))
            .collect()
    }

    /// Records inside `polygon`, boundary included. A record stored as an extent matches when
    /// its rectangle intersects the polygon.
    pub fn within_polygon(&self, polygon: &Polygon, filter: &impl RecordFilter) -> Vec<RecordId> {
        self.tree
            .search(&polygon.bounds())
            .filter(|entry| polygon.intersects_rect(entry.rect()))
            .map(|entry| entry.id())
            .filter(|id| filter.accept(*id))
            .collect()
    }

    /// Build a polygon from raw vertices and search it. Fails with
    /// [`InvalidPolygon`][crate::GeoRTreeError::InvalidPolygon] or
    /// [`InvalidGeometry`][crate::GeoRTreeError::InvalidGeometry] if the ring is malformed.
    pub fn within_polygon_coords(
        &self,
        exterior: &[(f64, f64)],
        filter: &impl RecordFilter,
    ) -> Result<Vec<RecordId>> {
        let ring = exterior.iter().map(|&(x, y)| Point::new(x, y)).collect();
        let polygon = Polygon::new(ring).map_err(|err| {
            warn!("rejected polygon query: {}", err);
            err
        })?;
        Ok(self.within_polygon(&polygon, filter))
    }

    /// Records within `distance` of any of `points`, as `(id, distance)` pairs.
    ///
    /// Distance is measured from the point to the record's rectangle. A record near several
    /// points appears once, with its smallest distance. Results are ordered by distance, then
    /// id.
    pub fn within_distance_of(
        &self,
        points: &[Point],
        distance: f64,
        filter: &impl RecordFilter,
    ) -> Result<Vec<(RecordId, f64)>> {
        let mut best: HashMap<RecordId, f64> = HashMap::new();

        for point in points {
            let query = Rectangle::from_point(*point)?.inflate(distance)?;
            for entry in self.tree.search(&query) {
                let dist = entry.rect().distance(point);
                if dist > distance || !filter.accept(entry.id()) {
                    continue;
                }
                best.entry(entry.id())
                    .and_modify(|current| *current = current.min(dist))
                    .or_insert(dist);
            }
        }

        let mut results: Vec<(RecordId, f64)> = best.into_iter().collect();
        results.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        Ok(results)
    }

    /// Records within `distance` of any amenity of the given `kind`.
    pub fn near_amenities(
        &self,
        amenities: &[Amenity],
        kind: &str,
        distance: f64,
        filter: &impl RecordFilter,
    ) -> Result<Vec<(RecordId, f64)>> {
        let points: Vec<Point> = amenities
            .iter()
            .filter(|amenity| amenity.kind.eq_ignore_ascii_case(kind))
            .map(|amenity| amenity.location)
            .collect();
        self.within_distance_of(&points, distance, filter)
    }

    /// The `k` records nearest to `point`, filtered after ranking.
    ///
    /// The filter is applied to the `k` nearest records only, so fewer than `k` may come
    /// back; the search is not widened to make up for rejected records.
    pub fn nearest(
        &self,
        point: &Point,
        k: usize,
        max_distance: Option<f64>,
        filter: &impl RecordFilter,
    ) -> Vec<(RecordId, f64)> {
        self.tree
            .neighbors(point, Some(k), max_distance)
            .into_iter()
            .filter(|(id, _)| filter.accept(*id))
            .collect()
    }

    /// For each named region, the records inside it. A record may fall in several regions.
    pub fn group_by_region<K: Clone>(
        &self,
        regions: &[(K, Polygon)],
        filter: &impl RecordFilter,
    ) -> Vec<(K, Vec<RecordId>)> {
        regions
            .iter()
            .map(|(key, polygon)| (key.clone(), self.within_polygon(polygon, filter)))
            .collect()
    }

    /// Per-region record counts and mean price.
    pub fn region_stats<K: Clone, S: AttributeSource + ?Sized>(
        &self,
        regions: &[(K, Polygon)],
        source: &S,
    ) -> Vec<RegionStats<K>> {
        self.group_by_region(regions, &AcceptAll)
            .into_iter()
            .map(|(key, ids)| {
                let prices: Vec<f64> = ids
                    .iter()
                    .filter_map(|id| source.attributes(*id))
                    .map(|attributes| attributes.price)
                    .collect();
                let average_price = if prices.is_empty() {
                    None
                } else {
                    Some(prices.iter().sum::<f64>() / prices.len() as f64)
                };
                RegionStats {
                    key,
                    count: ids.len(),
                    average_price,
                    ids,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::error::GeoRTreeError;
    use crate::rtree::RTreeConfig;
    use crate::test::{init_logger, sorted};

    fn square(min: f64, max: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(min, min),
            Point::new(max, min),
            Point::new(max, max),
            Point::new(min, max),
        ])
        .unwrap()
    }

    /// A 10 x 10 grid of points with ids `x * 10 + y`.
    fn grid() -> RTree {
        let mut tree = RTree::new(RTreeConfig::new(4).unwrap());
        for x in 0..10u64 {
            for y in 0..10u64 {
                tree.insert_point(Point::new(x as f64, y as f64), x * 10 + y)
                    .unwrap();
            }
        }
        tree
    }

    fn listings() -> HashMap<RecordId, RecordAttributes> {
        (0..100)
            .map(|id| {
                let attributes = RecordAttributes {
                    price: (id * 1000) as f64,
                    bedrooms: (id % 5) as u32,
                    property_type: if id % 2 == 0 { "House" } else { "Condo" }.to_string(),
                };
                (id, attributes)
            })
            .collect()
    }

    #[test]
    fn bbox_with_filter() {
        let tree = grid();
        let engine = QueryEngine::new(&tree);
        let bbox = Rectangle::new(0., 0., 1., 1.).unwrap();
        assert_eq!(sorted(engine.within_bbox(&bbox, &AcceptAll)), vec![0, 1, 10, 11]);
        assert_eq!(
            sorted(engine.within_bbox(&bbox, &|id: RecordId| id > 5)),
            vec![10, 11]
        );
    }

    #[test]
    fn polygon_boundary_is_inclusive() {
        let tree = grid();
        let engine = QueryEngine::new(&tree);
        let found = sorted(engine.within_polygon(&square(2., 3.), &AcceptAll));
        assert_eq!(found, vec![22, 23, 32, 33]);

        // Triangle with the hypotenuse passing through grid points.
        let found = engine
            .within_polygon_coords(&[(0., 0.), (2., 0.), (0., 2.), (0., 0.)], &AcceptAll)
            .unwrap();
        assert_eq!(sorted(found), vec![0, 1, 2, 10, 11, 20]);
    }

    #[test]
    fn polygon_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(17);
        let points: Vec<Point> = (0..500)
            .map(|_| Point::new(rng.gen_range(0.0..100.), rng.gen_range(0.0..100.)))
            .collect();
        let mut tree = RTree::new(RTreeConfig::new(8).unwrap());
        for (id, point) in points.iter().enumerate() {
            tree.insert_point(*point, id as RecordId).unwrap();
        }
        let polygon = Polygon::new(vec![
            Point::new(10., 10.),
            Point::new(90., 20.),
            Point::new(50., 50.),
            Point::new(80., 90.),
            Point::new(5., 70.),
        ])
        .unwrap();

        let expected: Vec<RecordId> = points
            .iter()
            .enumerate()
            .filter(|(_, point)| polygon.contains_point(point))
            .map(|(id, _)| id as RecordId)
            .collect();
        let found = QueryEngine::new(&tree).within_polygon(&polygon, &AcceptAll);
        assert_eq!(sorted(found), expected);
    }

    #[test]
    fn extent_records_match_when_intersecting() {
        let mut tree = RTree::default();
        tree.insert(Rectangle::new(-5., -5., 0.5, 0.5).unwrap(), 1);
        tree.insert(Rectangle::new(5., 5., 6., 6.).unwrap(), 2);
        let found = QueryEngine::new(&tree).within_polygon(&square(0., 4.), &AcceptAll);
        assert_eq!(found, vec![1]);
    }

    #[test]
    fn invalid_polygon_is_rejected() {
        init_logger();
        let tree = grid();
        let engine = QueryEngine::new(&tree);
        let err = engine
            .within_polygon_coords(&[(0., 0.), (1., 1.)], &AcceptAll)
            .unwrap_err();
        assert!(matches!(err, GeoRTreeError::InvalidPolygon(_)));

        let bow_tie = [(0., 0.), (2., 2.), (2., 0.), (0., 2.)];
        assert!(engine.within_polygon_coords(&bow_tie, &AcceptAll).is_err());
    }

    #[test]
    fn proximity_keeps_minimum_distance() {
        let tree = grid();
        let engine = QueryEngine::new(&tree);
        let centers = [Point::new(0., 0.), Point::new(1.5, 0.)];
        let found = engine.within_distance_of(&centers, 1., &AcceptAll).unwrap();

        let lookup: HashMap<RecordId, f64> = found.iter().copied().collect();
        assert_eq!(lookup.len(), found.len());
        assert_eq!(sorted(lookup.keys().copied()), vec![0, 1, 10, 20]);
        assert_eq!(lookup[&0], 0.);
        assert_eq!(lookup[&10], 0.5);
        assert_eq!(lookup[&20], 0.5);
        assert_eq!(lookup[&1], 1.);
        for pair in found.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }

        assert!(matches!(
            engine.within_distance_of(&centers, -1., &AcceptAll),
            Err(GeoRTreeError::InvalidGeometry(_))
        ));
        assert!(engine
            .within_distance_of(&[], 1., &AcceptAll)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn amenities_by_kind() {
        let tree = grid();
        let engine = QueryEngine::new(&tree);
        let amenities = vec![
            Amenity::new(Point::new(0., 0.), "School"),
            Amenity::new(Point::new(9., 9.), "park"),
        ];
        let schools = engine
            .near_amenities(&amenities, "school", 1., &AcceptAll)
            .unwrap();
        let ids: Vec<RecordId> = sorted(schools.iter().map(|(id, _)| *id));
        assert_eq!(ids, vec![0, 1, 10]);

        let listings = listings();
        let criteria = AttributeFilter::new().property_type("house");
        let filter = criteria.with_source(&listings);
        let parks = engine
            .near_amenities(&amenities, "PARK", 1., &filter)
            .unwrap();
        let ids: Vec<RecordId> = sorted(parks.iter().map(|(id, _)| *id));
        assert_eq!(ids, vec![98]);

        assert!(engine
            .near_amenities(&amenities, "hospital", 5., &AcceptAll)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn nearest_filters_after_ranking() {
        let tree = grid();
        let engine = QueryEngine::new(&tree);
        let origin = Point::new(0., 0.);

        let all = engine.nearest(&origin, 3, None, &AcceptAll);
        assert_eq!(all[0], (0, 0.));
        assert_eq!(all.len(), 3);

        // 0 is rejected and the search is not widened to replace it.
        let odd = engine.nearest(&origin, 3, None, &|id: RecordId| id != 0);
        assert_eq!(odd.len(), 2);
        assert!(odd.iter().all(|(id, dist)| *id != 0 && *dist == 1.));

        let close = engine.nearest(&origin, 10, Some(1.), &AcceptAll);
        assert_eq!(sorted(close.iter().map(|(id, _)| *id)), vec![0, 1, 10]);
    }

    #[test]
    fn regions_and_stats() {
        let tree = grid();
        let engine = QueryEngine::new(&tree);
        let regions = vec![
            ("south-west", square(0., 1.)),
            ("north-east", square(8., 9.)),
            ("empty", square(20., 30.)),
        ];

        let groups = engine.group_by_region(&regions, &AcceptAll);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].0, "south-west");
        assert_eq!(sorted(groups[0].1.iter().copied()), vec![0, 1, 10, 11]);
        assert!(groups[2].1.is_empty());

        let stats = engine.region_stats(&regions, &listings());
        assert_eq!(stats[0].count, 4);
        assert_eq!(stats[0].average_price, Some(5500.));
        assert_eq!(stats[1].count, 4);
        assert_eq!(stats[2].count, 0);
        assert_eq!(stats[2].average_price, None);
    }
}
