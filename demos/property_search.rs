//! Property search over a synthetic listing set.
//!
//! Bulk loads a few thousand listings around Manhattan, then runs the bounding box, polygon and
//! attribute-filtered queries a listing service would issue. Run with `RUST_LOG=debug` to see
//! the tree's own logging.

use std::collections::HashMap;

use geo_rtree::query::{AcceptAll, AttributeFilter, QueryEngine, RecordAttributes};
use geo_rtree::rtree::sort::HilbertSort;
use geo_rtree::rtree::{RTree, RTreeConfig};
use geo_rtree::{Point, Polygon, Rectangle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PROPERTY_TYPES: [&str; 3] = ["House", "Apartment", "Condo"];

fn main() {
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(2024);
    let mut listings: HashMap<u64, RecordAttributes> = HashMap::new();
    let mut entries = Vec::new();
    for id in 0..5_000u64 {
        let location = Point::geographic(
            rng.gen_range(-74.02..-73.93),
            rng.gen_range(40.70..40.80),
        )
        .unwrap();
        entries.push((Rectangle::from_point(location).unwrap(), id));
        listings.insert(
            id,
            RecordAttributes {
                price: rng.gen_range(300_000.0..3_000_000.0_f64).round(),
                bedrooms: rng.gen_range(0..6),
                property_type: PROPERTY_TYPES[rng.gen_range(0..PROPERTY_TYPES.len())].to_string(),
            },
        );
    }

    let tree = RTree::bulk_load::<HilbertSort>(RTreeConfig::default(), entries);
    println!(
        "Indexed {} listings, tree height {}",
        tree.len(),
        tree.height()
    );
    let engine = QueryEngine::new(&tree);

    // 1. Bounding box: lower Manhattan.
    let bbox = Rectangle::new(-74.02, 40.70, -73.99, 40.72).unwrap();
    let in_box = engine.within_bbox(&bbox, &AcceptAll);
    println!("\n1. {} listings in the lower Manhattan box", in_box.len());

    // 2. Polygon: a rough outline of the East Village.
    let east_village = Polygon::new(vec![
        Point::new(-73.992, 40.722),
        Point::new(-73.975, 40.719),
        Point::new(-73.972, 40.730),
        Point::new(-73.987, 40.734),
    ])
    .unwrap();
    let in_polygon = engine.within_polygon(&east_village, &AcceptAll);
    println!("2. {} listings in the East Village", in_polygon.len());

    // 3. Polygon plus attributes: affordable two-bedroom condos.
    let criteria = AttributeFilter::new()
        .property_type("condo")
        .min_bedrooms(2)
        .max_price(1_000_000.);
    let filter = criteria.with_source(&listings);
    let affordable = engine.within_polygon(&east_village, &filter);
    println!(
        "3. {} of them are condos with 2+ bedrooms under $1M",
        affordable.len()
    );
    for id in affordable.iter().take(5) {
        let listing = &listings[id];
        println!(
            "   #{:<5} {:>9} {} bedrooms",
            id, listing.price, listing.bedrooms
        );
    }

    // 4. A malformed polygon is rejected before it reaches the tree.
    match engine.within_polygon_coords(&[(-74.0, 40.7), (-73.9, 40.8)], &AcceptAll) {
        Ok(_) => println!("4. unexpectedly accepted a two-vertex polygon"),
        Err(err) => println!("4. rejected: {}", err),
    }
}
