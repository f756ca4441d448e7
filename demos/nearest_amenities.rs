//! Proximity and nearest-neighbour queries against a live, shared index.
//!
//! Listings are inserted one by one into a `SharedRTree` while reader threads query it, then
//! the index is rebuilt off to the side and swapped in.

use std::thread;

use geo_rtree::query::{AcceptAll, Amenity};
use geo_rtree::rtree::sort::STRSort;
use geo_rtree::rtree::{RTree, RTreeConfig};
use geo_rtree::{km_to_degrees, Point, Rectangle, SharedRTree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_listing(rng: &mut StdRng) -> Point {
    Point::geographic(rng.gen_range(-74.02..-73.93), rng.gen_range(40.70..40.80)).unwrap()
}

fn main() {
    env_logger::init();

    let shared = SharedRTree::new(RTreeConfig::new(12).unwrap());

    let writer = {
        let shared = shared.clone();
        thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(1);
            for id in 0..2_000u64 {
                let rect = Rectangle::from_point(random_listing(&mut rng)).unwrap();
                shared.insert(rect, id);
            }
        })
    };
    let reader = {
        let shared = shared.clone();
        thread::spawn(move || {
            let times_square = Point::new(-73.9855, 40.7580);
            let mut seen = 0;
            for _ in 0..100 {
                seen = seen.max(shared.nearest_neighbors(&times_square, 5).len());
            }
            seen
        })
    };
    writer.join().unwrap();
    println!(
        "Inserted {} listings; reader saw up to {} neighbours while writing",
        shared.len(),
        reader.join().unwrap()
    );

    let amenities = vec![
        Amenity::new(Point::new(-73.9969, 40.7306), "school"),
        Amenity::new(Point::new(-73.9857, 40.7484), "school"),
        Amenity::new(Point::new(-73.9654, 40.7829), "park"),
    ];

    let radius = km_to_degrees(0.5, 40.75);
    let near_schools = shared.query(|engine| {
        engine
            .near_amenities(&amenities, "school", radius, &AcceptAll)
            .unwrap()
    });
    println!(
        "\n{} listings within 500 m of a school, closest:",
        near_schools.len()
    );
    for (id, dist) in near_schools.iter().take(3) {
        println!("   #{:<5} {:.5}°", id, dist);
    }

    let central_park = Point::new(-73.9654, 40.7829);
    let nearest = shared.query(|engine| engine.nearest(&central_park, 5, None, &AcceptAll));
    println!("\nFive nearest listings to Central Park:");
    for (id, dist) in &nearest {
        println!("   #{:<5} {:.5}°", id, dist);
    }

    // Rebuild from the current contents without holding the lock, then swap.
    let entries: Vec<(Rectangle, u64)> = shared
        .read()
        .iter()
        .map(|entry| (*entry.rect(), entry.id()))
        .collect();
    let config = *shared.read().config();
    let rebuilt = RTree::bulk_load::<STRSort>(config, entries);
    let old = shared.replace(rebuilt);
    println!(
        "\nSwapped in a bulk loaded tree: height {} -> {}",
        old.height(),
        shared.read().height()
    );
}
