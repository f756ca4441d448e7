//! Node splitting (Guttman, 1984).

use crate::geometry::Rectangle;
use crate::rtree::config::{RTreeConfig, SplitStrategy};
use crate::rtree::node::Bounded;

/// One half of a split node, with its tight bounding rectangle.
#[derive(Debug)]
pub(crate) struct Group<T> {
    pub(crate) entries: Vec<T>,
    pub(crate) rect: Rectangle,
}

impl<T: Bounded> Group<T> {
    fn new(seed: T, capacity: usize) -> Self {
        let rect = *seed.rect();
        let mut entries = Vec::with_capacity(capacity);
        entries.push(seed);
        Self { entries, rect }
    }

    fn push(&mut self, entry: T) {
        self.rect = self.rect.union(entry.rect());
        self.entries.push(entry);
    }

    fn extend(&mut self, entries: impl IntoIterator<Item = T>) {
        for entry in entries {
            self.push(entry);
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Divide an overflowing entry list into two groups, each holding at least
/// `config.min_entries()` entries.
///
/// The first group is the one seeded by the entry that came first in `entries`.
pub(crate) fn split<T: Bounded>(mut entries: Vec<T>, config: &RTreeConfig) -> (Group<T>, Group<T>) {
    debug_assert!(entries.len() >= 2);

    let strategy = config.split();
    let (first, second) = match strategy {
        SplitStrategy::Quadratic => quadratic_seeds(&entries),
        SplitStrategy::Linear => linear_seeds(&entries),
    };
    let (lo, hi) = if first < second {
        (first, second)
    } else {
        (second, first)
    };

    // Remove the later seed first so the earlier index stays valid.
    let seed_b = entries.remove(hi);
    let seed_a = entries.remove(lo);

    let capacity = config.max_entries();
    let min = config.min_entries();
    let mut a = Group::new(seed_a, capacity);
    let mut b = Group::new(seed_b, capacity);

    while !entries.is_empty() {
        if a.len() + entries.len() <= min {
            a.extend(entries.drain(..));
            break;
        }
        if b.len() + entries.len() <= min {
            b.extend(entries.drain(..));
            break;
        }

        let next = match strategy {
            SplitStrategy::Quadratic => pick_next(&entries, &a.rect, &b.rect),
            SplitStrategy::Linear => 0,
        };
        let entry = entries.remove(next);
        if prefers_first(&a.rect, &b.rect, entry.rect()) {
            a.push(entry);
        } else {
            b.push(entry);
        }
    }

    (a, b)
}

/// The pair whose covering rectangle wastes the most area. Ties keep the first pair found.
fn quadratic_seeds<T: Bounded>(entries: &[T]) -> (usize, usize) {
    let mut seeds = (0, 1);
    let mut worst = f64::NEG_INFINITY;

    for (i, a) in entries.iter().enumerate() {
        for (j, b) in entries.iter().enumerate().skip(i + 1) {
            let (ra, rb) = (a.rect(), b.rect());
            let waste = ra.union(rb).area() - ra.area() - rb.area();
            if waste > worst {
                worst = waste;
                seeds = (i, j);
            }
        }
    }

    seeds
}

/// The pair with the greatest separation along either axis, normalized by the extent of the
/// whole set on that axis.
fn linear_seeds<T: Bounded>(entries: &[T]) -> (usize, usize) {
    let x = axis_seeds(entries, |r| r.min_x(), |r| r.max_x());
    let y = axis_seeds(entries, |r| r.min_y(), |r| r.max_y());
    let (i, j) = if y.0 > x.0 { (y.1, y.2) } else { (x.1, x.2) };

    if i != j {
        (i, j)
    } else {
        // One entry has both the highest low side and the lowest high side.
        (i, if i == 0 { 1 } else { 0 })
    }
}

/// Returns `(normalized separation, highest low side, lowest high side)` along one axis.
fn axis_seeds<T: Bounded>(
    entries: &[T],
    low: impl Fn(&Rectangle) -> f64,
    high: impl Fn(&Rectangle) -> f64,
) -> (f64, usize, usize) {
    let mut highest_low = 0;
    let mut lowest_high = 0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for (i, entry) in entries.iter().enumerate() {
        let rect = entry.rect();
        if low(rect) > low(entries[highest_low].rect()) {
            highest_low = i;
        }
        if high(rect) < high(entries[lowest_high].rect()) {
            lowest_high = i;
        }
        min = min.min(low(rect));
        max = max.max(high(rect));
    }

    let separation = low(entries[highest_low].rect()) - high(entries[lowest_high].rect());
    let extent = max - min;
    let normalized = if extent > 0.0 {
        separation / extent
    } else {
        separation
    };
    (normalized, highest_low, lowest_high)
}

/// The remaining entry with the strongest preference for one of the groups.
fn pick_next<T: Bounded>(entries: &[T], a: &Rectangle, b: &Rectangle) -> usize {
    let mut best = 0;
    let mut best_diff = f64::NEG_INFINITY;

    for (i, entry) in entries.iter().enumerate() {
        let diff = (a.enlargement(entry.rect()) - b.enlargement(entry.rect())).abs();
        if diff > best_diff {
            best_diff = diff;
            best = i;
        }
    }

    best
}

/// Least enlargement, then smaller resulting area, then the first group.
fn prefers_first(a: &Rectangle, b: &Rectangle, rect: &Rectangle) -> bool {
    let (da, db) = (a.enlargement(rect), b.enlargement(rect));
    if da != db {
        return da < db;
    }
    let (area_a, area_b) = (a.union(rect).area(), b.union(rect).area());
    if area_a != area_b {
        return area_a < area_b;
    }
    true
}
