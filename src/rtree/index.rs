use std::mem;

use geo_traits::RectTrait;
use log::{debug, trace};

use crate::error::{GeoRTreeError, Result};
use crate::geometry::{Point, Rectangle};
use crate::rtree::config::RTreeConfig;
use crate::rtree::node::{choose_subtree, ChildEntry, LeafEntry, Node};
use crate::rtree::split::split;
use crate::rtree::RecordId;

/// A dynamic, balanced R-tree over axis-aligned rectangles.
///
/// Every leaf sits at the same depth. Every internal entry's rectangle is the tight bounding
/// rectangle of its child, and every node except the root holds between
/// [`RTreeConfig::min_entries`] and [`RTreeConfig::max_entries`] entries. These hold after
/// each call to [`insert`][Self::insert] and [`delete`][Self::delete].
///
/// ```
/// use geo_rtree::rtree::{RTree, RTreeConfig};
/// use geo_rtree::{Point, Rectangle};
///
/// let mut tree = RTree::new(RTreeConfig::new(2).unwrap());
/// tree.insert_point(Point::new(0., 0.), 1).unwrap();
/// tree.insert_point(Point::new(1., 1.), 2).unwrap();
/// tree.insert_point(Point::new(10., 10.), 3).unwrap();
/// assert_eq!(tree.height(), 2);
///
/// let query = Rectangle::new(-1., -1., 2., 2.).unwrap();
/// let mut ids: Vec<u64> = tree.range_search(&query).collect();
/// ids.sort();
/// assert_eq!(ids, vec![1, 2]);
///
/// assert_eq!(tree.nearest_neighbors(&Point::new(0., 0.), 2), vec![1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct RTree {
    pub(crate) root: Option<Node>,
    /// Number of levels. Zero when empty, one when the root is a leaf.
    pub(crate) height: usize,
    pub(crate) len: usize,
    pub(crate) config: RTreeConfig,
}

/// An entry waiting to be placed into a node at a given level. Leaf entries always go to
/// level 0.
enum Pending {
    Leaf(LeafEntry),
    Child(ChildEntry),
}

impl Pending {
    fn rect(&self) -> &Rectangle {
        match self {
            Pending::Leaf(entry) => &entry.rect,
            Pending::Child(entry) => &entry.rect,
        }
    }
}

/// Result of an overflowing node split: the new rectangle of the node that was split, and an
/// entry for its new sibling.
struct Split {
    kept: Rectangle,
    sibling: ChildEntry,
}

impl RTree {
    /// Create an empty tree.
    pub fn new(config: RTreeConfig) -> Self {
        Self {
            root: None,
            height: 0,
            len: 0,
            config,
        }
    }

    /// Assemble a tree from an already-packed root. Used by bulk loading.
    pub(crate) fn from_root(config: RTreeConfig, root: Node, height: usize, len: usize) -> Self {
        Self {
            root: Some(root),
            height,
            len,
            config,
        }
    }

    pub fn config(&self) -> &RTreeConfig {
        &self.config
    }

    /// The number of records in the tree, counting duplicates separately.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of levels in the tree. `0` for an empty tree, `1` when the root is a leaf.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The bounding rectangle of all records, or `None` when empty.
    pub fn bounds(&self) -> Option<Rectangle> {
        self.root.as_ref().and_then(Node::mbr)
    }

    /// Remove every record, keeping the configuration.
    pub fn clear(&mut self) {
        debug!("clearing tree with {} records", self.len);
        self.root = None;
        self.height = 0;
        self.len = 0;
    }

    /// Insert a record. The same `(rect, id)` pair may be inserted more than once; each copy is
    /// stored and counted separately.
    pub fn insert(&mut self, rect: Rectangle, id: RecordId) {
        self.insert_at_level(Pending::Leaf(LeafEntry { rect, id }), 0);
        self.len += 1;
    }

    /// Insert a record by any [`RectTrait`] implementation, failing with
    /// [`GeoRTreeError::InvalidGeometry`] if the rectangle is malformed.
    pub fn insert_rect(&mut self, rect: &impl RectTrait<T = f64>, id: RecordId) -> Result<()> {
        self.insert(Rectangle::from_rect(rect)?, id);
        Ok(())
    }

    /// Insert a point record as a zero-area rectangle.
    pub fn insert_point(&mut self, point: Point, id: RecordId) -> Result<()> {
        self.insert(Rectangle::from_point(point)?, id);
        Ok(())
    }

    /// Remove one record matching both `rect` and `id` exactly.
    ///
    /// Nodes left with fewer than [`RTreeConfig::min_entries`] entries are dissolved and their
    /// entries reinserted at the level they came from. A root left with a single child is
    /// replaced by that child.
    pub fn delete(&mut self, rect: &Rectangle, id: RecordId) -> Result<()> {
        let min_entries = self.config.min_entries();
        let mut orphans = Vec::new();

        let found = match self.root.as_mut() {
            Some(root) => delete_rec(root, self.height - 1, rect, id, min_entries, &mut orphans),
            None => false,
        };
        if !found {
            debug!("no entry for record {} at {:?}", id, rect);
            return Err(GeoRTreeError::NotFound { id });
        }
        self.len -= 1;

        if !orphans.is_empty() {
            trace!("condensing {} underfull nodes", orphans.len());
        }
        // Orphans were collected bottom-up. Reinsert the highest ones first so the tree is
        // always tall enough to take them.
        while let Some((level, node)) = orphans.pop() {
            match node {
                Node::Leaf(entries) => {
                    for entry in entries {
                        self.insert_at_level(Pending::Leaf(entry), 0);
                    }
                }
                Node::Internal(children) => {
                    for child in children {
                        self.insert_at_level(Pending::Child(child), level);
                    }
                }
            }
        }

        self.collapse_root();
        Ok(())
    }

    /// Place `entry` into a node at `level` (leaves are level 0), splitting upwards as needed.
    fn insert_at_level(&mut self, entry: Pending, level: usize) {
        let Some(root) = self.root.as_mut() else {
            self.root = Some(match entry {
                Pending::Leaf(entry) => Node::Leaf(vec![entry]),
                Pending::Child(entry) => Node::Internal(vec![entry]),
            });
            self.height = level + 1;
            return;
        };
        debug_assert!(level < self.height);

        if let Some(Split { kept, sibling }) =
            insert_rec(root, self.height - 1, entry, level, &self.config)
        {
            let old_root = mem::replace(root, Node::Internal(Vec::new()));
            *root = Node::Internal(vec![
                ChildEntry {
                    rect: kept,
                    child: Box::new(old_root),
                },
                sibling,
            ]);
            self.height += 1;
            trace!("root split, height is now {}", self.height);
        }
    }

    /// Replace an internal root that has a single child with that child, and drop an empty
    /// root.
    fn collapse_root(&mut self) {
        while let Some(root) = self.root.take() {
            match root {
                Node::Internal(mut children) if children.len() <= 1 => {
                    self.root = children.pop().map(|entry| *entry.child);
                    self.height = if self.root.is_some() {
                        self.height - 1
                    } else {
                        0
                    };
                    trace!("root collapsed, height is now {}", self.height);
                }
                Node::Leaf(entries) if entries.is_empty() => {
                    self.height = 0;
                }
                root => {
                    self.root = Some(root);
                    break;
                }
            }
        }
    }
}

impl Default for RTree {
    fn default() -> Self {
        Self::new(RTreeConfig::default())
    }
}

fn insert_rec(
    node: &mut Node,
    node_level: usize,
    entry: Pending,
    target_level: usize,
    config: &RTreeConfig,
) -> Option<Split> {
    if node_level == target_level {
        match (&mut *node, entry) {
            (Node::Leaf(entries), Pending::Leaf(entry)) => entries.push(entry),
            (Node::Internal(entries), Pending::Child(entry)) => entries.push(entry),
            _ => unreachable!("entry kind does not match node at level {}", node_level),
        }
    } else {
        let Node::Internal(children) = &mut *node else {
            unreachable!("descended past the leaves looking for level {}", target_level)
        };
        let idx = choose_subtree(children, entry.rect());
        let split = insert_rec(
            &mut children[idx].child,
            node_level - 1,
            entry,
            target_level,
            config,
        );
        match split {
            Some(Split { kept, sibling }) => {
                children[idx].rect = kept;
                children.push(sibling);
            }
            None => children[idx].retighten(),
        }
    }

    if node.len() > config.max_entries() {
        Some(split_node(node, config))
    } else {
        None
    }
}

fn split_node(node: &mut Node, config: &RTreeConfig) -> Split {
    match node {
        Node::Leaf(entries) => {
            let (a, b) = split(mem::take(entries), config);
            *entries = a.entries;
            Split {
                kept: a.rect,
                sibling: ChildEntry {
                    rect: b.rect,
                    child: Box::new(Node::Leaf(b.entries)),
                },
            }
        }
        Node::Internal(entries) => {
            let (a, b) = split(mem::take(entries), config);
            *entries = a.entries;
            Split {
                kept: a.rect,
                sibling: ChildEntry {
                    rect: b.rect,
                    child: Box::new(Node::Internal(b.entries)),
                },
            }
        }
    }
}

/// Remove the first leaf entry equal to `(rect, id)` below `node`. Children that drop below
/// `min_entries` are detached and pushed onto `orphans` with their level.
fn delete_rec(
    node: &mut Node,
    node_level: usize,
    rect: &Rectangle,
    id: RecordId,
    min_entries: usize,
    orphans: &mut Vec<(usize, Node)>,
) -> bool {
    match node {
        Node::Leaf(entries) => {
            match entries
                .iter()
                .position(|entry| entry.id == id && entry.rect == *rect)
            {
                Some(pos) => {
                    entries.remove(pos);
                    true
                }
                None => false,
            }
        }
        Node::Internal(children) => {
            for i in 0..children.len() {
                if !children[i].rect.contains(rect) {
                    continue;
                }
                if !delete_rec(
                    &mut children[i].child,
                    node_level - 1,
                    rect,
                    id,
                    min_entries,
                    orphans,
                ) {
                    continue;
                }

                if children[i].child.len() < min_entries {
                    let removed = children.remove(i);
                    orphans.push((node_level - 1, *removed.child));
                } else {
                    children[i].retighten();
                }
                return true;
            }
            false
        }
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    use super::*;
    use crate::rtree::SplitStrategy;
    use crate::test::{check_invariants, init_logger, random_rects, sorted};

    fn point(x: f64, y: f64) -> Rectangle {
        Rectangle::from_point(Point::new(x, y)).unwrap()
    }

    #[test]
    fn empty_tree() {
        let tree = RTree::default();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert!(tree.bounds().is_none());
        let everything = Rectangle::new(-1e9, -1e9, 1e9, 1e9).unwrap();
        assert_eq!(tree.range_search(&everything).count(), 0);
        assert!(tree.nearest_neighbors(&Point::new(0., 0.), 5).is_empty());
    }

    #[test]
    fn root_split_with_smallest_fan_out() {
        init_logger();
        let mut tree = RTree::new(RTreeConfig::new(2).unwrap());
        tree.insert(point(0., 0.), 1);
        tree.insert(point(1., 1.), 2);
        assert_eq!(tree.height(), 1);
        tree.insert(point(10., 10.), 3);
        assert_eq!(tree.height(), 2);
        check_invariants(&tree);

        let query = Rectangle::new(-1., -1., 2., 2.).unwrap();
        assert_eq!(sorted(tree.range_search(&query)), vec![1, 2]);
        assert_eq!(tree.nearest_neighbors(&Point::new(0., 0.), 2), vec![1, 2]);
        assert_eq!(
            tree.bounds(),
            Some(Rectangle::new(0., 0., 10., 10.).unwrap())
        );
    }

    #[test]
    fn duplicates_are_counted_separately() {
        let mut tree = RTree::default();
        tree.insert(point(3., 3.), 7);
        tree.insert(point(3., 3.), 7);
        assert_eq!(tree.len(), 2);
        assert_eq!(sorted(tree.range_search(&point(3., 3.))), vec![7, 7]);

        tree.delete(&point(3., 3.), 7).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(sorted(tree.range_search(&point(3., 3.))), vec![7]);
    }

    #[test]
    fn insert_rejects_invalid_geometry() {
        let mut tree = RTree::default();
        assert!(matches!(
            tree.insert_point(Point::new(f64::NAN, 0.), 1),
            Err(GeoRTreeError::InvalidGeometry(_))
        ));
        let geo_rect = geo_0_31::Rect::new(
            geo_0_31::coord! { x: 0., y: 0. },
            geo_0_31::coord! { x: 2., y: f64::INFINITY },
        );
        assert!(tree.insert_rect(&geo_rect, 2).is_err());
        assert!(tree.is_empty());

        let geo_rect = geo_0_31::Rect::new(
            geo_0_31::coord! { x: 0., y: 0. },
            geo_0_31::coord! { x: 2., y: 2. },
        );
        tree.insert_rect(&geo_rect, 3).unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn delete_requires_exact_match() {
        let mut tree = RTree::default();
        tree.insert(Rectangle::new(0., 0., 1., 1.).unwrap(), 1);

        let err = tree.delete(&Rectangle::new(0., 0., 1., 2.).unwrap(), 1);
        assert_eq!(err, Err(GeoRTreeError::NotFound { id: 1 }));
        let err = tree.delete(&Rectangle::new(0., 0., 1., 1.).unwrap(), 2);
        assert_eq!(err, Err(GeoRTreeError::NotFound { id: 2 }));

        tree.delete(&Rectangle::new(0., 0., 1., 1.).unwrap(), 1).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert!(tree.root.is_none());

        assert_eq!(
            tree.delete(&point(0., 0.), 1),
            Err(GeoRTreeError::NotFound { id: 1 })
        );
    }

    #[test]
    fn underflowing_delete_reinserts_orphans() {
        init_logger();
        let config = RTreeConfig::with_bounds(4, 2).unwrap();
        let mut tree = RTree::new(config);
        let points: Vec<(Rectangle, RecordId)> = (0..40)
            .map(|i| (point((i % 8) as f64, (i / 8) as f64), i))
            .collect();
        for (rect, id) in &points {
            tree.insert(*rect, *id);
        }
        check_invariants(&tree);
        let height = tree.height();
        assert!(height >= 3);

        // Deleting most of one row forces leaves under the minimum.
        for (rect, id) in points.iter().filter(|(_, id)| id % 8 < 6 && id / 8 == 2) {
            tree.delete(rect, *id).unwrap();
            check_invariants(&tree);
        }

        let everything = Rectangle::new(-1., -1., 10., 10.).unwrap();
        let expected: Vec<RecordId> = points
            .iter()
            .map(|(_, id)| *id)
            .filter(|id| !(id % 8 < 6 && id / 8 == 2))
            .collect();
        assert_eq!(sorted(tree.range_search(&everything)), expected);
        for (rect, id) in points.iter().filter(|(_, id)| expected.contains(id)) {
            assert!(tree.range_search(rect).any(|found| found == *id));
        }
    }

    #[test]
    fn random_churn_keeps_invariants() {
        init_logger();
        let mut rng = StdRng::seed_from_u64(42);
        for strategy in [SplitStrategy::Quadratic, SplitStrategy::Linear] {
            let config = RTreeConfig::with_bounds(6, 2).unwrap().with_split(strategy);
            let mut tree = RTree::new(config);
            let mut live = random_rects(&mut rng, 500, 100.);

            for (rect, id) in &live {
                tree.insert(*rect, *id);
            }
            check_invariants(&tree);
            assert_eq!(tree.len(), 500);

            live.shuffle(&mut rng);
            let removed: Vec<_> = live.drain(..350).collect();
            for (i, (rect, id)) in removed.iter().enumerate() {
                tree.delete(rect, *id).unwrap();
                if i % 25 == 0 {
                    check_invariants(&tree);
                }
            }
            check_invariants(&tree);
            assert_eq!(tree.len(), 150);

            for (rect, id) in &live {
                assert!(tree.range_search(rect).any(|found| found == *id));
            }
            for (rect, id) in &removed {
                assert!(tree.range_search(rect).all(|found| found != *id));
            }

            for (rect, id) in live.drain(..) {
                tree.delete(&rect, id).unwrap();
            }
            assert!(tree.is_empty());
            assert_eq!(tree.height(), 0);
        }
    }

    #[test]
    fn clear_resets() {
        let mut tree = RTree::new(RTreeConfig::new(4).unwrap());
        for i in 0..20 {
            tree.insert(point(i as f64, 0.), i);
        }
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.config().max_entries(), 4);
        tree.insert(point(1., 1.), 1);
        assert_eq!(tree.len(), 1);
    }
}
