use geo_traits::RectTrait;
use log::debug;

use crate::error::Result;
use crate::geometry::{Point, Rectangle};
use crate::rtree::config::RTreeConfig;
use crate::rtree::index::RTree;
use crate::rtree::node::{ChildEntry, LeafEntry, Node};
use crate::rtree::sort::{Sort, SortParams};
use crate::rtree::RecordId;

/// A builder to bulk load an [`RTree`].
///
/// Entries are accumulated, ordered along a space-filling curve and packed bottom-up. The
/// result is a regular dynamic tree: it accepts inserts and deletes like any other.
///
/// ```
/// use geo_rtree::rtree::{RTreeBuilder, RTreeConfig};
/// use geo_rtree::rtree::sort::HilbertSort;
/// use geo_rtree::{Point, Rectangle};
///
/// let mut builder = RTreeBuilder::new(RTreeConfig::new(4).unwrap());
/// builder.add(Rectangle::new(0., 0., 2., 2.).unwrap(), 10);
/// builder.add_point(Point::new(5., 5.), 11).unwrap();
/// let tree = builder.finish::<HilbertSort>();
/// assert_eq!(tree.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RTreeBuilder {
    config: RTreeConfig,
    entries: Vec<LeafEntry>,
    bounds: Option<Rectangle>,
}

impl RTreeBuilder {
    pub fn new(config: RTreeConfig) -> Self {
        Self::with_capacity(config, 0)
    }

    /// Create a new builder with room for `capacity` entries.
    pub fn with_capacity(config: RTreeConfig, capacity: usize) -> Self {
        Self {
            config,
            entries: Vec::with_capacity(capacity),
            bounds: None,
        }
    }

    /// Access the configuration the tree will be built with.
    pub fn config(&self) -> &RTreeConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a rectangle with its record identifier.
    #[inline]
    pub fn add(&mut self, rect: Rectangle, id: RecordId) {
        self.bounds = Some(match self.bounds {
            Some(bounds) => bounds.union(&rect),
            None => rect,
        });
        self.entries.push(LeafEntry { rect, id });
    }

    /// Add any [`RectTrait`] implementation, failing if it is malformed.
    pub fn add_rect(&mut self, rect: &impl RectTrait<T = f64>, id: RecordId) -> Result<()> {
        self.add(Rectangle::from_rect(rect)?, id);
        Ok(())
    }

    /// Add a point as a zero-area rectangle.
    pub fn add_point(&mut self, point: Point, id: RecordId) -> Result<()> {
        self.add(Rectangle::from_point(point)?, id);
        Ok(())
    }

    /// Consume this builder, performing the sort and packing nodes bottom-up.
    ///
    /// [`HilbertSort`] and [`STRSort`] both implement [`Sort`], allowing you to choose the
    /// ordering used.
    ///
    /// Every level is cut into the fewest nodes that fit, with sizes differing by at most one,
    /// so no node other than the root falls below [`RTreeConfig::min_entries`].
    ///
    /// [`HilbertSort`]: crate::rtree::sort::HilbertSort
    /// [`STRSort`]: crate::rtree::sort::STRSort
    pub fn finish<S: Sort>(self) -> RTree {
        let Self {
            config,
            mut entries,
            bounds,
        } = self;
        let Some(bounds) = bounds else {
            return RTree::new(config);
        };

        let num_items = entries.len();
        let node_size = config.max_entries();
        if num_items > node_size {
            S::sort(&SortParams { node_size, bounds }, &mut entries);
        }

        let mut nodes: Vec<Node> = balanced_chunks(entries, node_size)
            .into_iter()
            .map(Node::Leaf)
            .collect();
        let mut height = 1;
        while nodes.len() > 1 {
            let children: Vec<ChildEntry> = nodes.into_iter().filter_map(ChildEntry::new).collect();
            nodes = balanced_chunks(children, node_size)
                .into_iter()
                .map(Node::Internal)
                .collect();
            height += 1;
        }

        let Some(root) = nodes.pop() else {
            return RTree::new(config);
        };
        debug!(
            "bulk loaded {} entries into a tree of height {} using {}",
            num_items,
            height,
            std::any::type_name::<S>()
        );
        RTree::from_root(config, root, height, num_items)
    }
}

impl Default for RTreeBuilder {
    fn default() -> Self {
        Self::new(RTreeConfig::default())
    }
}

impl RTree {
    /// Build a tree from a batch of entries in one pass.
    ///
    /// Much faster than repeated [`insert`][RTree::insert] and produces tighter nodes. A
    /// common pattern is to build a replacement tree off to the side and swap it in with
    /// [`SharedRTree::replace`][crate::SharedRTree::replace].
    pub fn bulk_load<S: Sort>(
        config: RTreeConfig,
        entries: impl IntoIterator<Item = (Rectangle, RecordId)>,
    ) -> RTree {
        let entries = entries.into_iter();
        let mut builder = RTreeBuilder::with_capacity(config, entries.size_hint().0);
        for (rect, id) in entries {
            builder.add(rect, id);
        }
        builder.finish::<S>()
    }
}

/// Cut `items` into `ceil(len / max)` consecutive chunks whose sizes differ by at most one.
fn balanced_chunks<T>(items: Vec<T>, max: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return vec![];
    }
    let count = items.len().div_ceil(max);
    let base = items.len() / count;
    let extra = items.len() % count;

    let mut items = items.into_iter();
    (0..count)
        .map(|i| {
            let size = if i < extra { base + 1 } else { base };
            items.by_ref().take(size).collect()
        })
        .collect()
}
