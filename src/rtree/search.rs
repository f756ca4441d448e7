use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::geometry::{Point, Rectangle};
use crate::rtree::index::RTree;
use crate::rtree::node::{LeafEntry, Node};
use crate::rtree::RecordId;

/// A lazy depth-first walk over the leaf entries of an [`RTree`], optionally restricted to
/// those intersecting a query rectangle.
///
/// Created by [`RTree::search`] and [`RTree::iter`].
#[derive(Debug, Clone)]
pub struct SearchIter<'a> {
    query: Option<Rectangle>,
    stack: Vec<&'a Node>,
    leaf: std::slice::Iter<'a, LeafEntry>,
}

impl<'a> SearchIter<'a> {
    fn new(root: Option<&'a Node>, query: Option<Rectangle>) -> Self {
        Self {
            query,
            stack: root.into_iter().collect(),
            leaf: [].iter(),
        }
    }
}

#[inline]
fn matches(query: Option<&Rectangle>, rect: &Rectangle) -> bool {
    query.map_or(true, |query| query.intersects(rect))
}

impl<'a> Iterator for SearchIter<'a> {
    type Item = &'a LeafEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let query = self.query.as_ref();
        loop {
            if let Some(entry) = self.leaf.find(|entry| matches(query, &entry.rect)) {
                return Some(entry);
            }

            match self.stack.pop()? {
                Node::Leaf(entries) => self.leaf = entries.iter(),
                Node::Internal(children) => {
                    for child in children.iter().rev() {
                        if matches(query, &child.rect) {
                            self.stack.push(&child.child);
                        }
                    }
                }
            }
        }
    }
}

impl RTree {
    /// Lazily yield the identifiers of every record whose rectangle intersects `query`,
    /// boundary included.
    pub fn range_search(&self, query: &Rectangle) -> impl Iterator<Item = RecordId> + '_ {
        self.search(query).map(|entry| entry.id)
    }

    /// Like [`range_search`][Self::range_search] but yields the matching entries, so callers
    /// can refine on the stored rectangle.
    pub fn search(&self, query: &Rectangle) -> SearchIter<'_> {
        SearchIter::new(self.root.as_ref(), Some(*query))
    }

    /// Iterate over every entry in the tree.
    pub fn iter(&self) -> SearchIter<'_> {
        SearchIter::new(self.root.as_ref(), None)
    }

    /// The `k` records closest to `point`, nearest first. Returns fewer than `k` only when the
    /// tree holds fewer records.
    pub fn nearest_neighbors(&self, point: &Point, k: usize) -> Vec<RecordId> {
        self.neighbors(point, Some(k), None)
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }

    /// Search records in order of distance from `point`.
    ///
    /// Distance is the Euclidean distance from the point to the record's rectangle, zero when
    /// the point lies inside it. Results are `(id, distance)` pairs in non-decreasing distance
    /// order. Records at equal distance come out in a deterministic but unspecified order.
    ///
    /// ```
    /// use geo_rtree::rtree::RTreeBuilder;
    /// use geo_rtree::rtree::sort::HilbertSort;
    /// use geo_rtree::{Point, Rectangle};
    ///
    /// let mut builder = RTreeBuilder::default();
    /// builder.add(Rectangle::new(0., 0., 2., 2.).unwrap(), 0);
    /// builder.add(Rectangle::new(1., 1., 3., 3.).unwrap(), 1);
    /// builder.add(Rectangle::new(2., 2., 4., 4.).unwrap(), 2);
    /// let tree = builder.finish::<HilbertSort>();
    ///
    /// let results = tree.neighbors(&Point::new(5., 5.), None, None);
    /// let ids: Vec<u64> = results.iter().map(|(id, _)| *id).collect();
    /// assert_eq!(ids, vec![2, 1, 0]);
    ///
    /// let close = tree.neighbors(&Point::new(5., 5.), None, Some(3.));
    /// assert_eq!(close.len(), 2);
    /// ```
    pub fn neighbors(
        &self,
        point: &Point,
        max_results: Option<usize>,
        max_distance: Option<f64>,
    ) -> Vec<(RecordId, f64)> {
        let Some(root) = self.root.as_ref() else {
            return vec![];
        };
        if max_results == Some(0) {
            return vec![];
        }
        let max_distance = max_distance.unwrap_or(f64::INFINITY);

        let mut queue = BinaryHeap::new();
        let mut results = vec![];
        let mut seq = 0;
        queue.push(Reverse(NeighborNode {
            dist: 0.,
            seq,
            item: Candidate::Node(root),
        }));

        while let Some(Reverse(NeighborNode { dist, item, .. })) = queue.pop() {
            if dist > max_distance {
                break;
            }

            match item {
                // Everything still queued is at least this far away, so this record is final.
                Candidate::Record(id) => {
                    results.push((id, dist));
                    if max_results.is_some_and(|max_results| results.len() == max_results) {
                        break;
                    }
                }
                Candidate::Node(Node::Leaf(entries)) => {
                    for entry in entries {
                        let dist = entry.rect.distance(point);
                        if dist <= max_distance {
                            seq += 1;
                            queue.push(Reverse(NeighborNode {
                                dist,
                                seq,
                                item: Candidate::Record(entry.id),
                            }));
                        }
                    }
                }
                Candidate::Node(Node::Internal(children)) => {
                    for child in children {
                        let dist = child.rect.distance(point);
                        if dist <= max_distance {
                            seq += 1;
                            queue.push(Reverse(NeighborNode {
                                dist,
                                seq,
                                item: Candidate::Node(&child.child),
                            }));
                        }
                    }
                }
            }
        }

        results
    }
}

impl<'a> IntoIterator for &'a RTree {
    type Item = &'a LeafEntry;
    type IntoIter = SearchIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, Copy)]
enum Candidate<'a> {
    Node(&'a Node),
    Record(RecordId),
}

/// A queued node or record and its distance, for use in the priority queue.
///
/// Ordered by distance, then by push order so that equal distances pop deterministically.
#[derive(Debug, Clone, Copy)]
struct NeighborNode<'a> {
    dist: f64,
    seq: usize,
    item: Candidate<'a>,
}

impl PartialEq for NeighborNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NeighborNode<'_> {}

impl Ord for NeighborNode<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for NeighborNode<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
