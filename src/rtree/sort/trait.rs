use crate::geometry::Rectangle;
use crate::rtree::LeafEntry;

/// Inputs shared by every bulk-load ordering.
#[derive(Debug, Clone, Copy)]
pub struct SortParams {
    /// Target number of entries per leaf. Orderings only need to be exact at this granularity.
    pub(crate) node_size: usize,
    /// Bounding rectangle of all entries being sorted.
    pub(crate) bounds: Rectangle,
}

impl SortParams {
    pub fn node_size(&self) -> usize {
        self.node_size
    }

    pub fn bounds(&self) -> &Rectangle {
        &self.bounds
    }
}

/// A space-filling ordering of leaf entries, applied before bulk-load packing so that entries
/// close together in the order end up in the same node.
pub trait Sort {
    fn sort(params: &SortParams, entries: &mut [LeafEntry]);
}
