#[cfg(feature = "rayon")]
use rayon::iter::{IndexedParallelIterator, ParallelIterator};
#[cfg(feature = "rayon")]
use rayon::slice::ParallelSliceMut;

use crate::rtree::sort::util::partial_sort;
use crate::rtree::sort::{Sort, SortParams};
use crate::rtree::LeafEntry;

/// An implementation of sort-tile-recursive (STR) sorting.
///
/// Entries are cut into vertical slices by the x coordinate of their centers, then each slice
/// is ordered by y. The implementation is derived from [this
/// paper](https://ia600900.us.archive.org/27/items/nasa_techdoc_19970016975/19970016975.pdf).
///
/// With the `rayon` feature, slices are sorted in parallel.
#[derive(Debug, Clone, Copy)]
pub struct STRSort;

impl Sort for STRSort {
    fn sort(params: &SortParams, entries: &mut [LeafEntry]) {
        if entries.is_empty() {
            return;
        }
        let num_items = entries.len();
        let node_size = params.node_size;

        // Reuse one buffer for the x and then the y coordinates of the centers.
        let mut center_values: Vec<f64> = entries
            .iter()
            .map(|entry| entry.rect().center().x())
            .collect();
        partial_sort(&mut center_values, entries, 0, num_items - 1, node_size);

        center_values.clear();
        center_values.extend(entries.iter().map(|entry| entry.rect().center().y()));

        let num_leaf_nodes = num_items.div_ceil(node_size);
        let num_vertical_slices = (num_leaf_nodes as f64).sqrt().ceil() as usize;
        let num_items_per_slice = num_vertical_slices * node_size;

        #[cfg(feature = "rayon")]
        {
            center_values
                .par_chunks_mut(num_items_per_slice)
                .zip(entries.par_chunks_mut(num_items_per_slice))
                .for_each(|(center_chunk, entry_chunk)| {
                    let right = center_chunk.len() - 1;
                    partial_sort(center_chunk, entry_chunk, 0, right, node_size);
                });
        }

        #[cfg(not(feature = "rayon"))]
        {
            for (center_chunk, entry_chunk) in center_values
                .chunks_mut(num_items_per_slice)
                .zip(entries.chunks_mut(num_items_per_slice))
            {
                let right = center_chunk.len() - 1;
                partial_sort(center_chunk, entry_chunk, 0, right, node_size);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::{Point, Rectangle};

    #[test]
    fn slices_by_x_then_y() {
        // A 4 x 4 grid with node size 4 gives two vertical slices of eight entries.
        let mut entries: Vec<LeafEntry> = (0..16)
            .rev()
            .map(|i| {
                let point = Point::new((i % 4) as f64, (i / 4) as f64);
                LeafEntry::new(Rectangle::from_point(point).unwrap(), i)
            })
            .collect();
        let params = SortParams {
            node_size: 4,
            bounds: Rectangle::new(0., 0., 3., 3.).unwrap(),
        };
        STRSort::sort(&params, &mut entries);

        for slice in entries.chunks(8) {
            let xs: Vec<f64> = slice.iter().map(|e| e.rect().min_x()).collect();
            let west = xs.iter().all(|x| *x <= 1.);
            let east = xs.iter().all(|x| *x >= 2.);
            assert!(west || east);

            let mut bottom: Vec<f64> = slice[..4].iter().map(|e| e.rect().min_y()).collect();
            bottom.sort_by(f64::total_cmp);
            assert_eq!(bottom, vec![0., 0., 1., 1.]);
        }
    }
}
