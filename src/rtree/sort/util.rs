use crate::rtree::LeafEntry;

/// Quicksort that orders entries alongside their sort keys, but only down to `node_size`
/// buckets: entries within one bucket are left in arbitrary order.
// Partially taken from static_aabb2d_index under the MIT/Apache license
pub(super) fn partial_sort<V: PartialOrd + Copy>(
    values: &mut [V],
    entries: &mut [LeafEntry],
    left: usize,
    right: usize,
    node_size: usize,
) {
    debug_assert!(left <= right);
    debug_assert_eq!(values.len(), entries.len());

    if left / node_size >= right / node_size {
        return;
    }

    let pivot = values[(left + right) / 2];
    let mut i = left.wrapping_sub(1);
    let mut j = right.wrapping_add(1);

    loop {
        loop {
            i = i.wrapping_add(1);
            if values[i] >= pivot {
                break;
            }
        }

        loop {
            j = j.wrapping_sub(1);
            if values[j] <= pivot {
                break;
            }
        }

        if i >= j {
            break;
        }

        values.swap(i, j);
        entries.swap(i, j);
    }

    partial_sort(values, entries, left, j, node_size);
    partial_sort(values, entries, j.wrapping_add(1), right, node_size);
}
