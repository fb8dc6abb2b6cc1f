//! Grouping of NUNIQ index arrays by order.
//!
//! A sorted pixel set is a sequence of contiguous runs, one per order, coarsest first. `LevelPartition` sorts any number of
//! sets and finds the run boundaries of each with one binary search per order, using a shared list of orders so that level
//! `k` means the same order in every set.
//!
//! ```
//! use skymoc_algebra::{LevelPartition, PartitionOptions};
//!
//! let a = [1024, 4100, 1027, 1026];
//! let b = [4096, 1025];
//! let p = LevelPartition::new(&[&a[..], &b[..]], PartitionOptions::default()).unwrap();
//!
//! assert_eq!(p.orders(), &[4, 5]);
//! assert_eq!(p.level(0, 0), &[1024, 1026, 1027]);
//! assert_eq!(p.level(1, 1), &[4096]);
//! ```

use skymoc_core::{check_valid_indices, first_index, order_unchecked, SkyResult, MAX_ORDER};

use std::ops::Range;
use tracing::{debug_span, trace};

/// Controls what a `LevelPartition` keeps.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PartitionOptions {
    /// Keep orders between the global minimum and maximum that no set populates.
    pub include_empty: bool,
    /// Keep, for each set, the original position of every sorted element.
    pub return_index: bool,
    /// Keep, for each set, the sorted position of every original element.
    pub return_inverse: bool,
}

impl PartitionOptions {
    pub fn include_empty(mut self, include_empty: bool) -> Self {
        self.include_empty = include_empty;

        self
    }

    pub fn return_index(mut self, return_index: bool) -> Self {
        self.return_index = return_index;

        self
    }

    pub fn return_inverse(mut self, return_inverse: bool) -> Self {
        self.return_inverse = return_inverse;

        self
    }
}

/// One or more pixel sets, sorted and sliced by order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LevelPartition {
    sorted: Vec<Vec<u64>>,
    slices: Vec<Vec<Range<usize>>>,
    orders: Vec<u8>,
    index: Option<Vec<Vec<usize>>>,
    inverse: Option<Vec<Vec<usize>>>,
}

impl LevelPartition {
    /// Sorts every set in `sets` (stable) and slices it by order. Fails with `InvalidIndex` if any index is below 4.
    pub fn new(sets: &[&[u64]], options: PartitionOptions) -> SkyResult<Self> {
        let _span = debug_span!("level_partition", sets = sets.len()).entered();

        for set in sets.iter() {
            check_valid_indices(set)?;
        }

        let keep_index = options.return_index || options.return_inverse;
        let mut sorted = Vec::with_capacity(sets.len());
        let mut index = Vec::with_capacity(sets.len());
        for set in sets.iter() {
            if keep_index {
                let (s, i) = argsort(set);
                sorted.push(s);
                index.push(i);
            } else {
                let mut s = set.to_vec();
                s.sort_unstable();
                sorted.push(s);
            }
        }

        let inverse = if options.return_inverse {
            Some(index.iter().map(|i| invert_permutation(i)).collect())
        } else {
            None
        };
        let index = if options.return_index {
            Some(index)
        } else {
            None
        };

        let non_empty = || sorted.iter().filter(|s| !s.is_empty());
        let min_order = non_empty().map(|s| order_unchecked(s[0])).min();
        let max_order = non_empty().map(|s| order_unchecked(s[s.len() - 1])).max();
        let (min_order, max_order) = match (min_order, max_order) {
            (Some(min), Some(max)) => (min, max),
            _ => {
                return Ok(Self {
                    slices: vec![Vec::new(); sorted.len()],
                    sorted,
                    orders: Vec::new(),
                    index,
                    inverse,
                });
            }
        };

        // Boundaries of every order in [min_order, max_order + 1] for every set.
        let boundaries: Vec<Vec<usize>> = sorted
            .iter()
            .map(|s| {
                (min_order..=max_order + 1)
                    .map(|o| level_boundary(s, o))
                    .collect()
            })
            .collect();

        let mut orders = Vec::new();
        let mut slices = vec![Vec::new(); sorted.len()];
        for (level, order) in (min_order..=max_order).enumerate() {
            let populated = boundaries.iter().any(|b| b[level] < b[level + 1]);
            if !(populated || options.include_empty) {
                continue;
            }
            orders.push(order);
            for (set_slices, b) in slices.iter_mut().zip(boundaries.iter()) {
                set_slices.push(b[level]..b[level + 1]);
            }
        }
        trace!(min_order, max_order, levels = orders.len());

        Ok(Self {
            sorted,
            slices,
            orders,
            index,
            inverse,
        })
    }

    pub fn num_sets(&self) -> usize {
        self.sorted.len()
    }

    /// The orders spanned by the partition, ascending.
    pub fn orders(&self) -> &[u8] {
        &self.orders
    }

    pub fn num_levels(&self) -> usize {
        self.orders.len()
    }

    /// The sorted copy of `set`.
    pub fn sorted(&self, set: usize) -> &[u64] {
        &self.sorted[set]
    }

    /// The run of each level within `sorted(set)`.
    pub fn slices(&self, set: usize) -> &[Range<usize>] {
        &self.slices[set]
    }

    pub fn lengths(&self, set: usize) -> Vec<usize> {
        self.slices[set].iter().map(|s| s.len()).collect()
    }

    /// The pixels of `set` at `orders()[level]`.
    pub fn level(&self, set: usize, level: usize) -> &[u64] {
        &self.sorted[set][self.slices[set][level].clone()]
    }

    /// `index(set)[k]` is the original position of `sorted(set)[k]`.
    pub fn index(&self, set: usize) -> Option<&[usize]> {
        self.index.as_ref().map(|i| i[set].as_slice())
    }

    /// `sorted(set)[inverse(set)[k]]` is the original element `k`.
    pub fn inverse(&self, set: usize) -> Option<&[usize]> {
        self.inverse.as_ref().map(|i| i[set].as_slice())
    }

    /// Consumes the partition, yielding the sorted sets, their slices, the orders, and the sorted-to-original index maps.
    pub fn into_parts(
        self,
    ) -> (
        Vec<Vec<u64>>,
        Vec<Vec<Range<usize>>>,
        Vec<u8>,
        Option<Vec<Vec<usize>>>,
    ) {
        (self.sorted, self.slices, self.orders, self.index)
    }
}

/// Position of the first pixel at `order` or finer in the sorted `set`.
#[inline]
pub fn level_boundary(set: &[u64], order: u8) -> usize {
    if order > MAX_ORDER {
        return set.len();
    }
    let first = first_index(order);

    set.partition_point(|&u| u < first)
}

/// Stable sort of `values`, also returning the original position of each sorted element.
pub fn argsort(values: &[u64]) -> (Vec<u64>, Vec<usize>) {
    let mut index: Vec<usize> = (0..values.len()).collect();
    index.sort_by_key(|&i| values[i]);
    let sorted = index.iter().map(|&i| values[i]).collect();

    (sorted, index)
}

fn invert_permutation(index: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; index.len()];
    for (sorted_pos, &original_pos) in index.iter().enumerate() {
        inverse[original_pos] = sorted_pos;
    }

    inverse
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
