//! Overlap between two pixel sets of mixed resolution.
//!
//! # Algorithm
//!
//! Both sets are validated, sorted and partitioned by order, then the levels are visited from finest to coarsest. At each
//! level:
//!
//! 1. Pixels of equal order are matched directly by a sorted intersection.
//! 2. Every pixel finer than the current level is promoted (right-shifted) to the current order, in place, in a scratch copy
//!    of each set. Promoted runs stay sorted.
//! 3. The promoted runs of one set are binary searched in the current level of the other set. A hit means the finer pixel
//!    lies inside the coarser one.
//!
//! No pair of pixels is ever compared unless they could overlap, so the cost is `O(M log N + N log M)` per level.
//!
//! ```
//! use skymoc_algebra::uniq_intersection;
//!
//! let a = [1024, 4100, 1027, 1026, 44096];
//! let b = [4096, 4097, 1025, 1026, 11024];
//! let overlap = uniq_intersection(&a, &b).unwrap();
//!
//! assert_eq!(overlap.index_a, vec![4, 3, 0, 0, 1]);
//! assert_eq!(overlap.index_b, vec![4, 3, 0, 1, 2]);
//! assert_eq!(overlap.delta_order, vec![-1, 0, 1, 1, -1]);
//! ```

use crate::{LevelPartition, PartitionOptions};

use skymoc_core::{check_non_overlapping, SkyResult};

use tracing::{debug, debug_span, trace};

/// Pairs of overlapping pixels between sets `A` and `B`.
///
/// Entry `k` says that `A[index_a[k]]` overlaps `B[index_b[k]]`, and `delta_order[k] = order(B[index_b[k]]) -
/// order(A[index_a[k]])`. A coarse pixel appears once for every finer pixel it contains.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IntersectionResult {
    pub index_a: Vec<usize>,
    pub index_b: Vec<usize>,
    pub delta_order: Vec<i8>,
}

/// One entry of an `IntersectionResult`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Overlap {
    pub index_a: usize,
    pub index_b: usize,
    pub delta_order: i8,
}

impl IntersectionResult {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index_a: Vec::with_capacity(capacity),
            index_b: Vec::with_capacity(capacity),
            delta_order: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, index_a: usize, index_b: usize, delta_order: i8) {
        self.index_a.push(index_a);
        self.index_b.push(index_b);
        self.delta_order.push(delta_order);
    }

    pub fn len(&self) -> usize {
        self.delta_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delta_order.is_empty()
    }

    /// The same overlap seen from `B`: the index arrays swap places and every order difference is negated.
    pub fn swapped(&self) -> Self {
        Self {
            index_a: self.index_b.clone(),
            index_b: self.index_a.clone(),
            delta_order: self.delta_order.iter().map(|d| -d).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Overlap> + '_ {
        self.index_a
            .iter()
            .zip(self.index_b.iter())
            .zip(self.delta_order.iter())
            .map(|((&index_a, &index_b), &delta_order)| Overlap {
                index_a,
                index_b,
                delta_order,
            })
    }
}

/// Finds every overlapping pair of pixels between `a` and `b`.
///
/// Both inputs must be valid, unique and non-overlapping, but need not be sorted; otherwise this fails with `InvalidIndex`
/// or `OverlapViolation` before any work is done.
///
/// Matches are ordered from the finest level to the coarsest. Within a level, equal-order matches come first, then pixels
/// of `b` finer than `a`, then pixels of `a` finer than `b`; each group is ascending in the sorted order of its finer pixel.
pub fn uniq_intersection(a: &[u64], b: &[u64]) -> SkyResult<IntersectionResult> {
    let _span = debug_span!("uniq_intersection", a = a.len(), b = b.len()).entered();

    check_non_overlapping("a", a)?;
    check_non_overlapping("b", b)?;

    let partition = LevelPartition::new(
        &[a, b],
        PartitionOptions::default()
            .include_empty(true)
            .return_index(true),
    )?;
    let (mut scratch, slices, orders, index) = partition.into_parts();
    let index = index.unwrap_or_default();

    let mut sorted_matches = IntersectionResult::with_capacity(a.len() + b.len());
    let num_levels = orders.len();
    for level in (0..num_levels).rev() {
        let matches_before = sorted_matches.len();

        // Equal orders.
        let (run_a, run_b) = (slices[0][level].clone(), slices[1][level].clone());
        intersect_sorted(&scratch[0][run_a.clone()], &scratch[1][run_b.clone()], |i, j| {
            sorted_matches.push(run_a.start + i, run_b.start + j, 0)
        });

        // Promote everything finer to this level's order.
        if level + 1 < num_levels {
            let shift = 2 * u32::from(orders[level + 1] - orders[level]);
            for (set, set_slices) in scratch.iter_mut().zip(slices.iter()) {
                for u in set[set_slices[level].end..].iter_mut() {
                    *u >>= shift;
                }
            }
        }

        // Finer pixels of `fine` inside pixels of `coarse` at this level.
        for &(coarse, fine) in [(0, 1), (1, 0)].iter() {
            let coarse_run = slices[coarse][level].clone();
            if coarse_run.is_empty() {
                continue;
            }
            let coarse_pixels = &scratch[coarse][coarse_run.clone()];
            for fine_level in (level + 1..num_levels).rev() {
                let fine_run = slices[fine][fine_level].clone();
                let levels_finer = (orders[fine_level] - orders[level]) as i8;
                let delta_order = if fine == 1 {
                    levels_finer
                } else {
                    -levels_finer
                };
                search_sorted(
                    coarse_pixels,
                    &scratch[fine][fine_run.clone()],
                    |i_coarse, i_fine| {
                        let (i_a, i_b) = if coarse == 0 {
                            (coarse_run.start + i_coarse, fine_run.start + i_fine)
                        } else {
                            (fine_run.start + i_fine, coarse_run.start + i_coarse)
                        };
                        sorted_matches.push(i_a, i_b, delta_order);
                    },
                );
            }
        }

        trace!(
            order = orders[level],
            matches = sorted_matches.len() - matches_before
        );
    }

    // Translate sorted positions back to positions in the inputs.
    let result = IntersectionResult {
        index_a: sorted_matches
            .index_a
            .iter()
            .map(|&i| index[0][i])
            .collect(),
        index_b: sorted_matches
            .index_b
            .iter()
            .map(|&i| index[1][i])
            .collect(),
        delta_order: sorted_matches.delta_order,
    };
    debug!(matches = result.len());

    Ok(result)
}

/// Calls `on_match(i, j)` for every `a[i] == b[j]`, in ascending order. Both inputs must be sorted and unique.
///
/// When one side is much shorter, its elements are binary searched in the other; otherwise the two are merged.
fn intersect_sorted(a: &[u64], b: &[u64], mut on_match: impl FnMut(usize, usize)) {
    if a.is_empty() || b.is_empty() {
        return;
    }
    let (short, long) = (a.len().min(b.len()), a.len().max(b.len()));
    let log_long = (usize::BITS - long.leading_zeros()) as usize;
    if short * log_long < short + long {
        if a.len() <= b.len() {
            search_sorted(b, a, |j, i| on_match(i, j));
        } else {
            search_sorted(a, b, |i, j| on_match(i, j));
        }
        return;
    }

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            i += 1;
        } else if a[i] > b[j] {
            j += 1;
        } else {
            on_match(i, j);
            i += 1;
            j += 1;
        }
    }
}

/// Calls `on_match(i, j)` for every `needles[j]` found at `haystack[i]`. The haystack must be sorted and unique; the needles
/// must be sorted but may repeat, which lets every search start where the previous one ended.
fn search_sorted(haystack: &[u64], needles: &[u64], mut on_match: impl FnMut(usize, usize)) {
    let mut lower = 0;
    for (j, needle) in needles.iter().enumerate() {
        if lower >= haystack.len() {
            break;
        }
        match haystack[lower..].binary_search(needle) {
            Ok(offset) => {
                lower += offset;
                on_match(lower, j);
            }
            Err(offset) => lower += offset,
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;
    use skymoc_core::SkyError;

    const A: [u64; 5] = [1024, 4100, 1027, 1026, 44096];
    const B: [u64; 5] = [4096, 4097, 1025, 1026, 11024];

    #[test]
    fn mixed_resolution_overlap() {
        let overlap = uniq_intersection(&A, &B).unwrap();

        assert_eq!(
            overlap.iter().collect::<Vec<_>>(),
            vec![
                Overlap {
                    index_a: 4,
                    index_b: 4,
                    delta_order: -1
                },
                Overlap {
                    index_a: 3,
                    index_b: 3,
                    delta_order: 0
                },
                Overlap {
                    index_a: 0,
                    index_b: 0,
                    delta_order: 1
                },
                Overlap {
                    index_a: 0,
                    index_b: 1,
                    delta_order: 1
                },
                Overlap {
                    index_a: 1,
                    index_b: 2,
                    delta_order: -1
                },
            ]
        );
    }

    #[test]
    fn reversed_arguments_describe_the_same_overlap() {
        let forward = uniq_intersection(&A, &B).unwrap();
        let backward = uniq_intersection(&B, &A).unwrap();

        let mut expected: Vec<_> = forward.swapped().iter().map(|o| (o.index_a, o.index_b, o.delta_order)).collect();
        let mut actual: Vec<_> = backward.iter().map(|o| (o.index_a, o.index_b, o.delta_order)).collect();
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(actual, expected);
    }

    #[test]
    fn deep_containment_spans_empty_levels() {
        // 4 is base pixel 0; the other pixel is its first descendant at order 10.
        let deep = 4 << 20;
        let overlap = uniq_intersection(&[4, 6], &[deep, 6]).unwrap();

        assert_eq!(overlap.index_a, vec![1, 0]);
        assert_eq!(overlap.index_b, vec![1, 0]);
        assert_eq!(overlap.delta_order, vec![0, 10]);
    }

    #[test]
    fn disjoint_sets_do_not_intersect() {
        let overlap = uniq_intersection(&[4, 5], &[6, 28, 29]).unwrap();
        assert!(overlap.is_empty());
    }

    #[test]
    fn empty_inputs() {
        assert!(uniq_intersection(&[], &[]).unwrap().is_empty());
        assert!(uniq_intersection(&A, &[]).unwrap().is_empty());
        assert!(uniq_intersection(&[], &B).unwrap().is_empty());
    }

    #[test]
    fn single_base_pixel_matches_itself() {
        let overlap = uniq_intersection(&[4], &[4]).unwrap();
        assert_eq!(overlap.index_a, vec![0]);
        assert_eq!(overlap.index_b, vec![0]);
        assert_eq!(overlap.delta_order, vec![0]);
    }

    #[test]
    fn overlapping_input_is_rejected() {
        // 4100 lies inside 1025.
        assert_eq!(
            uniq_intersection(&[1025, 4100], &B),
            Err(SkyError::overlap("a", 1025, 4100))
        );
        assert_eq!(
            uniq_intersection(&A, &[1026, 1026]),
            Err(SkyError::overlap("b", 1026, 1026))
        );
    }

    #[test]
    fn sorted_intersection_strategies_agree() {
        let long: Vec<u64> = (100..1100).collect();
        let short = [99, 150, 151, 700, 5000];

        let mut merged = Vec::new();
        intersect_sorted(&long, &short, |i, j| merged.push((i, j)));
        assert_eq!(merged, vec![(50, 1), (51, 2), (600, 3)]);

        let mut swapped = Vec::new();
        intersect_sorted(&short, &long, |i, j| swapped.push((j, i)));
        assert_eq!(swapped, merged);

        let mut dense = Vec::new();
        intersect_sorted(&long[..10], &long[5..15], |i, j| dense.push((i, j)));
        assert_eq!(dense, (5..10).map(|i| (i, i - 5)).collect::<Vec<_>>());
    }
}
