//! Validation of the pixel set invariant: no two pixels in a set may overlap.
//!
//! Overlap between pixels of different orders is not visible in the raw integers, so every pixel is mapped to the run of
//! `MAX_ORDER` leaves it covers. These runs are either nested or disjoint, so after sorting them by start (widest first on
//! ties) an overlap anywhere in the set always shows up between neighbors.

use crate::{check_valid_indices, PixelIndex, SkyError, SkyResult};

use itertools::Itertools;

/// Fails with `OverlapViolation` if any two pixels of `indices` overlap, including exact duplicates. `set` names the input in
/// the error. The input does not need to be sorted.
pub fn check_non_overlapping(set: &'static str, indices: &[u64]) -> SkyResult<()> {
    check_valid_indices(indices)?;

    let mut leaves: Vec<_> = indices
        .iter()
        .map(|&i| (PixelIndex(i).leaf_range(), i))
        .collect();
    leaves.sort_unstable_by(|(a, _), (b, _)| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    match leaves
        .iter()
        .tuple_windows()
        .find(|((outer, _), (inner, _))| inner.start < outer.end)
    {
        Some(((_, ancestor), (_, descendant))) => {
            Err(SkyError::overlap(set, *ancestor, *descendant))
        }
        None => Ok(()),
    }
}

/// True if `indices` are valid and mutually non-overlapping.
pub fn is_non_overlapping(indices: &[u64]) -> bool {
    check_non_overlapping("pixels", indices).is_ok()
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
