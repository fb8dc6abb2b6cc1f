//! Bounded loss of resolution.

use skymoc_core::{check_valid_indices, order_unchecked, SkyResult};

use tracing::{debug, debug_span};

/// Lowers the resolution of `u` by `levels` orders: every pixel finer than `max_order(u) - levels` (floored at order 0) is
/// replaced by its ancestor at that order. The result is sorted and unique.
///
/// Coarsening a valid pixel set gives a valid pixel set. An overlapping input stays overlapping.
///
/// ```
/// use skymoc_algebra::uniq_coarsen;
///
/// let u = [4, 21, 80, 81, 353, 354, 355];
/// assert_eq!(uniq_coarsen(&u, 1).unwrap(), vec![4, 21, 80, 81, 88]);
/// assert_eq!(uniq_coarsen(&u, 2).unwrap(), vec![4, 20, 21, 22]);
/// ```
pub fn uniq_coarsen(u: &[u64], levels: u8) -> SkyResult<Vec<u64>> {
    let _span = debug_span!("uniq_coarsen", len = u.len(), levels).entered();

    check_valid_indices(u)?;

    let max_order = match u.iter().map(|&i| order_unchecked(i)).max() {
        Some(max) => max,
        None => return Ok(Vec::new()),
    };
    let out_order = max_order.saturating_sub(levels);

    let mut coarse: Vec<u64> = u
        .iter()
        .map(|&i| {
            let order = order_unchecked(i);
            if order > out_order {
                i >> (2 * u32::from(order - out_order))
            } else {
                i
            }
        })
        .collect();
    coarse.sort_unstable();
    coarse.dedup();
    debug!(max_order, out_order, len = coarse.len());

    Ok(coarse)
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
    use skymoc_core::is_non_overlapping;

    const U: [u64; 7] = [4, 21, 80, 81, 353, 354, 355];

    #[test]
    fn coarsen_by_levels() {
        assert_eq!(uniq_coarsen(&U, 0), Ok(U.to_vec()));
        assert_eq!(uniq_coarsen(&U, 1), Ok(vec![4, 21, 80, 81, 88]));
        assert_eq!(uniq_coarsen(&U, 2), Ok(vec![4, 20, 21, 22]));
        assert_eq!(uniq_coarsen(&U, 3), Ok(vec![4, 5]));
    }

    #[test]
    fn coarsening_past_order_zero_stops_there() {
        assert_eq!(uniq_coarsen(&U, 4), Ok(vec![4, 5]));
        assert_eq!(uniq_coarsen(&U, u8::MAX), Ok(vec![4, 5]));
    }

    #[test]
    fn output_stays_non_overlapping() {
        for levels in 0..4 {
            assert!(is_non_overlapping(&uniq_coarsen(&U, levels).unwrap()));
        }
    }

    #[test]
    fn unsorted_input() {
        assert_eq!(uniq_coarsen(&[355, 4, 81], 1), Ok(vec![4, 81, 88]));
    }

    #[test]
    fn empty_and_invalid_input() {
        assert_eq!(uniq_coarsen(&[], 2), Ok(vec![]));
        assert!(uniq_coarsen(&[4, 0], 1).is_err());
    }
}
