//! Conversions between multi-order pixel sets and single-order (fixed resolution) pixels.

use skymoc_core::{
    check_valid_indices, order_unchecked, pixel_count, PixelIndex, SkyError, SkyResult, MAX_ORDER,
};

use itertools::Itertools;
use tracing::{debug, debug_span};

fn check_order(order: u8) -> SkyResult<()> {
    if order > MAX_ORDER {
        return Err(SkyError::invalid_configuration(format!(
            "order {} is finer than the maximum order {}",
            order, MAX_ORDER
        )));
    }

    Ok(())
}

/// The NUNIQ indices at `order` covering the same region as `u`, sorted and unique. Coarser pixels are split into their
/// descendants and finer pixels are replaced by their ancestor, so the result covers at least the region of `u`.
///
/// ```
/// use skymoc_algebra::uniq_to_fixed;
///
/// let u = [1024, 4100, 1026, 44096];
/// assert_eq!(
///     uniq_to_fixed(&u, 5).unwrap(),
///     vec![4096, 4097, 4098, 4099, 4100, 4104, 4105, 4106, 4107, 11024]
/// );
/// ```
pub fn uniq_to_fixed(u: &[u64], order: u8) -> SkyResult<Vec<u64>> {
    let _span = debug_span!("uniq_to_fixed", len = u.len(), order).entered();

    check_order(order)?;
    check_valid_indices(u)?;

    let mut fixed = Vec::with_capacity(u.len());
    for &i in u.iter() {
        let pixel_order = order_unchecked(i);
        if pixel_order <= order {
            fixed.extend(PixelIndex(i).descendants_at(order));
        } else {
            fixed.push(i >> (2 * u32::from(pixel_order - order)));
        }
    }
    fixed.sort_unstable();
    fixed.dedup();
    debug!(len = fixed.len());

    Ok(fixed)
}

/// Changes the order of NEST pixel positions from `order_in` to `order_out`.
///
/// Raising the resolution replaces every pixel by its descendants, keeping the input order. Lowering it returns the sorted,
/// unique ancestors together with a flag per ancestor that is `true` when all of its descendants at `order_in` were given.
///
/// ```
/// use skymoc_algebra::nest_reres;
///
/// assert_eq!(nest_reres(&[0, 1], 1, 2).unwrap(), (vec![0, 1, 2, 3, 4, 5, 6, 7], None));
/// assert_eq!(nest_reres(&[0, 1], 1, 0).unwrap(), (vec![0], Some(vec![false])));
/// ```
pub fn nest_reres(
    nest: &[u64],
    order_in: u8,
    order_out: u8,
) -> SkyResult<(Vec<u64>, Option<Vec<bool>>)> {
    check_order(order_in)?;
    check_order(order_out)?;
    let count = pixel_count(order_in);
    if let Some(&bad) = nest.iter().find(|&&n| n >= count) {
        return Err(SkyError::invalid_index(
            bad,
            format!("NEST position outside the sphere at order {}", order_in),
        ));
    }

    if order_out >= order_in {
        let shift = 2 * u32::from(order_out - order_in);
        let reres = nest
            .iter()
            .flat_map(|&n| (n << shift)..((n + 1) << shift))
            .collect();

        return Ok((reres, None));
    }

    let shift = 2 * u32::from(order_in - order_out);
    let mut unique = nest.to_vec();
    unique.sort_unstable();
    unique.dedup();

    let children_per_parent = 1usize << shift;
    let (parents, full) = unique
        .iter()
        .map(|&n| n >> shift)
        .dedup_with_count()
        .map(|(count, parent)| (parent, count == children_per_parent))
        .unzip();

    Ok((parents, Some(full)))
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
