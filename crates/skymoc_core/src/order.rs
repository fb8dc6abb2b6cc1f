//! Arithmetic on HEALPix orders and NSIDE values.
//!
//! An order `o` has `nside = 2^o` and `12 * 4^o` pixels. In NUNIQ encoding, the pixels of order `o` occupy the contiguous
//! range `[4^(o+1), 4^(o+2))`, so sorting NUNIQ indices also groups them by order, coarsest first.

use crate::{SkyError, SkyResult};

use std::f64::consts::PI;

/// The finest order whose NUNIQ indices fit in a `u64`.
pub const MAX_ORDER: u8 = 30;

/// Number of base (order 0) pixels.
pub const BASE_PIXELS: u64 = 12;

/// Solid angle of the whole sphere in steradians.
pub const SKY_AREA: f64 = 4.0 * PI;

/// The NSIDE of `order`.
#[inline]
pub fn order_to_nside(order: u8) -> u64 {
    debug_assert!(order <= MAX_ORDER);
    1 << order
}

/// The order of `nside`, which must be a power of 2 no greater than `2^MAX_ORDER`.
#[inline]
pub fn nside_to_order(nside: u64) -> SkyResult<u8> {
    if nside == 0 || !nside.is_power_of_two() || nside > order_to_nside(MAX_ORDER) {
        return Err(SkyError::invalid_nside(nside));
    }

    Ok(nside.trailing_zeros() as u8)
}

/// The smallest NUNIQ index at `order`, i.e. `encode(0, 2^order)`. This is the boundary between the runs of `order - 1` and
/// `order` in a sorted pixel set.
#[inline]
pub fn first_index(order: u8) -> u64 {
    4 << (2 * order as u32)
}

/// Number of pixels covering the sphere at `order`.
#[inline]
pub fn pixel_count(order: u8) -> u64 {
    BASE_PIXELS << (2 * order as u32)
}

/// Solid angle of a single pixel at `order`, in steradians.
#[inline]
pub fn pixel_area(order: u8) -> f64 {
    SKY_AREA / pixel_count(order) as f64
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

    #[test]
    fn nside_order_round_trip() {
        for order in 0..=MAX_ORDER {
            assert_eq!(nside_to_order(order_to_nside(order)), Ok(order));
        }
    }

    #[test]
    fn invalid_nside_is_rejected() {
        assert!(nside_to_order(0).is_err());
        assert!(nside_to_order(17).is_err());
        assert!(nside_to_order(1 << 31).is_err());
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(first_index(0), 4);
        assert_eq!(first_index(1), 16);
        assert_eq!(first_index(4), 1024);
        assert_eq!(first_index(5), 4096);
        // The last index of the finest order is the largest u64.
        assert_eq!(first_index(MAX_ORDER) + (pixel_count(MAX_ORDER) - 1), u64::MAX);
    }

    #[test]
    fn pixel_areas_tile_the_sphere() {
        assert!((pixel_area(0) * 12.0 - SKY_AREA).abs() < 1e-12);
        assert!((pixel_area(1) * 4.0 - pixel_area(0)).abs() < 1e-12);
    }
}
