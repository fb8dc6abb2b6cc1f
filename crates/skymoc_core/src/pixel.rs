//! The NUNIQ pixel index scheme.
//!
//! A NUNIQ index packs a HEALPix resolution and a NEST-ordered position into one integer:
//!
//! ```text
//! index = 4 * nside^2 + nest
//! ```
//!
//! Because NEST ordering keeps the four children of pixel `p` at `4p..4p+3`, the quad-tree is implicit in the integers: the
//! parent of an index is `index >> 2`, and the descendants `d` levels deeper are the run `[index << 2d, (index + 1) << 2d)`.
//! Everything here is plain 64-bit integer arithmetic.
//!
//! ```
//! use skymoc_core::{decode, encode, PixelIndex};
//!
//! assert_eq!(decode(540), Ok((284, 8)));
//! assert_eq!(encode(284, 8), Ok(540));
//!
//! let p = PixelIndex(540);
//! assert_eq!(p.order(), 3);
//! assert_eq!(p.parent(), Some(PixelIndex(135)));
//! ```

use crate::{first_index, nside_to_order, order_to_nside, pixel_count, SkyError, SkyResult, MAX_ORDER};

use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The smallest valid NUNIQ index (pixel 0 at order 0).
pub const MIN_INDEX: u64 = 4;

/// A single NUNIQ pixel index.
///
/// `PixelIndex` is `#[repr(transparent)]` over `u64`, so whole slices can be viewed either way without copying; see
/// `PixelIndex::cast_slice` and `PixelIndex::raw_slice`.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[repr(transparent)]
pub struct PixelIndex(pub u64);

impl fmt::Debug for PixelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        if self.is_valid() {
            write!(f, "{} (order {}, nest {})", self.0, self.order(), self.nest())
        } else {
            write!(f, "{} (invalid)", self.0)
        }
    }
}

impl From<PixelIndex> for u64 {
    #[inline]
    fn from(p: PixelIndex) -> Self {
        p.0
    }
}

impl PixelIndex {
    /// Validates `index`.
    #[inline]
    pub fn new(index: u64) -> SkyResult<Self> {
        check_valid_index(index)?;

        Ok(Self(index))
    }

    /// The pixel at `nest` position of `order`.
    #[inline]
    pub fn from_nest(nest: u64, order: u8) -> SkyResult<Self> {
        if order > MAX_ORDER {
            return Err(SkyError::invalid_index(
                nest,
                format!("order {} is finer than MAX_ORDER", order),
            ));
        }
        if nest >= pixel_count(order) {
            return Err(SkyError::invalid_index(
                nest,
                format!("NEST position outside the sphere at order {}", order),
            ));
        }

        Ok(Self(first_index(order) + nest))
    }

    /// View raw NUNIQ integers as `PixelIndex`es.
    #[inline]
    pub fn cast_slice(raw: &[u64]) -> &[Self] {
        bytemuck::cast_slice(raw)
    }

    /// View `PixelIndex`es as raw NUNIQ integers.
    #[inline]
    pub fn raw_slice(pixels: &[Self]) -> &[u64] {
        bytemuck::cast_slice(pixels)
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0 >= MIN_INDEX
    }

    #[inline]
    pub fn order(&self) -> u8 {
        order_unchecked(self.0)
    }

    #[inline]
    pub fn nside(&self) -> u64 {
        order_to_nside(self.order())
    }

    /// The NEST position at this pixel's own order.
    #[inline]
    pub fn nest(&self) -> u64 {
        self.0 - first_index(self.order())
    }

    /// Base pixels (order 0) have no parent.
    #[inline]
    pub fn parent(&self) -> Option<Self> {
        self.ancestor(1)
    }

    /// The ancestor `levels` orders coarser, if this pixel is at least that fine.
    #[inline]
    pub fn ancestor(&self, levels: u8) -> Option<Self> {
        if levels > self.order() {
            return None;
        }

        Some(Self(self.0 >> (2 * levels as u32)))
    }

    /// The four children, in NEST order. Pixels at `MAX_ORDER` have no children.
    #[inline]
    pub fn children(&self) -> Option<[Self; 4]> {
        if self.order() == MAX_ORDER {
            return None;
        }
        let first = self.0 << 2;

        Some([Self(first), Self(first + 1), Self(first + 2), Self(first + 3)])
    }

    /// The first descendant `levels` orders finer, if that order is representable.
    #[inline]
    pub fn first_descendant(&self, levels: u8) -> Option<Self> {
        self.order()
            .checked_add(levels)
            .filter(|&order| order <= MAX_ORDER)
            .map(|_| Self(self.0 << (2 * levels as u32)))
    }

    /// The NUNIQ indices of all descendants at `order`, which must be at least as fine as this pixel's order.
    #[inline]
    pub fn descendants_at(&self, order: u8) -> Range<u64> {
        debug_assert!(order >= self.order() && order <= MAX_ORDER);
        let shift = 2 * (order - self.order()) as u32;
        let start = self.nest() << shift;

        let first = first_index(order);

        (first + start)..(first + ((self.nest() + 1) << shift))
    }

    /// NEST positions covered by this pixel at `MAX_ORDER`. Two pixels overlap iff these ranges intersect.
    #[inline]
    pub fn leaf_range(&self) -> Range<u64> {
        let shift = 2 * (MAX_ORDER - self.order()) as u32;

        (self.nest() << shift)..((self.nest() + 1) << shift)
    }

    /// True if `other` is this pixel or one of its descendants.
    #[inline]
    pub fn contains(&self, other: PixelIndex) -> bool {
        let (mine, theirs) = (self.order(), other.order());

        theirs >= mine && other.0 >> (2 * (theirs - mine) as u32) == self.0
    }
}

/// Fails with `InvalidIndex` if `index <= 3`.
#[inline]
pub fn check_valid_index(index: u64) -> SkyResult<()> {
    if index < MIN_INDEX {
        return Err(SkyError::invalid_index(index, "NUNIQ indices start at 4"));
    }

    Ok(())
}

/// Fails with `InvalidIndex` on the first index `<= 3`.
pub fn check_valid_indices(indices: &[u64]) -> SkyResult<()> {
    match indices.iter().find(|&&i| i < MIN_INDEX) {
        Some(&bad) => check_valid_index(bad),
        None => Ok(()),
    }
}

/// The order of a valid NUNIQ `index`. Indices below 4 produce garbage, so validate them first.
#[inline]
pub fn order_unchecked(index: u64) -> u8 {
    debug_assert!(index >= MIN_INDEX);
    // index lies in [4^(order+1), 4^(order+2)), so floor(log2(index)) / 2 == order + 1.
    ((63 - index.leading_zeros()) / 2 - 1) as u8
}

/// The HEALPix order of `index`.
#[inline]
pub fn order(index: u64) -> SkyResult<u8> {
    check_valid_index(index)?;

    Ok(order_unchecked(index))
}

/// The NSIDE of `index`.
#[inline]
pub fn nside(index: u64) -> SkyResult<u64> {
    order(index).map(order_to_nside)
}

/// Split `index` into its NEST position and NSIDE.
#[inline]
pub fn decode(index: u64) -> SkyResult<(u64, u64)> {
    let order = order(index)?;

    Ok((index - first_index(order), order_to_nside(order)))
}

/// Pack a NEST position at `nside` into a NUNIQ index.
#[inline]
pub fn encode(nest: u64, nside: u64) -> SkyResult<u64> {
    let order = nside_to_order(nside)?;

    PixelIndex::from_nest(nest, order).map(|p| p.0)
}

/// Bulk `order` over a slice.
pub fn orders(indices: &[u64]) -> SkyResult<Vec<u8>> {
    check_valid_indices(indices)?;

    Ok(indices.iter().map(|&i| order_unchecked(i)).collect())
}

/// Bulk `decode` over a slice, returning the NEST positions and NSIDEs as parallel arrays.
pub fn decode_all(indices: &[u64]) -> SkyResult<(Vec<u64>, Vec<u64>)> {
    check_valid_indices(indices)?;

    let mut nest = Vec::with_capacity(indices.len());
    let mut nsides = Vec::with_capacity(indices.len());
    for &i in indices {
        let order = order_unchecked(i);
        nest.push(i - first_index(order));
        nsides.push(order_to_nside(order));
    }

    Ok((nest, nsides))
}

/// Bulk `encode` of NEST positions that all share one `nside`.
pub fn encode_all(nest: &[u64], nside: u64) -> SkyResult<Vec<u64>> {
    let order = nside_to_order(nside)?;
    let count = pixel_count(order);
    if let Some(&bad) = nest.iter().find(|&&n| n >= count) {
        return Err(SkyError::invalid_index(
            bad,
            format!("NEST position outside the sphere at order {}", order),
        ));
    }
    let offset = first_index(order);

    Ok(nest.iter().map(|&n| n + offset).collect())
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
    use rand::Rng;

    #[test]
    fn known_indices() {
        let uniq = [540, 542, 543, 266, 264, 258, 535, 534, 541];
        let nest = [284, 286, 287, 10, 8, 2, 279, 278, 285];

        let (decoded, nsides) = decode_all(&uniq).unwrap();
        assert_eq!(decoded, nest.to_vec());
        assert_eq!(nsides, vec![8; 9]);

        assert_eq!(encode_all(&nest, 8).unwrap(), uniq.to_vec());
    }

    #[test]
    fn orders_at_level_boundaries() {
        assert_eq!(order(4), Ok(0));
        assert_eq!(order(15), Ok(0));
        assert_eq!(order(16), Ok(1));
        assert_eq!(order(63), Ok(1));
        assert_eq!(order(1024), Ok(4));
        assert_eq!(order(44096), Ok(6));
        assert_eq!(order(u64::MAX), Ok(MAX_ORDER));
        assert_eq!(nside(1024), Ok(16));
    }

    #[test]
    fn small_indices_are_invalid() {
        for i in 0..4 {
            assert!(matches!(order(i), Err(SkyError::InvalidIndex { .. })));
            assert!(decode(i).is_err());
        }
        assert!(orders(&[4, 5, 3]).is_err());
    }

    #[test]
    fn encode_rejects_bad_input() {
        assert!(matches!(encode(0, 3), Err(SkyError::InvalidNside { .. })));
        assert!(matches!(encode(12, 1), Err(SkyError::InvalidIndex { .. })));
        assert!(encode_all(&[0, 48], 2).is_err());
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let order = rng.gen_range(0..=MAX_ORDER);
            let nest = rng.gen_range(0..pixel_count(order));
            let nside = order_to_nside(order);

            let index = encode(nest, nside).unwrap();
            assert_eq!(decode(index), Ok((nest, nside)));
            assert_eq!(encode(nest, nside), Ok(index));
        }
    }

    #[test]
    fn tree_navigation() {
        let p = PixelIndex(1025);
        assert_eq!(p.parent(), Some(PixelIndex(256)));
        assert_eq!(p.ancestor(4), Some(PixelIndex(4)));
        assert_eq!(p.ancestor(5), None);
        assert_eq!(PixelIndex(4).parent(), None);

        let children = p.children().unwrap();
        assert_eq!(PixelIndex::raw_slice(&children), &[4100, 4101, 4102, 4103]);
        assert!(children.iter().all(|&c| p.contains(c)));
        assert!(!children[0].contains(p));
        assert!(p.contains(p));

        assert_eq!(p.descendants_at(6), 16400..16416);
        assert_eq!(p.first_descendant(2), Some(PixelIndex(16400)));
        assert_eq!(PixelIndex(u64::MAX).first_descendant(1), None);
        assert_eq!(PixelIndex(u64::MAX).first_descendant(250), None);
        assert_eq!(PixelIndex(4).first_descendant(u8::MAX), None);
        assert_eq!(PixelIndex(5).leaf_range(), (1 << 60)..(2 << 60));
    }

    #[test]
    fn cast_slices_without_copying() {
        let raw = [4, 21, 80];
        let pixels = PixelIndex::cast_slice(&raw);
        assert_eq!(pixels[1].order(), 1);
        assert_eq!(PixelIndex::raw_slice(pixels).as_ptr(), raw.as_ptr());
    }
}
