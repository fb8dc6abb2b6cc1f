//! Conversion between NUNIQ indices and `(x, y, face)` coordinates.
//!
//! Inside each of the 12 base faces, the NEST position is the Z-order (Morton) interleave of the face-local `x` and `y`
//! coordinates, with `x` in the even bits and `y` in the odd bits.

use crate::{first_index, nside_to_order, order_to_nside, PixelIndex, SkyError, SkyResult, BASE_PIXELS};

use morton_encoding::{morton_decode, morton_encode};

/// Face-local coordinates of a pixel.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Xyf {
    pub x: u32,
    pub y: u32,
    pub face: u8,
    pub nside: u64,
}

impl PixelIndex {
    /// Decompose into face-local coordinates.
    pub fn to_xyf(&self) -> Xyf {
        let order = self.order();
        let face_shift = 2 * order as u32;
        let nest = self.nest();
        let yx: [u32; 2] = morton_decode(nest & ((1 << face_shift) - 1));

        Xyf {
            x: yx[1],
            y: yx[0],
            face: (nest >> face_shift) as u8,
            nside: order_to_nside(order),
        }
    }

    /// Compose from face-local coordinates.
    pub fn from_xyf(xyf: Xyf) -> SkyResult<Self> {
        let order = nside_to_order(xyf.nside)?;
        if u64::from(xyf.face) >= BASE_PIXELS {
            return Err(SkyError::invalid_index(
                u64::from(xyf.face),
                "face number must be below 12",
            ));
        }
        if u64::from(xyf.x.max(xyf.y)) >= xyf.nside {
            return Err(SkyError::invalid_index(
                u64::from(xyf.x.max(xyf.y)),
                format!("face coordinate outside NSIDE {}", xyf.nside),
            ));
        }
        let in_face: u64 = morton_encode([xyf.y, xyf.x]);
        let nest = (u64::from(xyf.face) << (2 * order as u32)) | in_face;

        Ok(Self(first_index(order) + nest))
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

    #[test]
    fn first_pixel_of_face_one() {
        // NEST pixel 4 at NSIDE=2 is the first pixel of base face 1.
        assert_eq!(
            PixelIndex(20).to_xyf(),
            Xyf {
                x: 0,
                y: 0,
                face: 1,
                nside: 2
            }
        );
        // Index 8 is base pixel 4.
        assert_eq!(PixelIndex(8).to_xyf().face, 4);
    }

    #[test]
    fn x_occupies_even_bits() {
        let p = PixelIndex::from_xyf(Xyf {
            x: 1,
            y: 0,
            face: 0,
            nside: 2,
        })
        .unwrap();
        assert_eq!(p, PixelIndex(17));

        let p = PixelIndex::from_xyf(Xyf {
            x: 0,
            y: 1,
            face: 0,
            nside: 2,
        })
        .unwrap();
        assert_eq!(p, PixelIndex(18));
    }

    #[test]
    fn xyf_round_trip() {
        for index in 4..10_000 {
            let p = PixelIndex(index);
            assert_eq!(PixelIndex::from_xyf(p.to_xyf()), Ok(p));
        }
    }

    #[test]
    fn out_of_range_coordinates() {
        let bad_face = Xyf {
            x: 0,
            y: 0,
            face: 12,
            nside: 4,
        };
        assert!(PixelIndex::from_xyf(bad_face).is_err());

        let bad_x = Xyf {
            x: 4,
            y: 0,
            face: 0,
            nside: 4,
        };
        assert!(PixelIndex::from_xyf(bad_x).is_err());
    }
}
