//! The core data types for multi-order HEALPix sky tilings:
//! - `PixelIndex`: a NUNIQ pixel index, which encodes both the order (resolution) and NEST position of a pixel
//! - the NUNIQ codec (`encode`, `decode`, `order`, `nside`) and its bulk variants over slices
//! - `Xyf`: face-local coordinates of a pixel
//! - validation of the "pixel set" invariant (valid, unique and mutually non-overlapping pixels)
//! - `SkyError`, the error type shared by every crate in the workspace

pub mod error;
pub mod order;
pub mod pixel;
pub mod validate;
pub mod xyf;

pub use error::{check_same_length, SkyError, SkyResult};
pub use order::{
    first_index, nside_to_order, order_to_nside, pixel_area, pixel_count, BASE_PIXELS, MAX_ORDER,
    SKY_AREA,
};
pub use pixel::{
    check_valid_index, check_valid_indices, decode, decode_all, encode, encode_all, nside, order,
    order_unchecked, orders, PixelIndex, MIN_INDEX,
};
pub use validate::{check_non_overlapping, is_non_overlapping};
pub use xyf::Xyf;

pub mod prelude {
    pub use super::{
        decode, encode, first_index, nside, order, order_to_nside, PixelIndex, SkyError,
        SkyResult, Xyf, MAX_ORDER,
    };
}
