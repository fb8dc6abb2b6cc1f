#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! Set algebra on multi-order HEALPix pixel sets ("partial sky maps").
//!
//! Every operation takes plain `&[u64]` NUNIQ index arrays, optionally with a parallel array of values, and returns freshly
//! allocated arrays. Inputs do not need to be sorted, but each must be a valid pixel set: no duplicates and no pixel inside
//! another.
//!
//! The building blocks are:
//!   - `LevelPartition`: sorts pixel sets and slices them by order
//!   - `uniq_intersection`: every overlapping pair of pixels between two sets
//!
//! And the operations built on them:
//!   - `uniq_minimize`: merges complete sibling quartets into their parent
//!   - `reraster`, `render` and `fill`: resample values from one tiling onto another
//!   - `uniq_diadic`: applies a binary function to two maps with different pixelizations
//!   - `uniq_coarsen`: lowers the resolution by a number of orders
//!   - `uniq_to_fixed` and `nest_reres`: conversions to and between single-order pixelizations

pub mod coarsen;
pub mod diadic;
pub mod fixed;
pub mod intersection;
pub mod minimize;
pub mod partition;
pub mod resample;

pub use coarsen::*;
pub use diadic::*;
pub use fixed::*;
pub use intersection::*;
pub use minimize::*;
pub use partition::*;
pub use resample::*;

pub mod prelude {
    pub use super::{
        fill, nest_reres, render, reraster, uniq_coarsen, uniq_diadic, uniq_intersection,
        uniq_minimize, uniq_minimize_by, uniq_minimize_indices, uniq_to_fixed, DiadicOptions,
        IntersectionResult, LevelPartition, MinimizeScratch, PartitionOptions, ResampleMethod,
        ResampleOptions, Resampled,
    };
}
