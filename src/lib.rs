//! Set algebra, compression and resampling for sparse, multi-order HEALPix sky maps in the NUNIQ encoding.
//!
//! A "partial sky map" is an array of NUNIQ pixel indices at mixed resolutions, none inside another, with a parallel array of
//! values. This library is organized into two crates:
//! - **core**: the NUNIQ index codec, the `PixelIndex` type, pixel set validation and the shared `SkyError`
//! - **algebra**: level partitioning, intersection, minimization, coarsening, resampling and binary operations on maps
//!
//! Everything works on plain slices, so maps read by any FITS or MOC loader can be passed straight in.
//!
//! ```
//! use skymoc::prelude::*;
//!
//! let u = [1024, 4100, 1027, 1026, 44096];
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let u_out = [4096, 4097, 1025, 1026, 11024];
//!
//! let r = reraster(&u, &x, &u_out, &ResampleOptions::default()).unwrap();
//! assert_eq!(r.values, vec![1.0, 1.0, 2.0, 4.0, 5.0]);
//! assert_eq!(PixelIndex(1025).order(), 4);
//! ```

pub use skymoc_algebra as algebra;
pub use skymoc_core as core;

pub mod prelude {
    pub use super::algebra::prelude::*;
    pub use super::core::prelude::*;
}
