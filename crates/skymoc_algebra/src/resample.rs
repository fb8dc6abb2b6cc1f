//! Transfer of pixel values from one tiling onto another.
//!
//! A source map `(u, x)` is resampled onto target pixels `u_out` by walking the intersection of the two sets. How the
//! contributions of several source pixels are reduced into one target value is chosen by `ResampleMethod`.
//!
//! ```
//! use skymoc_algebra::{reraster, ResampleOptions};
//!
//! let u = [1024, 4100, 1027, 1026, 44096];
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let u_out = [4096, 4097, 1025, 1026, 11024];
//!
//! let forward = reraster(&u, &x, &u_out, &ResampleOptions::default()).unwrap();
//! assert_eq!(forward.values, vec![1.0, 1.0, 2.0, 4.0, 5.0]);
//!
//! // 1027 has no counterpart in the other direction.
//! let backward = reraster(&u_out, &x, &u, &ResampleOptions::default().pad(0.0)).unwrap();
//! assert_eq!(backward.values, vec![1.5, 3.0, 0.0, 4.0, 5.0]);
//! ```

use crate::{uniq_intersection, IntersectionResult};

use skymoc_core::{
    check_same_length, check_valid_indices, first_index, nside_to_order, pixel_count, SkyError,
    SkyResult,
};

use num::ToPrimitive;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, debug_span, trace};

/// Marker for unobserved pixels in full-sky maps, understood by HEALPix plotting tools.
pub const UNSEEN: f64 = -1.6375e30;

/// How the source pixels overlapping one target pixel are reduced to a value.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResampleMethod {
    /// Area-weighted mean. Use for intensive quantities like densities.
    Average,
    /// Area-proportional total. Use for extensive quantities like probabilities per pixel.
    Sum,
    /// Plain assignment. Only valid when no target pixel is coarser than a source pixel it overlaps.
    Copy,
}

impl Default for ResampleMethod {
    fn default() -> Self {
        ResampleMethod::Average
    }
}

impl ResampleMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResampleMethod::Average => "average",
            ResampleMethod::Sum => "sum",
            ResampleMethod::Copy => "copy",
        }
    }
}

impl fmt::Display for ResampleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResampleMethod {
    type Err = SkyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "average" => Ok(ResampleMethod::Average),
            "sum" => Ok(ResampleMethod::Sum),
            "copy" => Ok(ResampleMethod::Copy),
            other => Err(SkyError::unsupported_reduction(
                other,
                "expected one of \"average\", \"sum\" or \"copy\"",
            )),
        }
    }
}

/// Resampling configuration. The default averages and fails on any target pixel the source does not cover.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResampleOptions {
    pub method: ResampleMethod,
    /// Value of target pixels with no source coverage.
    pub pad: Option<f64>,
    /// Tolerate uncovered target pixels and flag them in `Resampled::mask`.
    pub mask_missing: bool,
    /// Look for uncovered target pixels at all. Turning this off is only allowed without `pad` and `mask_missing`, and
    /// leaves uncovered values undefined (`NaN` for averages, `0` otherwise).
    pub check_missing: bool,
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self {
            method: ResampleMethod::default(),
            pad: None,
            mask_missing: false,
            check_missing: true,
        }
    }
}

impl ResampleOptions {
    pub fn method(mut self, method: ResampleMethod) -> Self {
        self.method = method;

        self
    }

    pub fn pad(mut self, pad: f64) -> Self {
        self.pad = Some(pad);

        self
    }

    pub fn mask_missing(mut self, mask_missing: bool) -> Self {
        self.mask_missing = mask_missing;

        self
    }

    pub fn check_missing(mut self, check_missing: bool) -> Self {
        self.check_missing = check_missing;

        self
    }

    pub fn validate(&self) -> SkyResult<()> {
        if !self.check_missing && (self.pad.is_some() || self.mask_missing) {
            return Err(SkyError::invalid_configuration(
                "check_missing = false is not compatible with pad or mask_missing",
            ));
        }

        Ok(())
    }
}

/// One value per target pixel, plus a mask that is `true` where the target was not covered (only with `mask_missing`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resampled {
    pub values: Vec<f64>,
    pub mask: Option<Vec<bool>>,
}

/// Resamples the map `(u, x)` onto the pixels `u_out`.
///
/// Parts of the source outside `u_out` are dropped, so this also masks a map to a region. Values are promoted to `f64`.
pub fn reraster<V>(
    u: &[u64],
    x: &[V],
    u_out: &[u64],
    options: &ResampleOptions,
) -> SkyResult<Resampled>
where
    V: ToPrimitive,
{
    let _span = debug_span!("reraster", len = u.len(), len_out = u_out.len()).entered();

    check_same_length("reraster values", u.len(), x.len())?;
    options.validate()?;
    let intersection = uniq_intersection(u, u_out)?;

    reraster_with_intersection(x, u_out, &intersection, options)
}

/// Like `reraster`, with `intersection = uniq_intersection(u, u_out)` computed by the caller. The intersection is only
/// checked to index within `x` and `u_out`.
pub fn reraster_with_intersection<V>(
    x: &[V],
    u_out: &[u64],
    intersection: &IntersectionResult,
    options: &ResampleOptions,
) -> SkyResult<Resampled>
where
    V: ToPrimitive,
{
    options.validate()?;
    check_intersection_bounds(intersection, x.len(), u_out.len())?;

    let x: Vec<f64> = x
        .iter()
        .map(|v| v.to_f64().unwrap_or(std::f64::NAN))
        .collect();
    let mut values = vec![0.0; u_out.len()];

    match options.method {
        ResampleMethod::Average => {
            let mut weights = vec![0.0; u_out.len()];
            for overlap in intersection.iter() {
                // A source pixel `d` orders finer than its target covers 4^-d of it.
                let weight = if overlap.delta_order < 0 {
                    0.25f64.powi(-i32::from(overlap.delta_order))
                } else {
                    1.0
                };
                values[overlap.index_b] += weight * x[overlap.index_a];
                weights[overlap.index_b] += weight;
            }
            for (v, w) in values.iter_mut().zip(weights.iter()) {
                *v /= w;
            }
        }
        ResampleMethod::Sum => {
            for overlap in intersection.iter() {
                // A source pixel `d` orders coarser than its target puts 4^-d of its total there.
                let share = if overlap.delta_order > 0 {
                    0.25f64.powi(i32::from(overlap.delta_order))
                } else {
                    1.0
                };
                values[overlap.index_b] += share * x[overlap.index_a];
            }
        }
        ResampleMethod::Copy => {
            if let Some(overlap) = intersection.iter().find(|o| o.delta_order < 0) {
                return Err(SkyError::unsupported_reduction(
                    ResampleMethod::Copy.as_str(),
                    format!(
                        "target pixel {} is coarser than an overlapping source pixel",
                        u_out[overlap.index_b]
                    ),
                ));
            }
            for overlap in intersection.iter() {
                values[overlap.index_b] = x[overlap.index_a];
            }
        }
    }

    let mut mask = None;
    if options.check_missing {
        let mut covered = vec![false; u_out.len()];
        for &i in intersection.index_b.iter() {
            covered[i] = true;
        }
        let num_missing = covered.iter().filter(|&&c| !c).count();
        trace!(num_missing);

        if num_missing > 0 && options.pad.is_none() && !options.mask_missing {
            let first = covered.iter().position(|&c| !c).map_or(0, |i| u_out[i]);
            return Err(SkyError::missing_coverage(num_missing, first));
        }
        let pad = options.pad.unwrap_or(0.0);
        for (v, &c) in values.iter_mut().zip(covered.iter()) {
            if !c {
                *v = pad;
            }
        }
        if options.mask_missing {
            mask = Some(covered.into_iter().map(|c| !c).collect());
        }
    }
    debug!(method = options.method.as_str(), len = values.len());

    Ok(Resampled { values, mask })
}

fn check_intersection_bounds(
    intersection: &IntersectionResult,
    source_len: usize,
    target_len: usize,
) -> SkyResult<()> {
    check_same_length(
        "intersection target indices",
        intersection.len(),
        intersection.index_b.len(),
    )?;
    check_same_length(
        "intersection source indices",
        intersection.len(),
        intersection.index_a.len(),
    )?;
    if let Some(&bad) = intersection.index_a.iter().find(|&&i| i >= source_len) {
        return Err(SkyError::shape_mismatch(
            "intersection source indices",
            source_len,
            bad + 1,
        ));
    }
    if let Some(&bad) = intersection.index_b.iter().find(|&&i| i >= target_len) {
        return Err(SkyError::shape_mismatch(
            "intersection target indices",
            target_len,
            bad + 1,
        ));
    }

    Ok(())
}

/// Resamples `(u, x)` onto target pixels that may repeat, as produced by projecting a map onto an image grid.
///
/// When `valid` is given, the result has one value per element of `valid`: positions where it is `true` take the resampled
/// values of `u_out` in order, the others are `NaN` (and masked when masking). The number of `true` elements must equal
/// `u_out.len()`.
pub fn render<V>(
    u: &[u64],
    x: &[V],
    u_out: &[u64],
    valid: Option<&[bool]>,
    options: &ResampleOptions,
) -> SkyResult<Resampled>
where
    V: ToPrimitive,
{
    let _span = debug_span!("render", len = u.len(), len_out = u_out.len()).entered();

    check_valid_indices(u_out)?;
    if let Some(valid) = valid {
        let num_valid = valid.iter().filter(|&&v| v).count();
        check_same_length("render valid pixels", u_out.len(), num_valid)?;
    }

    let mut unique = u_out.to_vec();
    unique.sort_unstable();
    unique.dedup();
    trace!(unique = unique.len());

    let resampled = reraster(u, x, &unique, options)?;
    let positions: Vec<usize> = u_out
        .iter()
        .map(|i| unique.binary_search(i).unwrap_or_default())
        .collect();

    let values: Vec<f64> = positions.iter().map(|&p| resampled.values[p]).collect();
    let mask: Option<Vec<bool>> = resampled
        .mask
        .as_ref()
        .map(|m| positions.iter().map(|&p| m[p]).collect());

    let valid = match valid {
        Some(valid) => valid,
        None => return Ok(Resampled { values, mask }),
    };

    let mut grid_values = vec![std::f64::NAN; valid.len()];
    let mut grid_mask = mask.as_ref().map(|_| vec![true; valid.len()]);
    let valid_positions = valid
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v)
        .map(|(i, _)| i);
    for (k, i) in valid_positions.enumerate() {
        grid_values[i] = values[k];
        if let (Some(grid_mask), Some(mask)) = (grid_mask.as_mut(), mask.as_ref()) {
            grid_mask[i] = mask[k];
        }
    }

    Ok(Resampled {
        values: grid_values,
        mask: grid_mask,
    })
}

/// Rasterizes `(u, x)` into a full-sky map at fixed `nside`, in NEST order. Uncovered pixels take `pad`, or `UNSEEN` if
/// none is given.
pub fn fill<V>(u: &[u64], x: &[V], nside: u64, pad: Option<f64>) -> SkyResult<Vec<f64>>
where
    V: ToPrimitive,
{
    let order = nside_to_order(nside)?;
    let first = first_index(order);
    let u_out: Vec<u64> = (first..first + pixel_count(order)).collect();
    let options = ResampleOptions::default().pad(pad.unwrap_or(UNSEEN));

    reraster(u, x, &u_out, &options).map(|r| r.values)
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
    use utilities::test::approx_eq;

    const U: [u64; 5] = [1024, 4100, 1027, 1026, 44096];
    const X: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
    const U_OUT: [u64; 5] = [4096, 4097, 1025, 1026, 11024];

    #[test]
    fn average_onto_mixed_resolution() {
        let r = reraster(&U, &X, &U_OUT, &ResampleOptions::default()).unwrap();
        assert_eq!(r.values, vec![1.0, 1.0, 2.0, 4.0, 5.0]);
        assert_eq!(r.mask, None);
    }

    #[test]
    fn average_is_weighted_by_area() {
        // 1024 covers a quarter of 256; 4100..=4103 cover another quarter between them.
        let u = [1024, 4100, 4101, 4102, 4103];
        let x = [1.0, 2.0, 2.0, 2.0, 2.0];
        let r = reraster(&u, &x, &[256], &ResampleOptions::default()).unwrap();
        assert_eq!(r.values, vec![1.5]);

        // Three source orders under one target: weights 1/4, 4 x 1/16 and 1/64.
        let u = [1024, 4100, 4101, 4102, 4103, 16416];
        let x = [1.0, 2.0, 2.0, 2.0, 2.0, 10.0];
        let r = reraster(&u, &x, &[256], &ResampleOptions::default()).unwrap();
        let expected = (0.25 + 0.5 + 10.0 / 64.0) / (0.5 + 1.0 / 64.0);
        assert!(approx_eq(r.values[0], expected));
    }

    #[test]
    fn missing_coverage() {
        assert_eq!(
            reraster(&U_OUT, &X, &U, &ResampleOptions::default()),
            Err(SkyError::missing_coverage(1, 1027))
        );

        let padded = reraster(&U_OUT, &X, &U, &ResampleOptions::default().pad(0.0)).unwrap();
        assert_eq!(padded.values, vec![1.5, 3.0, 0.0, 4.0, 5.0]);

        let masked =
            reraster(&U_OUT, &X, &U, &ResampleOptions::default().mask_missing(true)).unwrap();
        assert_eq!(masked.values, vec![1.5, 3.0, 0.0, 4.0, 5.0]);
        assert_eq!(masked.mask, Some(vec![false, false, true, false, false]));

        let both = ResampleOptions::default().pad(-1.0).mask_missing(true);
        let masked = reraster(&U_OUT, &X, &U, &both).unwrap();
        assert_eq!(masked.values, vec![1.5, 3.0, -1.0, 4.0, 5.0]);
    }

    #[test]
    fn unchecked_missing_values_are_undefined() {
        let options = ResampleOptions::default().check_missing(false);
        let r = reraster(&U_OUT, &X, &U, &options).unwrap();
        assert!(r.values[2].is_nan());
        assert_eq!(r.values[1], 3.0);

        let r = reraster(&U_OUT, &X, &U, &options.method(ResampleMethod::Sum)).unwrap();
        assert_eq!(r.values[2], 0.0);
    }

    #[test]
    fn unchecked_missing_conflicts_with_pad_or_mask() {
        let options = ResampleOptions::default().check_missing(false).pad(0.0);
        assert!(matches!(
            reraster(&U, &X, &U_OUT, &options),
            Err(SkyError::InvalidConfiguration { .. })
        ));
        let options = ResampleOptions::default()
            .check_missing(false)
            .mask_missing(true);
        assert!(options.validate().is_err());
    }

    #[test]
    fn sum_conserves_totals() {
        let options = ResampleOptions::default().method(ResampleMethod::Sum);
        let r = reraster(&U, &X, &U_OUT, &options).unwrap();
        // Only half of 1024 lies inside the targets.
        assert_eq!(r.values, vec![0.25, 0.25, 2.0, 4.0, 5.0]);
        assert_eq!(r.values.iter().sum::<f64>(), 11.5);

        let r = reraster(&U_OUT, &X, &U, &options.pad(0.0)).unwrap();
        assert_eq!(r.values, vec![3.0, 0.75, 0.0, 4.0, 1.25]);
    }

    #[test]
    fn copy_to_finer_targets() {
        let options = ResampleOptions::default().method(ResampleMethod::Copy);
        let r = reraster(&[1025, 1026], &[3, 4], &[4100, 4101, 1026], &options).unwrap();
        assert_eq!(r.values, vec![3.0, 3.0, 4.0]);

        assert!(matches!(
            reraster(&U, &X, &U_OUT, &options),
            Err(SkyError::UnsupportedReduction { .. })
        ));
    }

    #[test]
    fn integer_values_are_promoted() {
        let x: [u8; 5] = [1, 2, 3, 4, 5];
        let r = reraster(&U_OUT, &x, &U, &ResampleOptions::default().pad(0.0)).unwrap();
        assert_eq!(r.values, vec![1.5, 3.0, 0.0, 4.0, 5.0]);
    }

    #[test]
    fn parse_methods() {
        assert_eq!("average".parse::<ResampleMethod>(), Ok(ResampleMethod::Average));
        assert_eq!("sum".parse::<ResampleMethod>(), Ok(ResampleMethod::Sum));
        assert_eq!("copy".parse::<ResampleMethod>(), Ok(ResampleMethod::Copy));
        assert!(matches!(
            "median".parse::<ResampleMethod>(),
            Err(SkyError::UnsupportedReduction { .. })
        ));
        assert_eq!(ResampleMethod::Sum.to_string(), "sum");
    }

    #[test]
    fn precomputed_intersection() {
        let intersection = uniq_intersection(&U, &U_OUT).unwrap();
        let r = reraster_with_intersection(&X, &U_OUT, &intersection, &ResampleOptions::default())
            .unwrap();
        assert_eq!(r.values, vec![1.0, 1.0, 2.0, 4.0, 5.0]);

        assert!(matches!(
            reraster_with_intersection(&X[..2], &U_OUT, &intersection, &ResampleOptions::default()),
            Err(SkyError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn value_length_must_match() {
        assert_eq!(
            reraster(&U, &X[..3], &U_OUT, &ResampleOptions::default()),
            Err(SkyError::shape_mismatch("reraster values", 5, 3))
        );
    }

    #[test]
    fn render_repeated_targets() {
        let u_out = [1026, 4096, 1026, 11024];
        let r = render(&U, &X, &u_out, None, &ResampleOptions::default()).unwrap();
        assert_eq!(r.values, vec![4.0, 1.0, 4.0, 5.0]);
    }

    #[test]
    fn render_onto_grid() {
        let u_out = [1026, 4096, 1026, 11024];
        let valid = [true, false, true, true, false, true];
        let r = render(&U, &X, &u_out, Some(&valid), &ResampleOptions::default()).unwrap();
        assert_eq!(r.values.len(), 6);
        assert!(r.values[1].is_nan() && r.values[4].is_nan());
        assert_eq!(
            [r.values[0], r.values[2], r.values[3], r.values[5]],
            [4.0, 1.0, 4.0, 5.0]
        );
        assert_eq!(r.mask, None);

        let options = ResampleOptions::default().mask_missing(true);
        let u_out = [1026, 4096, 1027, 11024];
        let r = render(&U_OUT, &X, &u_out, Some(&valid), &options).unwrap();
        assert_eq!(r.mask, Some(vec![false, true, false, true, true, false]));

        assert!(matches!(
            render(&U, &X, &u_out[..3], Some(&valid), &ResampleOptions::default()),
            Err(SkyError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn fill_full_sky() {
        let u: Vec<u64> = (4..16).collect();
        let x: Vec<f64> = (0..12).map(f64::from).collect();
        assert_eq!(fill(&u, &x, 1, None), Ok(x.clone()));

        let doubled = fill(&u, &x, 2, None).unwrap();
        assert_eq!(doubled.len(), 48);
        assert_eq!(&doubled[..8], &[0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);

        let partial = fill(&[4], &[7.0], 1, None).unwrap();
        assert_eq!(partial[0], 7.0);
        assert!(partial[1..].iter().all(|&v| v == UNSEEN));

        assert!(fill(&[4], &[7.0], 3, None).is_err());
    }
}
