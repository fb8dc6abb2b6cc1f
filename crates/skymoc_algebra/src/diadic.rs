//! Binary operations between two maps with unrelated pixelizations.
//!
//! The overlap of the two maps is split into three groups by the order difference of each matched pair:
//!
//! - equal orders: `f` is applied to the two values directly
//! - pixels of the first map finer than the second
//! - pixels of the second map finer than the first
//!
//! For each of the last two groups one side is resampled onto the other. With `coarsen`, the finer pixels are averaged
//! down onto the coarser ones; otherwise the coarser values are copied onto the finer pixels.

use crate::{reraster_with_intersection, uniq_intersection, IntersectionResult, Overlap};
use crate::{ResampleMethod, ResampleOptions};

use skymoc_core::{check_same_length, PixelIndex, SkyError, SkyResult};

use itertools::Itertools;
use num::ToPrimitive;
use tracing::{debug, debug_span, trace};

/// Configuration for `uniq_diadic`. The default keeps the finest resolution of either map and only covers the region both
/// maps define.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DiadicOptions {
    /// Value for regions defined by only one of the maps. Without it those regions are left out.
    pub pad: Option<f64>,
    /// Use the coarser pixelization wherever the maps disagree.
    pub coarsen: bool,
    /// Reduction used to resample one map onto the other. Defaults to `Average` when coarsening and `Copy` otherwise.
    pub method: Option<ResampleMethod>,
}

impl DiadicOptions {
    pub fn pad(mut self, pad: f64) -> Self {
        self.pad = Some(pad);

        self
    }

    pub fn coarsen(mut self, coarsen: bool) -> Self {
        self.coarsen = coarsen;

        self
    }

    pub fn method(mut self, method: ResampleMethod) -> Self {
        self.method = Some(method);

        self
    }

    /// The reduction that will be used. Copying onto coarser pixels is rejected with `UnsupportedReduction`.
    pub fn resample_method(&self) -> SkyResult<ResampleMethod> {
        match (self.method, self.coarsen) {
            (Some(ResampleMethod::Copy), true) => Err(SkyError::unsupported_reduction(
                ResampleMethod::Copy.as_str(),
                "cannot copy values onto coarser pixels; use average or sum with coarsen",
            )),
            (Some(method), _) => Ok(method),
            (None, true) => Ok(ResampleMethod::Average),
            (None, false) => Ok(ResampleMethod::Copy),
        }
    }
}

struct ValuedPixels<'a> {
    u: &'a [u64],
    x: Vec<f64>,
}

impl<'a> ValuedPixels<'a> {
    fn new<V: ToPrimitive>(what: &'static str, u: &'a [u64], x: &[V]) -> SkyResult<Self> {
        check_same_length(what, u.len(), x.len())?;

        Ok(Self {
            u,
            x: x.iter()
                .map(|v| v.to_f64().unwrap_or(std::f64::NAN))
                .collect(),
        })
    }
}

/// Applies `f(x1, x2)` over the common region of the maps `(u1, x1)` and `(u2, x2)`, returning the result as a new map sorted
/// by pixel. `f` always receives the value of the first map as its first argument.
///
/// `f` should not depend on resolution (a product of densities is fine, a product of per-pixel probabilities is not).
///
/// ```
/// use skymoc_algebra::{uniq_diadic, DiadicOptions};
///
/// let u1 = [1024, 4100, 1027, 1026, 44096];
/// let x1 = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let u2 = [4096, 4097, 1025, 1026, 11024];
/// let x2 = [0.0, 10.0, 1.0, 100.0, 1000.0];
///
/// let first = (&u1[..], &x1[..]);
/// let second = (&u2[..], &x2[..]);
///
/// let (u, y) = uniq_diadic(|a, b| a * b, first, second, &DiadicOptions::default()).unwrap();
/// assert_eq!(u, vec![1026, 4096, 4097, 4100, 44096]);
/// assert_eq!(y, vec![400.0, 0.0, 10.0, 2.0, 5000.0]);
///
/// let options = DiadicOptions::default().coarsen(true);
/// let (u, y) = uniq_diadic(|a, b| a * b, first, second, &options).unwrap();
/// assert_eq!(u, vec![1024, 1025, 1026, 11024]);
/// assert_eq!(y, vec![5.0, 2.0, 400.0, 5000.0]);
/// ```
pub fn uniq_diadic<V, W, F>(
    mut f: F,
    first: (&[u64], &[V]),
    second: (&[u64], &[W]),
    options: &DiadicOptions,
) -> SkyResult<(Vec<u64>, Vec<f64>)>
where
    V: ToPrimitive,
    W: ToPrimitive,
    F: FnMut(f64, f64) -> f64,
{
    let _span = debug_span!(
        "uniq_diadic",
        len_first = first.0.len(),
        len_second = second.0.len(),
        coarsen = options.coarsen
    )
    .entered();

    let maps = [
        ValuedPixels::new("first map values", first.0, first.1)?,
        ValuedPixels::new("second map values", second.0, second.1)?,
    ];
    let method = options.resample_method()?;
    let intersection = uniq_intersection(maps[0].u, maps[1].u)?;

    let mut u_y = Vec::with_capacity(intersection.len());
    let mut y = Vec::with_capacity(intersection.len());

    for overlap in intersection.iter().filter(|o| o.delta_order == 0) {
        u_y.push(maps[0].u[overlap.index_a]);
        y.push(f(maps[0].x[overlap.index_a], maps[1].x[overlap.index_b]));
    }
    trace!(same_order = u_y.len());

    for &finer in [0, 1].iter() {
        let group = finer_group(&intersection, finer);
        if group.is_empty() {
            continue;
        }
        let target = if options.coarsen { 1 - finer } else { finer };
        let source = 1 - target;

        let mut targets: Vec<usize> = group.iter().map(|o| position(o, target)).collect();
        targets.sort_unstable();
        targets.dedup();

        let mut sub_intersection = IntersectionResult::with_capacity(group.len());
        for overlap in group.iter() {
            let local_target = targets
                .binary_search(&position(overlap, target))
                .unwrap_or_default();
            // Re-express the order difference as order(target) - order(source).
            let delta_order = if target == 1 {
                overlap.delta_order
            } else {
                -overlap.delta_order
            };
            sub_intersection.push(position(overlap, source), local_target, delta_order);
        }

        let u_out: Vec<u64> = targets.iter().map(|&t| maps[target].u[t]).collect();
        let resampled = reraster_with_intersection(
            &maps[source].x,
            &u_out,
            &sub_intersection,
            &ResampleOptions::default()
                .method(method)
                .check_missing(false),
        )?;
        trace!(finer, target, len = u_out.len());

        for (&t, r) in targets.iter().zip(resampled.values) {
            let own = maps[target].x[t];
            u_y.push(maps[target].u[t]);
            y.push(if target == 0 { f(own, r) } else { f(r, own) });
        }
    }

    if let Some(pad) = options.pad {
        let matched = [&intersection.index_a, &intersection.index_b];
        for (map, matched) in maps.iter().zip(matched.iter()) {
            let mut covered = vec![false; map.u.len()];
            for &i in matched.iter() {
                covered[i] = true;
            }
            for (&u, _) in map.u.iter().zip(covered.iter()).filter(|&(_, &c)| !c) {
                u_y.push(u);
                y.push(pad);
            }
        }

        if !options.coarsen {
            let mut remainder = Vec::new();
            for &finer in [0, 1].iter() {
                let coarse_map = &maps[1 - finer];
                let mut pairs: Vec<(usize, PixelIndex)> = finer_group(&intersection, finer)
                    .iter()
                    .map(|o| {
                        (
                            position(o, 1 - finer),
                            PixelIndex(maps[finer].u[position(o, finer)]),
                        )
                    })
                    .collect();
                pairs.sort_unstable_by_key(|(c, p)| (*c, p.leaf_range().start));
                for (c, group) in &pairs.iter().group_by(|(c, _)| *c) {
                    let inside: Vec<PixelIndex> = group.map(|(_, p)| *p).collect();
                    push_complement(PixelIndex(coarse_map.u[c]), &inside, &mut remainder);
                }
            }
            trace!(remainder = remainder.len());
            y.extend(std::iter::repeat(pad).take(remainder.len()));
            u_y.extend(remainder);
        }
    }

    let mut rows: Vec<(u64, f64)> = u_y.into_iter().zip(y).collect();
    rows.sort_unstable_by_key(|(u, _)| *u);
    debug!(len = rows.len());

    Ok(rows.into_iter().unzip())
}

/// The overlaps where map `finer` (0 for the first map, 1 for the second) holds the finer pixel.
fn finer_group(intersection: &IntersectionResult, finer: usize) -> Vec<Overlap> {
    intersection
        .iter()
        .filter(|o| {
            if finer == 0 {
                o.delta_order < 0
            } else {
                o.delta_order > 0
            }
        })
        .collect()
}

#[inline]
fn position(overlap: &Overlap, map: usize) -> usize {
    if map == 0 {
        overlap.index_a
    } else {
        overlap.index_b
    }
}

/// Appends the fewest pixels that cover `pixel` minus the union of `inside`.
///
/// `inside` must hold non-overlapping pixels within `pixel`, sorted by the start of their leaf ranges.
pub(crate) fn push_complement(pixel: PixelIndex, inside: &[PixelIndex], out: &mut Vec<u64>) {
    if inside.is_empty() {
        out.push(pixel.0);
        return;
    }
    if inside[0] == pixel {
        return;
    }
    let children = match pixel.children() {
        Some(children) => children,
        None => return,
    };
    for child in children.iter() {
        let leaves = child.leaf_range();
        let start = inside.partition_point(|p| p.leaf_range().start < leaves.start);
        let end = inside.partition_point(|p| p.leaf_range().start < leaves.end);
        push_complement(*child, &inside[start..end], out);
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
