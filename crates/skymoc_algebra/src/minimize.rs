//! Canonical compression of a pixel set.
//!
//! Any four siblings `4k..4k+3` that are all present with "equal" values can be replaced by their parent `k` without
//! changing the field. Doing this greedily from the finest order to the coarsest yields the shortest equivalent set.
//!
//! Parents produced at one order are merged into the next coarser run before that run is scanned, so a quartet that is only
//! completed by a freshly merged parent is still found.
//!
//! ```
//! use skymoc_algebra::uniq_minimize;
//!
//! let u = [4, 5, 24, 25, 26, 27, 28, 29, 30, 31, 32];
//! let x = [1.0; 11];
//! let (u_min, x_min) = uniq_minimize(&u, &x).unwrap();
//!
//! assert_eq!(u_min, vec![4, 5, 6, 7, 32]);
//! assert_eq!(x_min, vec![1.0; 5]);
//! ```

use crate::level_boundary;

use skymoc_core::{check_non_overlapping, check_same_length, order_unchecked, SkyResult};

use itertools::Itertools;
use tracing::{debug, debug_span, trace};

/// An owned, sorted pixel set with one row of values per pixel, compressed in place by `minimize_by`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MinimizeScratch<T> {
    indices: Vec<u64>,
    values: Vec<T>,
}

impl<T> MinimizeScratch<T> {
    /// Takes ownership of a pixel set and its values, sorting both by pixel. Fails with `ShapeMismatch` if the lengths differ,
    /// or `OverlapViolation` if the pixels are not a valid set.
    pub fn new(indices: Vec<u64>, values: Vec<T>) -> SkyResult<Self> {
        check_same_length("minimize values", indices.len(), values.len())?;
        check_non_overlapping("u", &indices)?;

        let mut rows: Vec<(u64, T)> = indices.into_iter().zip(values).collect();
        rows.sort_unstable_by_key(|(u, _)| *u);
        let (indices, values) = rows.into_iter().unzip();

        Ok(Self { indices, values })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[u64] {
        &self.indices
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_parts(self) -> (Vec<u64>, Vec<T>) {
        (self.indices, self.values)
    }

    /// Replaces every complete quartet of siblings by its parent, from the finest order up to order 1.
    ///
    /// A quartet merges when `test(first, other)` holds for each of the other three members; the parent's value is
    /// `combine(&[first, second, third, fourth])`.
    pub fn minimize_by<F, C>(&mut self, mut test: F, mut combine: C)
    where
        F: FnMut(&T, &T) -> bool,
        C: FnMut(&[T]) -> T,
    {
        let _span = debug_span!("minimize", len = self.len()).entered();

        let max_order = match self.indices.last() {
            Some(&u) => order_unchecked(u),
            None => return,
        };

        // Runs that can no longer change, finest first.
        let mut finished: Vec<(Vec<u64>, Vec<T>)> = Vec::new();
        let mut parents = (Vec::new(), Vec::new());
        for order in (1..=max_order).rev() {
            let split = level_boundary(&self.indices, order);
            let run = (self.indices.split_off(split), self.values.split_off(split));
            let (indices, values) = merge_runs(run, parents);

            let num_candidates = indices.len();
            let (kept, merged) = merge_quartets(indices, values, &mut test, &mut combine);
            trace!(order, candidates = num_candidates, merged = merged.0.len());

            finished.push(kept);
            parents = merged;
        }

        // Base pixels have no parent.
        let coarsest = (
            std::mem::take(&mut self.indices),
            std::mem::take(&mut self.values),
        );
        let (mut indices, mut values) = merge_runs(coarsest, parents);
        for (run_indices, run_values) in finished.into_iter().rev() {
            indices.extend(run_indices);
            values.extend(run_values);
        }
        debug!(len = indices.len());

        self.indices = indices;
        self.values = values;
    }
}

/// Merges two sorted, disjoint runs of rows into one sorted run.
fn merge_runs<T>(a: (Vec<u64>, Vec<T>), b: (Vec<u64>, Vec<T>)) -> (Vec<u64>, Vec<T>) {
    if b.0.is_empty() {
        return a;
    }
    if a.0.is_empty() {
        return b;
    }

    a.0.into_iter()
        .zip(a.1)
        .merge_by(b.0.into_iter().zip(b.1), |(u, _), (v, _)| u < v)
        .unzip()
}

/// Splits one sorted run at a single order into the rows that stay and the parents of every mergeable quartet.
fn merge_quartets<T, F, C>(
    indices: Vec<u64>,
    values: Vec<T>,
    test: &mut F,
    combine: &mut C,
) -> ((Vec<u64>, Vec<T>), (Vec<u64>, Vec<T>))
where
    F: FnMut(&T, &T) -> bool,
    C: FnMut(&[T]) -> T,
{
    let mut quartet_starts = Vec::new();
    let mut i = 0;
    while i + 3 < indices.len() {
        let first = indices[i];
        let complete = first % 4 == 0 && indices[i + 3] == first + 3;
        if complete && values[i + 1..i + 4].iter().all(|v| test(&values[i], v)) {
            quartet_starts.push(i);
            i += 4;
        } else {
            i += 1;
        }
    }

    let num_merged = quartet_starts.len();
    let mut kept = (
        Vec::with_capacity(indices.len() - 4 * num_merged),
        Vec::with_capacity(indices.len() - 4 * num_merged),
    );
    let mut parents = (Vec::with_capacity(num_merged), Vec::with_capacity(num_merged));
    if num_merged == 0 {
        return ((indices, values), parents);
    }

    let mut next_start = quartet_starts.into_iter().peekable();
    let mut quartet = Vec::with_capacity(4);
    for (i, (u, v)) in indices.into_iter().zip(values).enumerate() {
        match next_start.peek() {
            Some(&start) if i >= start => {
                quartet.push(v);
                if quartet.len() == 4 {
                    parents.0.push(u >> 2);
                    parents.1.push(combine(&quartet));
                    quartet.clear();
                    next_start.next();
                }
            }
            _ => {
                kept.0.push(u);
                kept.1.push(v);
            }
        }
    }

    (kept, parents)
}

/// Compresses `(u, x)` by merging quartets whose values are exactly equal, keeping the first value. Several arrays of values
/// can be minimized together by zipping them into tuples.
pub fn uniq_minimize<T>(u: &[u64], x: &[T]) -> SkyResult<(Vec<u64>, Vec<T>)>
where
    T: Clone + PartialEq,
{
    uniq_minimize_by(u, x, |a, b| a == b, |quartet| quartet[0].clone())
}

/// Compresses `(u, x)` with a custom merge predicate and reducer. See `MinimizeScratch::minimize_by`.
pub fn uniq_minimize_by<T, F, C>(
    u: &[u64],
    x: &[T],
    test: F,
    combine: C,
) -> SkyResult<(Vec<u64>, Vec<T>)>
where
    T: Clone,
    F: FnMut(&T, &T) -> bool,
    C: FnMut(&[T]) -> T,
{
    let mut scratch = MinimizeScratch::new(u.to_vec(), x.to_vec())?;
    scratch.minimize_by(test, combine);

    Ok(scratch.into_parts())
}

/// The shortest set of pixels covering the same region as `u`.
pub fn uniq_minimize_indices(u: &[u64]) -> SkyResult<Vec<u64>> {
    let mut scratch = MinimizeScratch::new(u.to_vec(), vec![(); u.len()])?;
    scratch.minimize_by(|_, _| true, |_| ());

    Ok(scratch.into_parts().0)
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
