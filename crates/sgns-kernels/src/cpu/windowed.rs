//! Skip-gram update over a window of one token sequence.
//!
//! For every position `i` the center word `ids[i]` is paired with each
//! neighbour `ids[i + j]`, `0 < |j| <= skip`. The neighbour's input vector
//! (column of A) is scored against the center's output vector (column of
//! B) and both move towards a higher co-occurrence probability:
//!
//! ```text
//! g_j     = 1 - σ(A[:, ids[i+j]] · B[:, ids[i]])
//! A[:, a] += lrate * g_j * B[:, b]          (immediately, per neighbour)
//! B[:, b] += Σ_j lrate * g_j * A[:, a]      (once, after all neighbours)
//! ```
//!
//! The B-side contributions of a position are summed in a private
//! accumulator and written with a single update, because every neighbour of
//! a position shares the same center column.

use super::activations::clamped_sigmoid;
use crate::hogwild::{SharedMatrix, dot};
use crate::shape::WindowShape;
use crate::thread_pool::KernelThreadPool;
use sgns_common::Result;

/// Per-worker temporaries, sized once per call.
struct WindowScratch {
    /// Gradient scale of each window slot, indexed by `position - lo`.
    scales: Vec<f32>,
    /// Pending update of the center column.
    accum: Vec<f32>,
}

impl WindowScratch {
    fn new(radius: usize, nrows: usize) -> Self {
        Self { scales: vec![0.0; 2 * radius + 1], accum: vec![0.0; nrows] }
    }
}

fn update_position(
    a: &SharedMatrix<'_>,
    b: &SharedMatrix<'_>,
    ids: &[u32],
    i: usize,
    radius: usize,
    lrate: f32,
    scratch: &mut WindowScratch,
) {
    let lo = i.saturating_sub(radius);
    let hi = (i + radius).min(ids.len() - 1);
    let center = b.column(ids[i]);

    for p in (lo..=hi).filter(|&p| p != i) {
        let score = dot(a.column(ids[p]), center);
        scratch.scales[p - lo] = 1.0 - clamped_sigmoid(score);
    }

    scratch.accum.fill(0.0);
    for p in (lo..=hi).filter(|&p| p != i) {
        let context = a.column(ids[p]);
        let delta = lrate * scratch.scales[p - lo];
        for ((acc, ctx), ctr) in scratch.accum.iter_mut().zip(context).zip(center) {
            *acc += delta * ctx.get();
            ctx.add(delta * ctr.get());
        }
    }

    for (ctr, &acc) in center.iter().zip(&scratch.accum) {
        ctr.add(acc);
    }
}

/// Windowed skip-gram update, in place on `a` and `b`.
///
/// `ids` holds `shape.ncols` vocabulary indices. Positions are processed in
/// parallel without synchronization (see [`crate::hogwild`]); with a
/// one-thread pool the result is deterministic.
///
/// # Errors
///
/// Returns `InvalidArguments` when `ids` or the matrices do not match
/// `shape`. Ids are not range-checked here.
pub fn windowed_update(
    pool: &KernelThreadPool,
    shape: WindowShape,
    ids: &[u32],
    a: &mut [f32],
    b: &mut [f32],
    lrate: f32,
) -> Result<()> {
    shape.validate(ids, a, b)?;
    if shape.is_noop() {
        log::trace!("windowed_update: nothing to do for {shape:?}");
        return Ok(());
    }
    log::debug!(
        "windowed_update: nrows={} ncols={} skip={} lrate={lrate} threads={}",
        shape.nrows,
        shape.ncols,
        shape.skip,
        pool.num_threads()
    );

    let radius = shape.radius();
    let nrows = shape.nrows;
    let a = SharedMatrix::new(a, nrows);
    let b = SharedMatrix::new(b, nrows);

    pool.parallel_for_with(
        0..shape.ncols,
        || WindowScratch::new(radius, nrows),
        |scratch, i| update_position(&a, &b, ids, i, radius, lrate, scratch),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> KernelThreadPool {
        KernelThreadPool::single_threaded().unwrap()
    }

    #[test]
    fn two_token_sequence_single_dim() {
        let mut a = vec![0.0f32, 1.0];
        let mut b = vec![1.0f32, 0.0];
        windowed_update(&pool(), WindowShape::new(1, 2, 1), &[0, 1], &mut a, &mut b, 0.1).unwrap();

        // i = 0: center 0, context 1, score 1 → delta = 0.1 * (1 - σ(1))
        //        A1 += delta * B0, B0 += delta * A1(old)
        // i = 1: center 1, context 0, score 0 → both columns are zero, nothing moves
        let delta = 0.1 * (1.0 - 1.0 / (1.0 + (-1.0f32).exp()));
        assert_eq!(a[0], 0.0);
        assert!((a[1] - (1.0 + delta)).abs() < 1e-6);
        assert!((b[0] - (1.0 + delta)).abs() < 1e-6);
        assert_eq!(b[1], 0.0);
    }

    #[test]
    fn repeated_context_accumulates_into_one_center_write() {
        // Position 1 has id 0 on both sides; its center column receives the
        // sum of both offsets' contributions in one write.
        let mut a = vec![1.0f32, 0.0];
        let mut b = vec![0.0f32, 0.0];
        let shape = WindowShape::new(1, 3, 1);
        windowed_update(&pool(), shape, &[0, 1, 0], &mut a, &mut b, 1.0).unwrap();
        // Positions 0 and 2 touch only zero columns. Position 1 scores 0 on
        // both offsets (g = 0.5): B1 = 0.5 * A0 + 0.5 * A0, A0 += 0.5 * B1(old) = +0.
        assert_eq!(b[1], 1.0);
        assert_eq!(a[0], 1.0);
        assert_eq!(a[1], 0.0);
        assert_eq!(b[0], 0.0);
    }

    #[test]
    fn zero_skip_is_noop() {
        let mut a = vec![1.0f32, 2.0];
        let mut b = vec![3.0f32, 4.0];
        windowed_update(&pool(), WindowShape::new(1, 2, 0), &[0, 1], &mut a, &mut b, 0.5).unwrap();
        assert_eq!(a, vec![1.0, 2.0]);
        assert_eq!(b, vec![3.0, 4.0]);
    }

    #[test]
    fn ids_length_mismatch_is_rejected() {
        let mut a = vec![0.0f32; 4];
        let mut b = vec![0.0f32; 4];
        let err = windowed_update(&pool(), WindowShape::new(2, 3, 1), &[0, 1], &mut a, &mut b, 0.1);
        assert!(err.is_err());
    }
}
