//! Skip-gram update over explicit (context, paired) id lists.
//!
//! Every batch column `i` carries `nwa` context ids and `nwb` paired ids.
//! Each context/paired combination is scored and turned into the scale
//! `-σ(score)`; whether a paired id acts as a positive or a negative sample
//! is decided by the caller through the ordering and content of the lists.
//!
//! Within a column, all A columns are updated first. The B pass then reads
//! the already-updated A values. Columns run in parallel without
//! synchronization.

use super::activations::clamped_sigmoid;
use crate::hogwild::{SharedMatrix, axpy, dot};
use crate::shape::PairShape;
use crate::thread_pool::KernelThreadPool;
use sgns_common::Result;

fn update_column(
    a: &SharedMatrix<'_>,
    b: &SharedMatrix<'_>,
    context: &[u32],
    paired: &[u32],
    lrate: f32,
    grads: &mut [f32],
) {
    let nwa = context.len();

    for (j, &ia) in context.iter().enumerate() {
        let av = a.column(ia);
        for (k, &ib) in paired.iter().enumerate() {
            grads[j + nwa * k] = -clamped_sigmoid(dot(av, b.column(ib)));
        }
    }

    for (j, &ia) in context.iter().enumerate() {
        let av = a.column(ia);
        for (k, &ib) in paired.iter().enumerate() {
            axpy(av, b.column(ib), lrate * grads[j + nwa * k]);
        }
    }

    for (k, &ib) in paired.iter().enumerate() {
        let bv = b.column(ib);
        for (j, &ia) in context.iter().enumerate() {
            axpy(bv, a.column(ia), lrate * grads[j + nwa * k]);
        }
    }
}

/// Batched pair update, in place on `a` and `b`.
///
/// `context_ids[j + i * nwa]` is context slot `j` of column `i`;
/// `paired_ids[k + i * nwb]` is paired slot `k`.
///
/// # Errors
///
/// Returns `InvalidArguments` when an id list or matrix does not match
/// `shape`.
pub fn batched_pair_update(
    pool: &KernelThreadPool,
    shape: PairShape,
    context_ids: &[u32],
    paired_ids: &[u32],
    a: &mut [f32],
    b: &mut [f32],
    lrate: f32,
) -> Result<()> {
    shape.validate(context_ids, paired_ids, a, b)?;
    if shape.is_noop() {
        log::trace!("batched_pair_update: nothing to do for {shape:?}");
        return Ok(());
    }
    log::debug!(
        "batched_pair_update: nrows={} ncols={} nwa={} nwb={} lrate={lrate} threads={}",
        shape.nrows,
        shape.ncols,
        shape.nwa,
        shape.nwb,
        pool.num_threads()
    );

    let PairShape { nrows, nwa, nwb, .. } = shape;
    let block = shape.block_len();
    let a = SharedMatrix::new(a, nrows);
    let b = SharedMatrix::new(b, nrows);

    pool.parallel_for_with(
        0..shape.ncols,
        || vec![0.0f32; block],
        |grads, i| {
            let context = &context_ids[i * nwa..(i + 1) * nwa];
            let paired = &paired_ids[i * nwb..(i + 1) * nwb];
            update_column(&a, &b, context, paired, lrate, grads);
        },
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
    fn single_pair_hand_computed() {
        // score = 2 * 1 = 2, g = -σ(2), delta = lrate * g
        let mut a = vec![2.0f32];
        let mut b = vec![1.0f32];
        batched_pair_update(&pool(), PairShape::new(1, 1, 1, 1), &[0], &[0], &mut a, &mut b, 0.5).unwrap();

        let delta = 0.5 * -(1.0 / (1.0 + (-2.0f32).exp()));
        let a_new = 2.0 + delta * 1.0;
        let b_new = 1.0 + delta * a_new;
        assert!((a[0] - a_new).abs() < 1e-6);
        assert!((b[0] - b_new).abs() < 1e-6, "B must see the updated A: {} vs {}", b[0], b_new);
    }

    #[test]
    fn empty_lists_are_noops() {
        let mut a = vec![1.0f32, 2.0];
        let mut b = vec![3.0f32, 4.0];
        batched_pair_update(&pool(), PairShape::new(1, 2, 0, 1), &[], &[0, 1], &mut a, &mut b, 1.0).unwrap();
        batched_pair_update(&pool(), PairShape::new(1, 2, 1, 0), &[0, 1], &[], &mut a, &mut b, 1.0).unwrap();
        assert_eq!(a, vec![1.0, 2.0]);
        assert_eq!(b, vec![3.0, 4.0]);
    }
}
