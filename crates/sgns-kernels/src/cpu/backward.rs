//! Backward distributor for the split forward/backward path.
//!
//! Unlike the SGD kernels this pass *replaces* the touched columns. For
//! each batch column `i`:
//!
//! ```text
//! A[:, WA[j,i]] = Σ_k lrate * C[j,k,i] * B[:, WB[k,i]]      for every j
//! B[:, WB[k,i]] = Σ_j lrate * C[j,k,i] * A[:, WA[j,i]]      for every k, using the new A
//! ```
//!
//! A column is zeroed immediately before its sum is built. When an id is
//! repeated, within one batch column or across columns, the last zeroing
//! wins and earlier contributions to that id are discarded. Callers that
//! need accumulation across repeats must deduplicate ids per call.

use crate::hogwild::{SharedMatrix, axpy, zero};
use crate::shape::PairShape;
use crate::thread_pool::KernelThreadPool;
use sgns_common::Result;

fn distribute_column(
    a: &SharedMatrix<'_>,
    b: &SharedMatrix<'_>,
    context: &[u32],
    paired: &[u32],
    grads: &[f32],
    lrate: f32,
) {
    let nwa = context.len();

    for (j, &ia) in context.iter().enumerate() {
        let av = a.column(ia);
        zero(av);
        for (k, &ib) in paired.iter().enumerate() {
            axpy(av, b.column(ib), lrate * grads[j + nwa * k]);
        }
    }

    for (k, &ib) in paired.iter().enumerate() {
        let bv = b.column(ib);
        zero(bv);
        for (j, &ia) in context.iter().enumerate() {
            axpy(bv, a.column(ia), lrate * grads[j + nwa * k]);
        }
    }
}

/// Overwrite the touched columns of `a` and `b` with gradient-weighted sums.
///
/// `scores` uses the [`super::forward_score`] layout and usually holds the
/// per-pair gradients produced by an external loss (for example
/// [`super::negative_sampling_gradients`]). Pass `lrate = 1.0` when the
/// scale is already folded into `scores`.
///
/// # Errors
///
/// Returns `InvalidArguments` when a buffer does not match `shape`.
#[allow(clippy::too_many_arguments)]
pub fn backward_distribute(
    pool: &KernelThreadPool,
    shape: PairShape,
    context_ids: &[u32],
    paired_ids: &[u32],
    a: &mut [f32],
    b: &mut [f32],
    scores: &[f32],
    lrate: f32,
) -> Result<()> {
    shape.validate(context_ids, paired_ids, a, b)?;
    shape.validate_scores("scores", scores)?;
    if shape.is_noop() {
        log::trace!("backward_distribute: nothing to do for {shape:?}");
        return Ok(());
    }
    log::debug!(
        "backward_distribute: nrows={} ncols={} nwa={} nwb={} lrate={lrate} threads={}",
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

    pool.parallel_for(0..shape.ncols, |i| {
        let context = &context_ids[i * nwa..(i + 1) * nwa];
        let paired = &paired_ids[i * nwb..(i + 1) * nwb];
        let grads = &scores[i * block..(i + 1) * block];
        distribute_column(&a, &b, context, paired, grads, lrate);
    });
    Ok(())
}
