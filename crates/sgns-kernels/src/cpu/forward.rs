//! Forward scorer for the split forward/backward path.

use crate::shape::PairShape;
use crate::thread_pool::KernelThreadPool;
use sgns_common::Result;

#[inline]
fn column(matrix: &[f32], nrows: usize, id: u32) -> &[f32] {
    let start = id as usize * nrows;
    &matrix[start..start + nrows]
}

/// Raw dot products of every (context, paired) combination of every column.
///
/// Writes `A[:, context_ids[j + i*nwa]] · B[:, paired_ids[k + i*nwb]]` to
/// `out_scores[j + nwa * (k + nwb * i)]`. No sigmoid is applied and neither
/// matrix is modified; repeated calls on the same inputs produce identical
/// output.
///
/// # Errors
///
/// Returns `InvalidArguments` when a buffer does not match `shape`.
pub fn forward_score(
    pool: &KernelThreadPool,
    shape: PairShape,
    context_ids: &[u32],
    paired_ids: &[u32],
    a: &[f32],
    b: &[f32],
    out_scores: &mut [f32],
) -> Result<()> {
    shape.validate(context_ids, paired_ids, a, b)?;
    shape.validate_scores("out_scores", out_scores)?;
    if shape.is_noop() {
        log::trace!("forward_score: nothing to do for {shape:?}");
        return Ok(());
    }
    log::debug!(
        "forward_score: nrows={} ncols={} nwa={} nwb={} threads={}",
        shape.nrows,
        shape.ncols,
        shape.nwa,
        shape.nwb,
        pool.num_threads()
    );

    let PairShape { nrows, nwa, nwb, .. } = shape;
    pool.parallel_chunks_mut(out_scores, shape.block_len(), |i, block| {
        let context = &context_ids[i * nwa..(i + 1) * nwa];
        let paired = &paired_ids[i * nwb..(i + 1) * nwb];
        for (k, &ib) in paired.iter().enumerate() {
            let bv = column(b, nrows, ib);
            for (j, &ia) in context.iter().enumerate() {
                let av = column(a, nrows, ia);
                block[j + nwa * k] = av.iter().zip(bv).map(|(x, y)| x * y).sum();
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_land_at_documented_offsets() {
        let pool = KernelThreadPool::single_threaded().unwrap();
        // nrows = 2, vocab 3 for both matrices
        let a = [1.0f32, 0.0, 0.0, 1.0, 1.0, 1.0];
        let b = [2.0f32, 3.0, -1.0, 0.5, 0.0, 0.0];
        let shape = PairShape::new(2, 2, 2, 1);
        let mut out = vec![f32::NAN; 4];
        forward_score(&pool, shape, &[0, 1, 2, 0], &[0, 1], &a, &b, &mut out).unwrap();

        // column 0: A0·B0 = 2, A1·B0 = 3
        // column 1: A2·B1 = -0.5, A0·B1 = -1
        assert_eq!(out, vec![2.0, 3.0, -0.5, -1.0]);
    }

    #[test]
    fn output_length_checked() {
        let pool = KernelThreadPool::single_threaded().unwrap();
        let mut out = vec![0.0f32; 3];
        let err = forward_score(&pool, PairShape::new(1, 2, 1, 1), &[0, 0], &[0, 0], &[1.0], &[1.0], &mut out);
        assert!(err.is_err());
    }
}
