//! Negative-sampling loss for the split forward/backward path.

use super::activations::clamped_sigmoid;
use crate::shape::PairShape;
use sgns_common::{Result, SgnsError};

/// Probability floor inside the logarithm.
const EPS: f32 = 1e-7;

/// Convert forward scores into per-pair gradients and return the mean loss.
///
/// Paired slots `k < positives` are treated as observed pairs (label 1),
/// the remaining slots as negative samples (label 0). For each score `s`:
///
/// ```text
/// positive: grad =  1 - σ(s),  loss = -ln σ(s)
/// negative: grad =     -σ(s),  loss = -ln (1 - σ(s))
/// ```
///
/// `grads` receives the gradients in the same layout as `scores` and can be
/// passed directly to [`super::backward_distribute`]. The returned loss is
/// averaged over all pairs (`0.0` for an empty batch).
///
/// # Errors
///
/// Returns `InvalidArguments` on a length mismatch or when
/// `positives > shape.nwb`.
pub fn negative_sampling_gradients(
    scores: &[f32],
    shape: PairShape,
    positives: usize,
    grads: &mut [f32],
) -> Result<f32> {
    shape.validate_scores("scores", scores)?;
    shape.validate_scores("grads", grads)?;
    if positives > shape.nwb {
        return Err(SgnsError::invalid_args(format!(
            "positives ({positives}) exceeds paired slots per column ({})",
            shape.nwb
        )));
    }
    if scores.is_empty() {
        return Ok(0.0);
    }

    let mut total = 0.0f64;
    for (idx, (&s, g)) in scores.iter().zip(grads.iter_mut()).enumerate() {
        let k = (idx / shape.nwa) % shape.nwb;
        let p = clamped_sigmoid(s);
        let (grad, likelihood) = if k < positives { (1.0 - p, p) } else { (-p, 1.0 - p) };
        *g = grad;
        total += -f64::from(likelihood.max(EPS).ln());
    }
    Ok((total / scores.len() as f64) as f32)
}
