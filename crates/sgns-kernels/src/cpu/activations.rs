//! Logistic activation used by the SGNS objective.

/// Scores beyond `±SIGMOID_CLAMP` saturate to exactly `1.0` or `0.0`.
pub const SIGMOID_CLAMP: f32 = 16.0;

/// Logistic function with a saturated argument.
///
/// Returns `1.0` for `score > 16`, `0.0` for `score < -16`, and
/// `1 / (1 + e^-score)` otherwise, so the exponential never overflows.
/// NaN propagates.
#[inline]
pub fn clamped_sigmoid(score: f32) -> f32 {
    if score > SIGMOID_CLAMP {
        1.0
    } else if score < -SIGMOID_CLAMP {
        0.0
    } else {
        1.0 / (1.0 + (-score).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturates_outside_clamp() {
        assert_eq!(clamped_sigmoid(16.001), 1.0);
        assert_eq!(clamped_sigmoid(1e30), 1.0);
        assert_eq!(clamped_sigmoid(f32::INFINITY), 1.0);
        assert_eq!(clamped_sigmoid(-16.001), 0.0);
        assert_eq!(clamped_sigmoid(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn midpoint_and_symmetry() {
        assert_eq!(clamped_sigmoid(0.0), 0.5);
        for s in [0.25f32, 1.0, 3.5, 10.0] {
            let sum = clamped_sigmoid(s) + clamped_sigmoid(-s);
            assert!((sum - 1.0).abs() < 1e-6, "σ({s}) + σ(-{s}) = {sum}");
        }
    }

    #[test]
    fn boundary_values_are_unclamped() {
        let at = clamped_sigmoid(16.0);
        assert!(at > 0.999_999 && at <= 1.0);
        let at = clamped_sigmoid(-16.0);
        assert!(at > 0.0 && at < 1e-6);
    }

    #[test]
    fn nan_propagates() {
        assert!(clamped_sigmoid(f32::NAN).is_nan());
    }
}
