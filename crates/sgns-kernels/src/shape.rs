//! Dimensional parameters of the kernel calls and their buffer checks.
//!
//! Length checks are O(1) and always run. Id range checks scan the id
//! buffers and only run when [`sgns_common::KernelConfig::validate_ids`] is
//! set.

use sgns_common::{KernelError, Result, SgnsError};

/// Number of vocabulary columns held by a matrix of `len` elements.
///
/// `None` for `nrows == 0`, where every column is empty and any id is
/// addressable.
fn vocab_size(name: &str, matrix: &[f32], nrows: usize) -> Result<Option<usize>> {
    if nrows == 0 {
        return Ok(None);
    }
    if matrix.len() % nrows != 0 {
        return Err(SgnsError::invalid_args(format!(
            "{name}: length {} is not a multiple of nrows {nrows}",
            matrix.len()
        )));
    }
    Ok(Some(matrix.len() / nrows))
}

fn expect_len(name: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(SgnsError::invalid_args(format!(
            "{name}: expected {expected} elements, got {actual}"
        )));
    }
    Ok(())
}

fn checked_product(name: &str, dims: &[usize]) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| SgnsError::invalid_args(format!("{name}: dimensions overflow usize")))
}

fn check_ids(buffer: &'static str, ids: &[u32], vocab_size: Option<usize>) -> Result<()> {
    let Some(vocab_size) = vocab_size else {
        return Ok(());
    };
    match ids.iter().find(|&&id| id as usize >= vocab_size) {
        Some(&index) => Err(KernelError::IndexOutOfBounds { buffer, index, vocab_size }.into()),
        None => Ok(()),
    }
}

fn min_vocab(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    }
}

/// Parameters of a windowed (skip-gram over one sequence) update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowShape {
    /// Embedding dimensionality.
    pub nrows: usize,
    /// Sequence length.
    pub ncols: usize,
    /// Window radius.
    pub skip: usize,
}

impl WindowShape {
    pub fn new(nrows: usize, ncols: usize, skip: usize) -> Self {
        Self { nrows, ncols, skip }
    }

    /// Window radius clipped to the sequence, which bounds scratch sizes.
    pub fn radius(&self) -> usize {
        self.skip.min(self.ncols.saturating_sub(1))
    }

    /// True when no position has an in-range neighbour.
    pub fn is_noop(&self) -> bool {
        self.radius() == 0
    }

    pub fn validate(&self, ids: &[u32], a: &[f32], b: &[f32]) -> Result<()> {
        expect_len("ids", ids.len(), self.ncols)?;
        vocab_size("A", a, self.nrows)?;
        vocab_size("B", b, self.nrows)?;
        Ok(())
    }

    /// Every id addresses both a context column of A and a center column of B.
    pub fn validate_ids(&self, ids: &[u32], a: &[f32], b: &[f32]) -> Result<()> {
        let vocab = min_vocab(vocab_size("A", a, self.nrows)?, vocab_size("B", b, self.nrows)?);
        check_ids("ids", ids, vocab)
    }
}

/// Parameters of the explicit-pair kernels (update, forward, backward).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairShape {
    /// Embedding dimensionality.
    pub nrows: usize,
    /// Number of batch columns.
    pub ncols: usize,
    /// Context ids per column.
    pub nwa: usize,
    /// Paired (positive and negative) ids per column.
    pub nwb: usize,
}

impl PairShape {
    pub fn new(nrows: usize, ncols: usize, nwa: usize, nwb: usize) -> Self {
        Self { nrows, ncols, nwa, nwb }
    }

    /// Scores per batch column.
    pub fn block_len(&self) -> usize {
        self.nwa * self.nwb
    }

    /// Length of a full score buffer (`nwa * nwb * ncols`).
    pub fn score_len(&self) -> usize {
        self.block_len() * self.ncols
    }

    pub fn is_noop(&self) -> bool {
        self.ncols == 0 || self.nwa == 0 || self.nwb == 0
    }

    /// Offset of score `(j, k)` of column `i`: `j + nwa * (k + nwb * i)`.
    #[inline]
    pub fn score_index(&self, i: usize, j: usize, k: usize) -> usize {
        j + self.nwa * (k + self.nwb * i)
    }

    pub fn validate(&self, context_ids: &[u32], paired_ids: &[u32], a: &[f32], b: &[f32]) -> Result<()> {
        expect_len("context_ids", context_ids.len(), checked_product("context_ids", &[self.nwa, self.ncols])?)?;
        expect_len("paired_ids", paired_ids.len(), checked_product("paired_ids", &[self.nwb, self.ncols])?)?;
        vocab_size("A", a, self.nrows)?;
        vocab_size("B", b, self.nrows)?;
        Ok(())
    }

    /// Check a score or gradient buffer holds `nwa * nwb * ncols` values.
    pub fn validate_scores(&self, name: &str, scores: &[f32]) -> Result<()> {
        let expected = checked_product(name, &[self.nwa, self.nwb, self.ncols])?;
        expect_len(name, scores.len(), expected)
    }

    pub fn validate_ids(&self, context_ids: &[u32], paired_ids: &[u32], a: &[f32], b: &[f32]) -> Result<()> {
        check_ids("context_ids", context_ids, vocab_size("A", a, self.nrows)?)?;
        check_ids("paired_ids", paired_ids, vocab_size("B", b, self.nrows)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_radius_is_clipped_to_sequence() {
        assert_eq!(WindowShape::new(4, 3, 10).radius(), 2);
        assert_eq!(WindowShape::new(4, 1, 5).radius(), 0);
        assert_eq!(WindowShape::new(4, 0, 5).radius(), 0);
        assert!(WindowShape::new(4, 10, 0).is_noop());
        assert!(!WindowShape::new(4, 2, 1).is_noop());
    }

    #[test]
    fn window_rejects_ragged_matrix() {
        let shape = WindowShape::new(3, 2, 1);
        let err = shape.validate(&[0, 1], &[0.0; 7], &[0.0; 6]).unwrap_err();
        assert!(err.to_string().contains("not a multiple of nrows 3"));
    }

    #[test]
    fn window_ids_checked_against_smaller_matrix() {
        let shape = WindowShape::new(2, 2, 1);
        let a = [0.0f32; 6]; // vocab 3
        let b = [0.0f32; 4]; // vocab 2
        assert!(shape.validate_ids(&[0, 1], &a, &b).is_ok());
        let err = shape.validate_ids(&[0, 2], &a, &b).unwrap_err();
        assert!(matches!(
            err,
            SgnsError::Kernel(KernelError::IndexOutOfBounds { buffer: "ids", index: 2, vocab_size: 2 })
        ));
    }

    #[test]
    fn pair_lengths_checked() {
        let shape = PairShape::new(2, 3, 2, 4);
        let a = [0.0f32; 8];
        let b = [0.0f32; 8];
        assert!(shape.validate(&[0; 6], &[0; 12], &a, &b).is_ok());
        assert!(shape.validate(&[0; 5], &[0; 12], &a, &b).is_err());
        assert!(shape.validate(&[0; 6], &[0; 11], &a, &b).is_err());
        assert!(shape.validate_scores("scores", &[0.0; 24]).is_ok());
        assert!(shape.validate_scores("scores", &[0.0; 23]).is_err());
    }

    #[test]
    fn score_index_layout() {
        let shape = PairShape::new(1, 2, 2, 3);
        assert_eq!(shape.score_index(0, 0, 0), 0);
        assert_eq!(shape.score_index(0, 1, 0), 1);
        assert_eq!(shape.score_index(0, 0, 1), 2);
        assert_eq!(shape.score_index(1, 0, 0), 6);
        assert_eq!(shape.score_index(1, 1, 2), 11);
    }

    #[test]
    fn zero_rows_accepts_any_id() {
        let shape = PairShape::new(0, 1, 1, 1);
        assert!(shape.validate_ids(&[u32::MAX], &[7], &[], &[]).is_ok());
    }
}
