//! Parallel training kernels for skip-gram with negative sampling
//!
//! The kernels operate in place on two caller-owned embedding matrices:
//! `A` holds the input vector of every vocabulary entry and `B` the output
//! vector, both stored column-per-entry (`column v = [v*nrows, (v+1)*nrows)`).
//!
//! | Operation | Effect |
//! |---|---|
//! | [`CpuKernel::windowed_update`] | SGD step over a window of one token sequence |
//! | [`CpuKernel::batched_pair_update`] | SGD step over explicit context/paired id lists |
//! | [`CpuKernel::forward_score`] | Raw pair scores, no mutation |
//! | [`CpuKernel::backward_distribute`] | Overwrite touched columns from external gradients |
//!
//! All parallel work is Hogwild-style: outer indices run concurrently and
//! update shared columns without locks, so results with more than one
//! thread are not bit-reproducible. See [`hogwild`].

pub mod cpu;
pub mod hogwild;
pub mod shape;
pub mod thread_pool;

pub use cpu::{SIGMOID_CLAMP, clamped_sigmoid, negative_sampling_gradients};
pub use shape::{PairShape, WindowShape};
pub use thread_pool::KernelThreadPool;

use sgns_common::{KernelConfig, Result};

/// CPU kernel front end: a thread pool plus the settings it was built from.
///
/// Every method optionally scans ids against the vocabulary
/// ([`KernelConfig::validate_ids`]) and then dispatches to the matching
/// function in [`cpu`], which checks buffer lengths against the shape.
#[derive(Debug)]
pub struct CpuKernel {
    pool: KernelThreadPool,
    config: KernelConfig,
}

impl CpuKernel {
    pub fn new(config: KernelConfig) -> Result<Self> {
        let pool = KernelThreadPool::new(&config)?;
        Ok(Self { pool, config })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(KernelConfig::default())
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn pool(&self) -> &KernelThreadPool {
        &self.pool
    }

    pub fn num_threads(&self) -> usize {
        self.pool.num_threads()
    }

    /// See [`cpu::windowed_update`].
    pub fn windowed_update(
        &self,
        shape: WindowShape,
        ids: &[u32],
        a: &mut [f32],
        b: &mut [f32],
        lrate: f32,
    ) -> Result<()> {
        if self.config.validate_ids {
            shape.validate_ids(ids, a, b)?;
        }
        cpu::windowed_update(&self.pool, shape, ids, a, b, lrate)
    }

    /// See [`cpu::batched_pair_update`].
    pub fn batched_pair_update(
        &self,
        shape: PairShape,
        context_ids: &[u32],
        paired_ids: &[u32],
        a: &mut [f32],
        b: &mut [f32],
        lrate: f32,
    ) -> Result<()> {
        self.check_pair_ids(shape, context_ids, paired_ids, a, b)?;
        cpu::batched_pair_update(&self.pool, shape, context_ids, paired_ids, a, b, lrate)
    }

    /// See [`cpu::forward_score`].
    pub fn forward_score(
        &self,
        shape: PairShape,
        context_ids: &[u32],
        paired_ids: &[u32],
        a: &[f32],
        b: &[f32],
        out_scores: &mut [f32],
    ) -> Result<()> {
        self.check_pair_ids(shape, context_ids, paired_ids, a, b)?;
        cpu::forward_score(&self.pool, shape, context_ids, paired_ids, a, b, out_scores)
    }

    /// See [`cpu::backward_distribute`].
    #[allow(clippy::too_many_arguments)]
    pub fn backward_distribute(
        &self,
        shape: PairShape,
        context_ids: &[u32],
        paired_ids: &[u32],
        a: &mut [f32],
        b: &mut [f32],
        scores: &[f32],
        lrate: f32,
    ) -> Result<()> {
        self.check_pair_ids(shape, context_ids, paired_ids, a, b)?;
        cpu::backward_distribute(&self.pool, shape, context_ids, paired_ids, a, b, scores, lrate)
    }

    fn check_pair_ids(
        &self,
        shape: PairShape,
        context_ids: &[u32],
        paired_ids: &[u32],
        a: &[f32],
        b: &[f32],
    ) -> Result<()> {
        if self.config.validate_ids {
            shape.validate_ids(context_ids, paired_ids, a, b)?;
        }
        Ok(())
    }
}
