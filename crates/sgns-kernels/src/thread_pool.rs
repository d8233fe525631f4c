//! Work-sharing thread pool for the training kernels.
//!
//! Wraps a dedicated [`rayon::ThreadPool`], separate from rayon's global
//! pool. Parallel loops carry no
//! ordering guarantee across indices; a one-thread pool runs the range in
//! ascending order on the calling thread.

use rayon::prelude::*;
use sgns_common::{KernelConfig, KernelError, Result};
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread pool shared by every kernel call of a [`crate::CpuKernel`].
pub struct KernelThreadPool {
    pool: rayon::ThreadPool,
    num_threads: usize,
    min_chunk_len: usize,
    calls: AtomicU64,
}

impl KernelThreadPool {
    /// Build a pool from the kernel section of the configuration.
    pub fn new(config: &KernelConfig) -> Result<Self> {
        let num_threads = config.effective_threads();
        let prefix = config.thread_name_prefix.clone();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(move |idx| format!("{prefix}-{idx}"))
            .build()
            .map_err(|e| KernelError::ThreadPool { reason: e.to_string() })?;

        log::info!("kernel thread pool ready: {num_threads} threads");
        Ok(Self {
            pool,
            num_threads,
            min_chunk_len: config.min_chunk_len.max(1),
            calls: AtomicU64::new(0),
        })
    }

    /// Pool with exactly one worker; loops run in index order.
    pub fn single_threaded() -> Result<Self> {
        Self::new(&KernelConfig { num_threads: 1, ..Default::default() })
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Number of parallel loops completed since the pool was built.
    pub fn calls_completed(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    // ----- parallel primitives -----

    /// Apply `f` to every index in `range`.
    pub fn parallel_for<F>(&self, range: Range<usize>, f: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        self.parallel_for_with(range, || (), |_, i| f(i));
    }

    /// Apply `f` to every index in `range` with per-worker scratch state.
    ///
    /// `init` runs at most once per work split, so scratch buffers are never
    /// shared between workers and live no longer than this call.
    pub fn parallel_for_with<T, I, F>(&self, range: Range<usize>, init: I, f: F)
    where
        I: Fn() -> T + Send + Sync,
        F: Fn(&mut T, usize) + Send + Sync,
    {
        if range.is_empty() {
            return;
        }
        if self.num_threads == 1 {
            let mut state = init();
            for i in range {
                f(&mut state, i);
            }
        } else {
            let min_len = self.min_chunk_len;
            self.pool.install(|| {
                range.into_par_iter().with_min_len(min_len).for_each_init(&init, |state, i| f(state, i));
            });
        }
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Split `data` into consecutive `chunk_len` blocks and hand each block,
    /// with its index, to `f`.
    pub fn parallel_chunks_mut<T, F>(&self, data: &mut [T], chunk_len: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync,
    {
        if data.is_empty() || chunk_len == 0 {
            return;
        }
        if self.num_threads == 1 {
            for (i, chunk) in data.chunks_mut(chunk_len).enumerate() {
                f(i, chunk);
            }
        } else {
            let min_len = self.min_chunk_len;
            self.pool.install(|| {
                data.par_chunks_mut(chunk_len).with_min_len(min_len).enumerate().for_each(|(i, chunk)| f(i, chunk));
            });
        }
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for KernelThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelThreadPool")
            .field("num_threads", &self.num_threads)
            .field("min_chunk_len", &self.min_chunk_len)
            .finish()
    }
}
