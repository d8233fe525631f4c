//! Benchmarking command implementation
//!
//! Times each kernel on seeded synthetic data. Matrices are reset from a
//! pristine copy before every iteration (outside the timed region), so each
//! measurement starts from the same state.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use console::style;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use sgns_common::SgnsConfig;
use sgns_kernels::{CpuKernel, PairShape, WindowShape};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    Windowed,
    Pairs,
    Forward,
    Backward,
    All,
}

impl KernelKind {
    fn expand(self) -> Vec<KernelKind> {
        match self {
            Self::All => vec![Self::Windowed, Self::Pairs, Self::Forward, Self::Backward],
            one => vec![one],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Benchmark command arguments
#[derive(Args, Debug)]
pub struct BenchCommand {
    /// Kernel to measure
    #[arg(long, value_enum, default_value_t = KernelKind::All)]
    pub kernel: KernelKind,

    /// Embedding dimensionality (nrows)
    #[arg(long, default_value_t = 100, value_name = "N")]
    pub dim: usize,

    /// Vocabulary size of both matrices
    #[arg(long, default_value_t = 10_000, value_name = "V")]
    pub vocab: usize,

    /// Sequence positions or batch columns per call (ncols)
    #[arg(long, default_value_t = 10_000, value_name = "C")]
    pub cols: usize,

    /// Window radius for the windowed kernel
    #[arg(long, default_value_t = 5, value_name = "S")]
    pub skip: usize,

    /// Context ids per column for the pair kernels
    #[arg(long, default_value_t = 1, value_name = "A")]
    pub nwa: usize,

    /// Paired ids per column for the pair kernels
    #[arg(long, default_value_t = 6, value_name = "B")]
    pub nwb: usize,

    /// Learning rate passed to every call
    #[arg(long, default_value_t = 0.025, value_name = "RATE")]
    pub lrate: f32,

    /// Number of timed iterations
    #[arg(long, default_value_t = 10, value_name = "N")]
    pub iterations: usize,

    /// Untimed warmup iterations
    #[arg(long, default_value_t = 2, value_name = "N")]
    pub warmup: usize,

    /// Seed for the synthetic workload
    #[arg(long, default_value_t = 42, value_name = "SEED")]
    pub seed: u64,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub struct BenchmarkResults {
    pub system_info: SystemInfo,
    pub workload: Workload,
    pub results: Vec<KernelResult>,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpu_cores: usize,
    pub threads: usize,
}

#[derive(Debug, Serialize)]
pub struct Workload {
    pub dim: usize,
    pub vocab: usize,
    pub cols: usize,
    pub skip: usize,
    pub nwa: usize,
    pub nwb: usize,
    pub lrate: f32,
    pub iterations: usize,
    pub warmup: usize,
    pub seed: u64,
}

#[derive(Debug, Serialize)]
pub struct KernelResult {
    pub kernel: KernelKind,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub mean_latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    pub cols_per_second: f64,
}

impl Statistics {
    /// Summarise per-iteration latencies (milliseconds).
    pub fn from_latencies(latencies_ms: &[f64], cols: usize) -> Self {
        if latencies_ms.is_empty() {
            return Self { mean_latency_ms: 0.0, min_latency_ms: 0.0, max_latency_ms: 0.0, cols_per_second: 0.0 };
        }
        let mean = latencies_ms.iter().sum::<f64>() / latencies_ms.len() as f64;
        let min = latencies_ms.iter().copied().fold(f64::INFINITY, f64::min);
        let max = latencies_ms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let cols_per_second = if mean > 0.0 { cols as f64 / (mean / 1000.0) } else { 0.0 };
        Self { mean_latency_ms: mean, min_latency_ms: min, max_latency_ms: max, cols_per_second }
    }
}

/// Seeded inputs shared by all kernels of one run.
struct SyntheticData {
    a: Vec<f32>,
    b: Vec<f32>,
    ids: Vec<u32>,
    context_ids: Vec<u32>,
    paired_ids: Vec<u32>,
    grads: Vec<f32>,
}

impl SyntheticData {
    fn generate(cmd: &BenchCommand) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(cmd.seed);
        let scale = 0.5 / cmd.dim as f32;
        let vocab = cmd.vocab as u32;

        let matrix = |rng: &mut ChaCha8Rng| -> Vec<f32> {
            (0..cmd.dim * cmd.vocab).map(|_| rng.random_range(-scale..=scale)).collect()
        };
        let a = matrix(&mut rng);
        let b = matrix(&mut rng);

        let ids = |rng: &mut ChaCha8Rng, len: usize| -> Vec<u32> {
            (0..len).map(|_| rng.random_range(0..vocab)).collect()
        };
        let seq = ids(&mut rng, cmd.cols);
        let context_ids = ids(&mut rng, cmd.nwa * cmd.cols);
        let paired_ids = ids(&mut rng, cmd.nwb * cmd.cols);

        let grads = (0..cmd.nwa * cmd.nwb * cmd.cols).map(|_| rng.random_range(-0.1f32..=0.1)).collect();

        Self { a, b, ids: seq, context_ids, paired_ids, grads }
    }
}

impl BenchCommand {
    /// Execute the benchmark command
    pub fn execute(&self, config: &SgnsConfig) -> Result<()> {
        let results = self.run(config)?;
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&results).context("Failed to serialize results")?)
            }
            OutputFormat::Text => print_text(&results),
        }
        Ok(())
    }

    /// Run the selected kernels and collect statistics.
    pub fn run(&self, config: &SgnsConfig) -> Result<BenchmarkResults> {
        self.validate_args()?;

        let kernel = CpuKernel::new(config.kernel.clone()).context("Failed to create kernel")?;
        info!(
            "Benchmarking {:?} with dim={} vocab={} cols={} on {} threads",
            self.kernel,
            self.dim,
            self.vocab,
            self.cols,
            kernel.num_threads()
        );

        let data = SyntheticData::generate(self);
        let mut results = Vec::new();
        for kind in self.kernel.expand() {
            let statistics = self.bench_kernel(&kernel, kind, &data)?;
            results.push(KernelResult { kernel: kind, statistics });
        }

        Ok(BenchmarkResults {
            system_info: SystemInfo {
                os: std::env::consts::OS.to_string(),
                arch: std::env::consts::ARCH.to_string(),
                cpu_cores: num_cpus::get(),
                threads: kernel.num_threads(),
            },
            workload: Workload {
                dim: self.dim,
                vocab: self.vocab,
                cols: self.cols,
                skip: self.skip,
                nwa: self.nwa,
                nwb: self.nwb,
                lrate: self.lrate,
                iterations: self.iterations,
                warmup: self.warmup,
                seed: self.seed,
            },
            results,
        })
    }

    /// Validate command arguments
    fn validate_args(&self) -> Result<()> {
        if self.iterations == 0 {
            anyhow::bail!("Iterations must be greater than 0");
        }
        if self.dim == 0 {
            anyhow::bail!("Dimension must be greater than 0");
        }
        if self.vocab == 0 || self.vocab > u32::MAX as usize {
            anyhow::bail!("Vocabulary size must be in 1..={}", u32::MAX);
        }
        if self.dim.checked_mul(self.vocab).is_none() {
            anyhow::bail!("dim * vocab overflows");
        }
        let widest = self.nwa.checked_mul(self.nwb).map(|block| block.max(self.nwa).max(self.nwb));
        if widest.and_then(|w| w.checked_mul(self.cols)).is_none() {
            anyhow::bail!("Pair buffers would overflow");
        }
        Ok(())
    }

    fn bench_kernel(&self, kernel: &CpuKernel, kind: KernelKind, data: &SyntheticData) -> Result<Statistics> {
        let window = WindowShape::new(self.dim, self.cols, self.skip);
        let pairs = PairShape::new(self.dim, self.cols, self.nwa, self.nwb);
        let mut a = data.a.clone();
        let mut b = data.b.clone();
        let mut scores = vec![0.0f32; pairs.score_len()];

        let mut call = |a: &mut [f32], b: &mut [f32]| -> Result<()> {
            match kind {
                KernelKind::Windowed => kernel.windowed_update(window, &data.ids, a, b, self.lrate)?,
                KernelKind::Pairs => {
                    kernel.batched_pair_update(pairs, &data.context_ids, &data.paired_ids, a, b, self.lrate)?
                }
                KernelKind::Forward => kernel.forward_score(pairs, &data.context_ids, &data.paired_ids, a, b, &mut scores)?,
                KernelKind::Backward => {
                    kernel.backward_distribute(pairs, &data.context_ids, &data.paired_ids, a, b, &data.grads, self.lrate)?
                }
                KernelKind::All => anyhow::bail!("`all` must be expanded before dispatch"),
            }
            Ok(())
        };

        for i in 0..self.warmup {
            debug!("Warmup iteration {} for {:?}", i + 1, kind);
            a.copy_from_slice(&data.a);
            b.copy_from_slice(&data.b);
            call(&mut a, &mut b).with_context(|| format!("{kind:?} kernel failed"))?;
        }

        let mut latencies = Vec::with_capacity(self.iterations);
        for i in 0..self.iterations {
            a.copy_from_slice(&data.a);
            b.copy_from_slice(&data.b);
            let start = Instant::now();
            call(&mut a, &mut b).with_context(|| format!("{kind:?} kernel failed"))?;
            let ms = start.elapsed().as_secs_f64() * 1000.0;
            debug!("{:?} iteration {}: {:.3} ms", kind, i + 1, ms);
            latencies.push(ms);
        }

        Ok(Statistics::from_latencies(&latencies, self.cols))
    }
}

fn print_text(results: &BenchmarkResults) {
    let w = &results.workload;
    println!("{}", style("SGNS kernel benchmark").bold().cyan());
    println!(
        "  dim={} vocab={} cols={} skip={} nwa={} nwb={} seed={}",
        w.dim, w.vocab, w.cols, w.skip, w.nwa, w.nwb, w.seed
    );
    println!(
        "  {} threads on {} cores ({}/{})",
        results.system_info.threads, results.system_info.cpu_cores, results.system_info.os, results.system_info.arch
    );
    println!();
    println!("{:<10} {:>12} {:>12} {:>12} {:>16}", "kernel", "mean ms", "min ms", "max ms", "cols/s");
    for r in &results.results {
        let s = &r.statistics;
        println!(
            "{:<10} {:>12.3} {:>12.3} {:>12.3} {:>16.0}",
            format!("{:?}", r.kernel).to_lowercase(),
            s.mean_latency_ms,
            s.min_latency_ms,
            s.max_latency_ms,
            s.cols_per_second
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        cmd: BenchCommand,
    }

    fn parse(args: &[&str]) -> BenchCommand {
        TestCli::try_parse_from(std::iter::once("bench").chain(args.iter().copied())).unwrap().cmd
    }

    fn small_config() -> SgnsConfig {
        let mut config = SgnsConfig::default();
        config.kernel.num_threads = 2;
        config.kernel.validate_ids = true;
        config
    }

    #[test]
    fn statistics_summarise_latencies() {
        let s = Statistics::from_latencies(&[2.0, 4.0, 6.0], 1000);
        assert_eq!(s.mean_latency_ms, 4.0);
        assert_eq!(s.min_latency_ms, 2.0);
        assert_eq!(s.max_latency_ms, 6.0);
        assert_eq!(s.cols_per_second, 250_000.0);
    }

    #[test]
    fn all_expands_to_four_kernels() {
        assert_eq!(KernelKind::All.expand().len(), 4);
        assert_eq!(KernelKind::Pairs.expand(), vec![KernelKind::Pairs]);
    }

    #[test]
    fn small_run_reports_every_kernel() {
        let cmd = parse(&["--dim", "4", "--vocab", "16", "--cols", "32", "--iterations", "2", "--warmup", "1"]);
        let results = cmd.run(&small_config()).unwrap();
        assert_eq!(results.results.len(), 4);
        assert!(results.results.iter().all(|r| r.statistics.min_latency_ms <= r.statistics.max_latency_ms));
    }

    #[test]
    fn same_seed_same_workload() {
        let cmd = parse(&["--dim", "3", "--vocab", "5", "--cols", "7", "--seed", "9"]);
        let first = SyntheticData::generate(&cmd);
        let second = SyntheticData::generate(&cmd);
        assert_eq!(first.a, second.a);
        assert_eq!(first.paired_ids, second.paired_ids);
        assert!(first.ids.iter().all(|&id| id < 5));
    }

    #[test]
    fn zero_iterations_rejected() {
        let cmd = parse(&["--iterations", "0"]);
        assert!(cmd.run(&small_config()).is_err());
    }
}
