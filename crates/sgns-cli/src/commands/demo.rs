//! Three-token windowed scenario
//!
//! `nrows = 2`, ids `[0, 1, 0]`, `skip = 1`, with A and B both starting as
//! the 2x2 identity. Small enough to check every number by hand.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use sgns_common::{KernelConfig, SgnsConfig};
use sgns_kernels::{CpuKernel, WindowShape};
use tracing::debug;

const NROWS: usize = 2;
const IDS: [u32; 3] = [0, 1, 0];
const SKIP: usize = 1;

#[derive(Args, Debug)]
pub struct DemoCommand {
    /// Learning rate
    #[arg(long, default_value_t = 0.1, value_name = "RATE")]
    pub lrate: f32,
}

/// Matrices before and after the update.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoOutcome {
    pub before: (Vec<f32>, Vec<f32>),
    pub after: (Vec<f32>, Vec<f32>),
}

impl DemoCommand {
    pub fn run(&self, config: &SgnsConfig) -> Result<DemoOutcome> {
        // Always one thread so the result is reproducible.
        let kernel = CpuKernel::new(KernelConfig { num_threads: 1, validate_ids: true, ..config.kernel.clone() })
            .context("Failed to create single-thread kernel")?;

        let a = vec![1.0f32, 0.0, 0.0, 1.0];
        let b = vec![1.0f32, 0.0, 0.0, 1.0];
        let (mut a_new, mut b_new) = (a.clone(), b.clone());
        debug!("Running windowed demo with lrate {}", self.lrate);
        kernel
            .windowed_update(WindowShape::new(NROWS, IDS.len(), SKIP), &IDS, &mut a_new, &mut b_new, self.lrate)
            .context("Windowed update failed")?;

        Ok(DemoOutcome { before: (a, b), after: (a_new, b_new) })
    }

    pub fn execute(&self, config: &SgnsConfig) -> Result<()> {
        let outcome = self.run(config)?;

        println!("{}", style("Windowed update demo").bold().cyan());
        println!("  nrows = {NROWS}, ids = {IDS:?}, skip = {SKIP}, lrate = {}", self.lrate);
        println!();
        print_matrices("Before", &outcome.before);
        print_matrices("After", &outcome.after);
        Ok(())
    }
}

fn print_matrices(title: &str, (a, b): &(Vec<f32>, Vec<f32>)) {
    println!("{}", style(format!("{title}:")).bold());
    for (name, m) in [("A", a), ("B", b)] {
        for (v, column) in m.chunks(NROWS).enumerate() {
            let cells: Vec<String> = column.iter().map(|x| format!("{x:>11.8}")).collect();
            println!("  {name}[:, {v}] = [{}]", cells.join(", "));
        }
    }
    println!();
}
