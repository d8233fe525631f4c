//! Process-wide kernel behind the C API
//!
//! The kernel is held in an `Arc` so a call in flight keeps its pool alive
//! even if another thread runs `sgns_cleanup` or re-initialises meanwhile.

use crate::error::SgnsCError;
use sgns_common::SgnsConfig;
use sgns_kernels::CpuKernel;
use std::sync::{Arc, RwLock};

static KERNEL: RwLock<Option<Arc<CpuKernel>>> = RwLock::new(None);

fn build_kernel(num_threads: usize) -> Result<Arc<CpuKernel>, SgnsCError> {
    let mut config = SgnsConfig::from_env()?.kernel;
    if num_threads > 0 {
        config.num_threads = num_threads;
    }
    // Ids from C callers are always range-checked.
    config.validate_ids = true;
    let kernel = CpuKernel::new(config)?;
    log::info!("sgns-ffi: kernel ready with {} threads", kernel.num_threads());
    Ok(Arc::new(kernel))
}

/// Create (or replace) the global kernel. `0` keeps the configured count.
pub fn initialize(num_threads: usize) -> Result<(), SgnsCError> {
    let kernel = build_kernel(num_threads)?;
    let mut slot = KERNEL
        .write()
        .map_err(|_| SgnsCError::Internal("Failed to acquire kernel write lock".to_string()))?;
    *slot = Some(kernel);
    Ok(())
}

/// Drop the global kernel. Calls already running finish on their own handle.
pub fn cleanup() -> Result<(), SgnsCError> {
    let mut slot = KERNEL
        .write()
        .map_err(|_| SgnsCError::Internal("Failed to acquire kernel write lock".to_string()))?;
    if slot.take().is_some() {
        log::info!("sgns-ffi: kernel released");
    }
    Ok(())
}

/// Current kernel, creating a default one on first use.
pub fn kernel() -> Result<Arc<CpuKernel>, SgnsCError> {
    {
        let slot = KERNEL
            .read()
            .map_err(|_| SgnsCError::Internal("Failed to acquire kernel read lock".to_string()))?;
        if let Some(kernel) = slot.as_ref() {
            return Ok(Arc::clone(kernel));
        }
    }

    let mut slot = KERNEL
        .write()
        .map_err(|_| SgnsCError::Internal("Failed to acquire kernel write lock".to_string()))?;
    match slot.as_ref() {
        Some(kernel) => Ok(Arc::clone(kernel)),
        None => {
            let kernel = build_kernel(0)?;
            *slot = Some(Arc::clone(&kernel));
            Ok(kernel)
        }
    }
}

/// Thread count of the live kernel, or `None` before initialisation.
pub fn num_threads() -> Result<Option<usize>, SgnsCError> {
    let slot = KERNEL
        .read()
        .map_err(|_| SgnsCError::Internal("Failed to acquire kernel read lock".to_string()))?;
    Ok(slot.as_ref().map(|k| k.num_threads()))
}
