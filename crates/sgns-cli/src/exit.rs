// Exit codes for scripted callers
use sgns_common::{ConfigError, SgnsError};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_GENERIC_FAIL: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_KERNEL: i32 = 3;

/// Pick the exit code for an error by looking through its cause chain.
pub fn code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.downcast_ref::<ConfigError>().is_some() {
            return EXIT_CONFIG;
        }
        match cause.downcast_ref::<SgnsError>() {
            Some(SgnsError::Config(_)) => return EXIT_CONFIG,
            Some(SgnsError::Kernel(_)) => return EXIT_KERNEL,
            _ => {}
        }
    }
    EXIT_GENERIC_FAIL
}
