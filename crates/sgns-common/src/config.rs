//! Runtime configuration for the SGNS kernels.
//!
//! Loads [`SgnsConfig`] from a TOML file (`sgns.toml`) with environment
//! variable overrides via `SGNS_*` prefixed variables. Every field has a
//! default, so partial files are accepted.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest accepted worker thread name prefix.
const MAX_THREAD_PREFIX_LEN: usize = 32;

/// Output format for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Kernel execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Worker thread count; `0` uses every logical CPU.
    /// Override: `SGNS_NUM_THREADS`
    pub num_threads: usize,

    /// Minimum number of outer indices handed to a worker per split.
    /// Override: `SGNS_MIN_CHUNK_LEN`
    pub min_chunk_len: usize,

    /// Prefix for worker thread names.
    /// Override: `SGNS_THREAD_NAME_PREFIX`
    pub thread_name_prefix: String,

    /// Scan id buffers against the vocabulary size before each call.
    /// Override: `SGNS_VALIDATE_IDS`
    pub validate_ids: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            min_chunk_len: 16,
            thread_name_prefix: "sgns-worker".to_string(),
            validate_ids: cfg!(debug_assertions),
        }
    }
}

impl KernelConfig {
    /// Thread count after resolving `0` to the number of logical CPUs.
    pub fn effective_threads(&self) -> usize {
        if self.num_threads == 0 { num_cpus::get().max(1) } else { self.num_threads }
    }
}

/// Logging settings consumed by binaries that install a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `sgns_kernels=debug`.
    /// Override: `SGNS_LOG_LEVEL`
    pub level: String,

    /// Override: `SGNS_LOG_FORMAT`
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SgnsConfig {
    pub kernel: KernelConfig,
    pub logging: LoggingConfig,
}

/// Errors that can occur when loading or validating an [`SgnsConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid environment override {key}={value}: {reason}")]
    EnvOverride { key: String, value: String, reason: String },
}

fn env_override<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::EnvOverride {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

impl SgnsConfig {
    /// Render the default configuration as TOML.
    pub fn default_toml() -> Result<String, ConfigError> {
        Self::default().to_toml()
    }

    /// Render this configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut cfg: SgnsConfig = toml::from_str(toml_str)?;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load only from environment variables, starting from defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let kernel = &self.kernel;
        if kernel.min_chunk_len == 0 {
            return Err(ConfigError::Validation("min_chunk_len must be > 0".into()));
        }
        if kernel.thread_name_prefix.is_empty() {
            return Err(ConfigError::Validation("thread_name_prefix must not be empty".into()));
        }
        if kernel.thread_name_prefix.len() > MAX_THREAD_PREFIX_LEN {
            return Err(ConfigError::Validation(format!(
                "thread_name_prefix must be <= {MAX_THREAD_PREFIX_LEN} characters"
            )));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Validation("logging.level must not be empty".into()));
        }
        Ok(())
    }

    /// Apply `SGNS_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("SGNS_NUM_THREADS") {
            self.kernel.num_threads = env_override("SGNS_NUM_THREADS", &val)?;
        }

        if let Ok(val) = std::env::var("SGNS_MIN_CHUNK_LEN") {
            self.kernel.min_chunk_len = env_override("SGNS_MIN_CHUNK_LEN", &val)?;
        }

        if let Ok(val) = std::env::var("SGNS_THREAD_NAME_PREFIX") {
            self.kernel.thread_name_prefix = val;
        }

        if let Ok(val) = std::env::var("SGNS_VALIDATE_IDS") {
            self.kernel.validate_ids = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Ok(val) = std::env::var("SGNS_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Ok(val) = std::env::var("SGNS_LOG_FORMAT") {
            self.logging.format = env_override("SGNS_LOG_FORMAT", &val)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: [&str; 6] = [
        "SGNS_NUM_THREADS",
        "SGNS_MIN_CHUNK_LEN",
        "SGNS_THREAD_NAME_PREFIX",
        "SGNS_VALIDATE_IDS",
        "SGNS_LOG_LEVEL",
        "SGNS_LOG_FORMAT",
    ];

    fn cleared_except<'a>(set: &[(&'a str, &'a str)]) -> Vec<(&'a str, Option<&'a str>)> {
        ALL_VARS
            .iter()
            .map(|&key| (key, set.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)))
            .collect()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(SgnsConfig::default().validate().is_ok());
    }

    #[test]
    #[serial(sgns_env)]
    fn test_default_toml_round_trips() {
        temp_env::with_vars(cleared_except(&[]), || {
            let toml_str = SgnsConfig::default_toml().unwrap();
            let cfg = SgnsConfig::from_toml(&toml_str).unwrap();
            assert_eq!(cfg, SgnsConfig::default());
        });
    }

    #[test]
    #[serial(sgns_env)]
    fn test_partial_toml_uses_defaults() {
        temp_env::with_vars(cleared_except(&[]), || {
            let cfg = SgnsConfig::from_toml("[kernel]\nnum_threads = 3\n").unwrap();
            assert_eq!(cfg.kernel.num_threads, 3);
            assert_eq!(cfg.kernel.min_chunk_len, KernelConfig::default().min_chunk_len);
            assert_eq!(cfg.logging, LoggingConfig::default());
        });
    }

    #[test]
    fn test_validation_zero_chunk() {
        let mut cfg = SgnsConfig::default();
        cfg.kernel.min_chunk_len = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("min_chunk_len must be > 0"));
    }

    #[test]
    fn test_validation_long_prefix() {
        let mut cfg = SgnsConfig::default();
        cfg.kernel.thread_name_prefix = "w".repeat(33);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("<= 32 characters"));
    }

    #[test]
    fn test_effective_threads_resolves_zero() {
        let cfg = KernelConfig { num_threads: 0, ..Default::default() };
        assert!(cfg.effective_threads() >= 1);
        let cfg = KernelConfig { num_threads: 5, ..Default::default() };
        assert_eq!(cfg.effective_threads(), 5);
    }

    #[test]
    #[serial(sgns_env)]
    fn test_env_override_multiple_fields() {
        temp_env::with_vars(
            cleared_except(&[
                ("SGNS_NUM_THREADS", "2"),
                ("SGNS_MIN_CHUNK_LEN", "64"),
                ("SGNS_THREAD_NAME_PREFIX", "w2v"),
                ("SGNS_VALIDATE_IDS", "yes"),
                ("SGNS_LOG_LEVEL", "debug"),
                ("SGNS_LOG_FORMAT", "json"),
            ]),
            || {
                let cfg = SgnsConfig::from_env().unwrap();
                assert_eq!(cfg.kernel.num_threads, 2);
                assert_eq!(cfg.kernel.min_chunk_len, 64);
                assert_eq!(cfg.kernel.thread_name_prefix, "w2v");
                assert!(cfg.kernel.validate_ids);
                assert_eq!(cfg.logging.level, "debug");
                assert_eq!(cfg.logging.format, LogFormat::Json);
            },
        );
    }

    #[test]
    #[serial(sgns_env)]
    fn test_env_override_invalid_thread_count() {
        temp_env::with_vars(cleared_except(&[("SGNS_NUM_THREADS", "many")]), || {
            match SgnsConfig::from_env().unwrap_err() {
                ConfigError::EnvOverride { key, value, .. } => {
                    assert_eq!(key, "SGNS_NUM_THREADS");
                    assert_eq!(value, "many");
                }
                other => panic!("expected EnvOverride, got: {other}"),
            }
        });
    }

    #[test]
    fn test_log_format_display_roundtrip() {
        for format in [LogFormat::Pretty, LogFormat::Compact, LogFormat::Json] {
            let parsed: LogFormat = format.to_string().parse().unwrap();
            assert_eq!(parsed, format);
        }
    }
}
