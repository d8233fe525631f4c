//! File-based configuration loading and error conversion.

use proptest::prelude::*;
use serial_test::serial;
use sgns_common::*;
use std::path::Path;

fn without_overrides<R>(f: impl FnOnce() -> R) -> R {
    temp_env::with_vars(
        [
            ("SGNS_NUM_THREADS", None::<&str>),
            ("SGNS_MIN_CHUNK_LEN", None),
            ("SGNS_THREAD_NAME_PREFIX", None),
            ("SGNS_VALIDATE_IDS", None),
            ("SGNS_LOG_LEVEL", None),
            ("SGNS_LOG_FORMAT", None),
        ],
        f,
    )
}

#[test]
#[serial(sgns_env)]
fn load_from_tempfile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sgns.toml");
    std::fs::write(
        &path,
        r#"
[kernel]
num_threads = 1
min_chunk_len = 4
thread_name_prefix = "hogwild"
validate_ids = true

[logging]
level = "sgns_kernels=debug"
format = "compact"
"#,
    )
    .unwrap();

    let cfg = without_overrides(|| SgnsConfig::load(&path)).unwrap();
    assert_eq!(cfg.kernel.num_threads, 1);
    assert_eq!(cfg.kernel.min_chunk_len, 4);
    assert_eq!(cfg.kernel.thread_name_prefix, "hogwild");
    assert!(cfg.kernel.validate_ids);
    assert_eq!(cfg.logging.format, LogFormat::Compact);
}

#[test]
#[serial(sgns_env)]
fn env_overrides_win_over_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sgns.toml");
    std::fs::write(&path, "[kernel]\nnum_threads = 8\n").unwrap();

    let cfg = temp_env::with_var("SGNS_NUM_THREADS", Some("1"), || SgnsConfig::load(&path)).unwrap();
    assert_eq!(cfg.kernel.num_threads, 1);
}

#[test]
fn load_nonexistent_file_is_io_error() {
    let result = SgnsConfig::load(Path::new("/nonexistent/sgns.toml"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
#[serial(sgns_env)]
fn malformed_toml_is_parse_error() {
    let result = without_overrides(|| SgnsConfig::from_toml("[kernel\nnum_threads = "));
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn config_error_converts_to_sgns_error() {
    let err: SgnsError = ConfigError::Validation("min_chunk_len must be > 0".into()).into();
    assert!(matches!(err, SgnsError::Config(ref msg) if msg.contains("min_chunk_len")));

    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: SgnsError = ConfigError::Io(io).into();
    assert!(matches!(err, SgnsError::Io(_)));
}

proptest! {
    #[test]
    fn kernel_error_display_never_empty(reason in "[a-z ]{1,40}", index in any::<u32>(), vocab in 0usize..1_000_000) {
        let invalid = KernelError::InvalidArguments { reason: reason.clone() };
        prop_assert!(invalid.to_string().contains(&reason));

        let oob = KernelError::IndexOutOfBounds { buffer: "ids", index, vocab_size: vocab };
        let msg = oob.to_string();
        prop_assert!(msg.contains(&index.to_string()));
        prop_assert!(msg.contains(&vocab.to_string()));
    }
}
