//! CLI argument parsing tests using clap's test utilities (no process spawning).

use clap::Parser;
use sgns_cli::commands::bench::{KernelKind, OutputFormat};
use sgns_cli::commands::ConfigAction;
use sgns_cli::{Cli, Commands};

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("sgns").chain(args.iter().copied()))
}

#[test]
fn test_build_cli_command_name_is_sgns() {
    assert_eq!(sgns_cli::build_cli().get_name(), "sgns");
}

#[test]
fn test_build_cli_is_consistent() {
    sgns_cli::build_cli().debug_assert();
}

#[test]
fn test_bench_defaults() {
    let cli = parse(&["bench"]).unwrap();
    let Some(Commands::Bench(cmd)) = cli.command else { panic!("expected bench") };
    assert_eq!(cmd.kernel, KernelKind::All);
    assert_eq!(cmd.format, OutputFormat::Text);
    assert_eq!(cmd.iterations, 10);
    assert_eq!(cmd.seed, 42);
}

#[test]
fn test_bench_kernel_values() {
    for (arg, kind) in [
        ("windowed", KernelKind::Windowed),
        ("pairs", KernelKind::Pairs),
        ("forward", KernelKind::Forward),
        ("backward", KernelKind::Backward),
    ] {
        let cli = parse(&["bench", "--kernel", arg]).unwrap();
        let Some(Commands::Bench(cmd)) = cli.command else { panic!("expected bench") };
        assert_eq!(cmd.kernel, kind);
    }
    assert!(parse(&["bench", "--kernel", "gpu"]).is_err());
}

#[test]
fn test_benchmark_alias() {
    assert!(matches!(parse(&["benchmark"]).unwrap().command, Some(Commands::Bench(_))));
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&["demo", "--threads", "4", "--log-level", "debug"]).unwrap();
    assert_eq!(cli.threads, Some(4));
    assert_eq!(cli.log_level.as_deref(), Some("debug"));
}

#[test]
fn test_config_actions() {
    let cli = parse(&["config", "show"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Config { action: ConfigAction::Show })));
    let cli = parse(&["config", "default"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Config { action: ConfigAction::Default })));
    assert!(parse(&["config"]).is_err());
}

#[test]
fn test_negative_threads_rejected() {
    assert!(parse(&["--threads", "-1", "demo"]).is_err());
}
