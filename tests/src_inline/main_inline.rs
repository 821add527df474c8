use super::*;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("kira-phylosim").chain(args.iter().copied()))
}

#[test]
fn test_simulate_accepts_script_flags() {
    let cli = parse(&[
        "simulate",
        "-i",
        "rec.bed",
        "-b",
        "bg.bed",
        "-d",
        "scores",
        "--random_flank",
        "-n",
        "3",
        "--down_window",
        "500",
    ])
    .unwrap();
    let Commands::Simulate(args) = cli.command else {
        panic!("expected simulate");
    };
    let config = SimulationConfig::from(args);
    assert_eq!(config.mode, SimulationMode::RandomFlanking);
    assert_eq!(config.iterations, 3);
    assert_eq!(config.window_down, 500);
    assert_eq!(config.window_up, DEFAULT_WINDOW);
    assert_eq!(config.features, PathBuf::from("rec.bed"));
}

#[test]
fn test_mode_flags_are_exclusive_and_required() {
    assert!(parse(&["simulate", "-i", "a", "-b", "b", "-d", "c"]).is_err());
    assert!(parse(&["simulate", "-i", "a", "-b", "b", "-d", "c", "--random", "--flanking"]).is_err());
    assert!(parse(&["simulate", "-i", "a", "-b", "b", "-d", "c", "--random-flank"]).is_ok());
}

#[test]
fn test_drive_into_config() {
    let cli = parse(&[
        "-v",
        "drive",
        "intervals.txt",
        "--background",
        "bg.bed",
        "--data-dir",
        "scores",
        "--random",
        "--iterations",
        "10",
        "--out",
        "results.txt",
        "--simulator",
        "python3",
        "--simulator-arg",
        "simulation_features.py",
        "--timeout-secs",
        "30",
        "--stop-file",
        "STOP",
    ])
    .unwrap();
    assert_eq!(cli.verbose, 1);
    let Commands::Drive(args) = cli.command else {
        panic!("expected drive");
    };
    let config = args.into_config().unwrap();
    assert_eq!(config.mode, SimulationMode::RandomIntragenic);
    assert_eq!(config.iterations, 10);
    assert_eq!(config.simulator.program, PathBuf::from("python3"));
    assert_eq!(
        config.simulator.prefix_args,
        vec![OsString::from("simulation_features.py")]
    );
    assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    assert_eq!(config.stop_file, Some(PathBuf::from("STOP")));
    assert_eq!(config.window_down, None);
}

#[test]
fn test_drive_rejects_windows_outside_random_flank() {
    let cli = parse(&[
        "drive",
        "intervals.txt",
        "--background",
        "bg.bed",
        "--data-dir",
        "scores",
        "--flanking",
        "--out",
        "results.txt",
        "--up-window",
        "100",
    ])
    .unwrap();
    let Commands::Drive(args) = cli.command else {
        panic!("expected drive");
    };
    assert!(args.into_config().is_err());
}

fn drive_config_error(extra: &[&str]) -> String {
    let mut args = vec![
        "drive",
        "intervals.txt",
        "--background",
        "bg.bed",
        "--data-dir",
        "scores",
        "--out",
        "results.txt",
        "--simulator",
        "sim",
    ];
    args.extend_from_slice(extra);
    let cli = parse(&args).unwrap();
    let Commands::Drive(args) = cli.command else {
        panic!("expected drive");
    };
    args.into_config().unwrap_err().to_string()
}

#[test]
fn test_drive_rejects_iterations_with_flanking() {
    let err = drive_config_error(&["--flanking", "--iterations", "3"]);
    assert!(err.contains("--iterations is only accepted"), "{err}");
}

#[test]
fn test_drive_rejects_zero_iterations() {
    let err = drive_config_error(&["--random", "--iterations", "0"]);
    assert!(err.contains("at least 1"), "{err}");
    let err = drive_config_error(&["--random-flank", "--iterations", "0"]);
    assert!(err.contains("at least 1"), "{err}");
}

#[test]
fn test_analyze_args() {
    let cli = parse(&["analyze", "results.txt", "--out", "plots", "--no-plots"]).unwrap();
    let Commands::Analyze(args) = cli.command else {
        panic!("expected analyze");
    };
    let config = AnalysisConfig::from(args);
    assert!(!config.plots);
    assert!(config.plan.is_none());
    assert_eq!(config.out_dir, PathBuf::from("plots"));
}
