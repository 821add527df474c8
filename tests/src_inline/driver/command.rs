use super::*;

fn sh(script: &str) -> SimulatorCommand {
    SimulatorCommand {
        program: PathBuf::from("sh"),
        prefix_args: vec![OsString::from("-c"), OsString::from(script)],
    }
}

#[test]
fn test_invoke_captures_stdout() {
    let out = invoke(&sh("printf 'x\\ty\\n'"), &[], None).unwrap();
    assert_eq!(out, b"x\ty\n");
}

#[test]
fn test_invoke_reports_exit_status_and_stderr() {
    let err = invoke(&sh("echo bad input >&2; exit 2"), &[], None).unwrap_err();
    assert_eq!(
        err,
        InvocationFailure::Exit {
            code: Some(2),
            stderr: "bad input".to_string(),
        }
    );
    assert_eq!(err.to_string(), "exit status 2 (bad input)");
}

#[test]
fn test_invoke_missing_program() {
    let command = SimulatorCommand {
        program: PathBuf::from("/nonexistent/kira-simulator"),
        prefix_args: Vec::new(),
    };
    let err = invoke(&command, &[], None).unwrap_err();
    assert!(matches!(err, InvocationFailure::Spawn(_)));
}

#[test]
fn test_invoke_times_out() {
    let err = invoke(
        &sh("exec sleep 5"),
        &[],
        Some(Duration::from_millis(100)),
    )
    .unwrap_err();
    assert_eq!(err, InvocationFailure::TimedOut(Duration::from_millis(100)));
}

#[test]
fn test_stderr_tail_is_bounded() {
    let long = "e".repeat(1_000);
    let tail = stderr_tail(long.as_bytes());
    assert!(tail.starts_with("..."));
    assert_eq!(tail.len(), STDERR_TAIL + 3);
}

#[test]
fn test_prefix_args_precede_record_args() {
    let command = SimulatorCommand {
        program: PathBuf::from("sh"),
        prefix_args: vec![
            OsString::from("-c"),
            OsString::from("echo \"$0 $@\""),
            OsString::from("sim"),
        ],
    };
    let config = DriverConfig {
        intervals: PathBuf::from("iv.bed"),
        background: PathBuf::from("bg.bed"),
        data_dir: PathBuf::from("scores"),
        mode: crate::simulate::SimulationMode::Flanking,
        iterations: 1,
        window_down: None,
        window_up: None,
        output: PathBuf::from("out.txt"),
        simulator: command.clone(),
        timeout: None,
        stop_file: None,
    };
    let args = config.simulator.args_for(Path::new("rec.bed"), &config);
    assert_eq!(args.first(), Some(&OsString::from("-i")));
    assert!(!args.contains(&OsString::from("-c")));

    let out = invoke(&command, &args, None).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "sim -i rec.bed -b bg.bed -d scores --flanking -n 1\n"
    );
}
