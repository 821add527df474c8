use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::driver::DriverConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const STDERR_TAIL: usize = 400;

/// The external scoring program plus any leading arguments, e.g.
/// `python simulation_features.py` or this binary's own `simulate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorCommand {
    pub program: PathBuf,
    pub prefix_args: Vec<OsString>,
}

impl SimulatorCommand {
    /// Re-invokes the running executable's `simulate` subcommand.
    pub fn builtin() -> std::io::Result<Self> {
        Ok(Self {
            program: std::env::current_exe()?,
            prefix_args: vec![OsString::from("simulate")],
        })
    }

    /// Per-record arguments; `invoke` puts `prefix_args` in front of them.
    pub fn args_for(&self, record_path: &Path, config: &DriverConfig) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        args.push("-i".into());
        args.push(record_path.into());
        args.push("-b".into());
        args.push(config.background.clone().into());
        args.push("-d".into());
        args.push(config.data_dir.clone().into());
        args.push(config.mode.flag().into());
        args.push("-n".into());
        args.push(config.iterations.to_string().into());
        if let Some(down) = config.window_down {
            args.push("--down_window".into());
            args.push(down.to_string().into());
        }
        if let Some(up) = config.window_up {
            args.push("--up_window".into());
            args.push(up.to_string().into());
        }
        args
    }

    pub fn display(&self) -> String {
        let mut out = self.program.display().to_string();
        for arg in &self.prefix_args {
            out.push(' ');
            out.push_str(&arg.to_string_lossy());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationFailure {
    Spawn(String),
    Exit {
        code: Option<i32>,
        stderr: String,
    },
    TimedOut(Duration),
    EmptyOutput,
}

impl std::fmt::Display for InvocationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvocationFailure::Spawn(msg) => write!(f, "failed to start: {msg}"),
            InvocationFailure::Exit { code, stderr } => {
                match code {
                    Some(code) => write!(f, "exit status {code}")?,
                    None => write!(f, "terminated by signal")?,
                }
                if !stderr.is_empty() {
                    write!(f, " ({stderr})")?;
                }
                Ok(())
            }
            InvocationFailure::TimedOut(limit) => {
                write!(f, "timed out after {:.1}s", limit.as_secs_f64())
            }
            InvocationFailure::EmptyOutput => write!(f, "exit status 0 but produced no output"),
        }
    }
}

/// Runs one invocation to completion and returns its stdout.
pub fn invoke(
    command: &SimulatorCommand,
    args: &[OsString],
    timeout: Option<Duration>,
) -> Result<Vec<u8>, InvocationFailure> {
    let mut child = Command::new(&command.program)
        .args(&command.prefix_args)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| InvocationFailure::Spawn(format!("{}: {e}", command.program.display())))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    // On timeout the drain threads are detached: a killed child's own
    // children may still hold the pipes open.
    let status = wait_with_timeout(&mut child, timeout)?;
    let stdout = join_drain(stdout);
    let stderr = join_drain(stderr);

    if !status.success() {
        return Err(InvocationFailure::Exit {
            code: status.code(),
            stderr: stderr_tail(&stderr),
        });
    }
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Err(InvocationFailure::EmptyOutput);
    }
    Ok(stdout)
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> Result<ExitStatus, InvocationFailure> {
    let Some(limit) = timeout else {
        return child
            .wait()
            .map_err(|e| InvocationFailure::Spawn(e.to_string()));
    };
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if started.elapsed() >= limit => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(InvocationFailure::TimedOut(limit));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(InvocationFailure::Spawn(e.to_string())),
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_drain(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= STDERR_TAIL {
        return trimmed.replace('\n', " | ");
    }
    let tail: String = chars[chars.len() - STDERR_TAIL..].iter().collect();
    format!("...{}", tail.replace('\n', " | "))
}

#[cfg(test)]
#[path = "../../tests/src_inline/driver/command.rs"]
mod tests;
