use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::input::bed::{IntervalRecord, read_interval_records};
use crate::input::{InputError, SkippedLine};
use crate::simulate::SimulationMode;

pub mod command;

use command::{InvocationFailure, SimulatorCommand, invoke};

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub intervals: PathBuf,
    pub background: PathBuf,
    pub data_dir: PathBuf,
    pub mode: SimulationMode,
    pub iterations: u32,
    pub window_down: Option<u64>,
    pub window_up: Option<u64>,
    pub output: PathBuf,
    pub simulator: SimulatorCommand,
    pub timeout: Option<Duration>,
    pub stop_file: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("cannot write results to {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot create scratch record file: {0}")]
    Scratch(#[source] std::io::Error),
}

/// Cooperative cancellation checked between records.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// 1-based position among the well-formed records.
    pub index: usize,
    pub line_no: usize,
    pub record: String,
    pub failure: InvocationFailure,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverSummary {
    pub records: usize,
    pub processed: usize,
    pub appended: usize,
    pub failures: Vec<RecordFailure>,
    pub malformed: Vec<SkippedLine>,
    pub stopped_early: bool,
}

/// Runs the simulator once per interval record, appending each successful
/// invocation's stdout to `config.output`.
pub fn run_driver(config: &DriverConfig, stop: &StopFlag) -> Result<DriverSummary, DriverError> {
    if !config.background.is_file() {
        return Err(InputError::MissingInput(format!(
            "background file {} not found",
            config.background.display()
        ))
        .into());
    }
    if !config.data_dir.is_dir() {
        return Err(InputError::MissingInput(format!(
            "score directory {} not found",
            config.data_dir.display()
        ))
        .into());
    }

    let (records, malformed) = read_interval_records(&config.intervals)?;
    let mut output = open_append(&config.output)?;

    crate::info!(
        "driving {} records through {} ({} mode, {} iterations)",
        records.len(),
        config.simulator.display(),
        config.mode.name(),
        config.iterations
    );

    let mut summary = DriverSummary {
        records: records.len(),
        malformed,
        ..DriverSummary::default()
    };

    for record in &records {
        if should_stop(config, stop) {
            crate::warn!(
                "stop requested; {} of {} records left unprocessed",
                records.len() - summary.processed,
                records.len()
            );
            summary.stopped_early = true;
            break;
        }
        summary.processed += 1;

        match run_record(config, record) {
            Ok(block) => {
                append_block(&mut output, &block).map_err(|source| DriverError::Output {
                    path: config.output.clone(),
                    source,
                })?;
                summary.appended += 1;
                crate::debug!("record {} ({}) appended", record.line_no, record.label());
            }
            Err(RecordError::Invocation(failure)) => {
                crate::error!(
                    "simulation failed for record {} (line {}: {}): {}",
                    summary.processed,
                    record.line_no,
                    record.tab_line(),
                    failure
                );
                summary.failures.push(RecordFailure {
                    index: summary.processed,
                    line_no: record.line_no,
                    record: record.tab_line(),
                    failure,
                });
            }
            Err(RecordError::Scratch(e)) => return Err(DriverError::Scratch(e)),
        }
    }

    crate::info!(
        "driver finished: {} appended, {} failed, {} malformed, {} not run",
        summary.appended,
        summary.failures.len(),
        summary.malformed.len(),
        summary.records - summary.processed
    );
    Ok(summary)
}

enum RecordError {
    Invocation(InvocationFailure),
    Scratch(std::io::Error),
}

fn run_record(config: &DriverConfig, record: &IntervalRecord) -> Result<Vec<u8>, RecordError> {
    let mut scratch = tempfile::Builder::new()
        .prefix("kira-phylosim-record-")
        .suffix(".bed")
        .tempfile()
        .map_err(RecordError::Scratch)?;
    writeln!(scratch, "{}", record.tab_line()).map_err(RecordError::Scratch)?;
    scratch.flush().map_err(RecordError::Scratch)?;

    let args = config.simulator.args_for(scratch.path(), config);
    invoke(&config.simulator, &args, config.timeout).map_err(RecordError::Invocation)
}

fn should_stop(config: &DriverConfig, stop: &StopFlag) -> bool {
    if !stop.is_raised() {
        if let Some(path) = &config.stop_file {
            if path.exists() {
                crate::info!("stop file {} present", path.display());
                stop.raise();
            }
        }
    }
    stop.is_raised()
}

fn open_append(path: &Path) -> Result<File, DriverError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| DriverError::Output {
            path: path.to_path_buf(),
            source,
        })
}

fn append_block(output: &mut File, block: &[u8]) -> std::io::Result<()> {
    output.write_all(block)?;
    if !block.ends_with(b"\n") {
        output.write_all(b"\n")?;
    }
    output.flush()
}

#[cfg(test)]
#[path = "../../tests/src_inline/driver/tests.rs"]
mod tests;
