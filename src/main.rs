mod analysis;
mod driver;
mod input;
mod model;
mod report;
mod simulate;
mod tracing;

use std::ffi::OsString;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::analysis::{AnalysisConfig, run_analysis};
use crate::driver::command::SimulatorCommand;
use crate::driver::{DriverConfig, StopFlag, run_driver};
use crate::simulate::{DEFAULT_WINDOW, SimulationConfig, SimulationMode, run_simulation};

#[derive(Debug, Parser)]
#[command(
    name = "kira-phylosim",
    version,
    about = "Simulate phyloP conservation backgrounds for BED intervals and compare observed against simulated scores."
)]
struct Cli {
    /// Increase log detail (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the simulator once per interval and append its output.
    Drive(DriveArgs),
    /// Score features against flanking or random background regions.
    Simulate(SimulateArgs),
    /// Plot and test observed vs simulated scores from a results table.
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Clone, Copy, Args)]
#[group(required = true, multiple = false)]
struct ModeFlags {
    /// Score the two flanks adjacent to each feature.
    #[arg(long)]
    flanking: bool,
    /// Sample same-size regions inside the feature's host transcript.
    #[arg(long)]
    random: bool,
    /// Sample same-size regions from a window on either side of the feature.
    #[arg(long = "random-flank", visible_alias = "random_flank")]
    random_flank: bool,
}

impl ModeFlags {
    fn mode(self) -> SimulationMode {
        if self.flanking {
            SimulationMode::Flanking
        } else if self.random {
            SimulationMode::RandomIntragenic
        } else {
            SimulationMode::RandomFlanking
        }
    }
}

#[derive(Debug, Args)]
struct DriveArgs {
    /// Interval file, one record per line.
    intervals: PathBuf,
    /// Background BED file passed to every invocation.
    #[arg(long)]
    background: PathBuf,
    /// Directory holding one phyloP score file per chromosome.
    #[arg(long = "data-dir")]
    data_dir: PathBuf,
    #[command(flatten)]
    mode: ModeFlags,
    #[arg(long, default_value_t = 1)]
    iterations: u32,
    /// Cumulative results file; created if missing, always appended to.
    #[arg(long)]
    out: PathBuf,
    /// External simulator program. Defaults to this binary's `simulate`.
    #[arg(long)]
    simulator: Option<PathBuf>,
    /// Leading argument for the simulator program (repeatable).
    #[arg(long = "simulator-arg", allow_hyphen_values = true)]
    simulator_args: Vec<OsString>,
    /// Kill an invocation that runs longer than this and count it as failed.
    #[arg(long = "timeout-secs")]
    timeout_secs: Option<u64>,
    /// Stop before the next record once this file exists.
    #[arg(long = "stop-file")]
    stop_file: Option<PathBuf>,
    #[arg(long = "down-window", alias = "down_window")]
    down_window: Option<u64>,
    #[arg(long = "up-window", alias = "up_window")]
    up_window: Option<u64>,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Features to score (BED).
    #[arg(short = 'i', long = "input")]
    features: PathBuf,
    /// Not-allowed regions; for --random also the host transcript regions.
    #[arg(short = 'b', long = "background")]
    regions: PathBuf,
    /// Directory holding one phyloP score file per chromosome.
    #[arg(short = 'd', long = "data-dir")]
    score_dir: PathBuf,
    #[command(flatten)]
    mode: ModeFlags,
    #[arg(short = 'n', long = "iterations", default_value_t = 1)]
    iterations: u32,
    #[arg(long = "down-window", alias = "down_window", default_value_t = DEFAULT_WINDOW)]
    down_window: u64,
    #[arg(long = "up-window", alias = "up_window", default_value_t = DEFAULT_WINDOW)]
    up_window: u64,
    /// Seed for reproducible sampling.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Results table with category, direction, host_age_cat, age_bin, obs_sim and phyloP_score columns.
    input: PathBuf,
    /// Output directory for plots, ranksum.tsv and summary.json.
    #[arg(long)]
    out: PathBuf,
    /// TOML analysis plan; the built-in plan is used when absent.
    #[arg(long)]
    plan: Option<PathBuf>,
    /// Only run the rank-sum tests.
    #[arg(long = "no-plots")]
    no_plots: bool,
}

impl DriveArgs {
    fn into_config(self) -> Result<DriverConfig> {
        let mode = self.mode.mode();
        if self.iterations == 0 {
            bail!("--iterations must be at least 1");
        }
        if mode == SimulationMode::Flanking && self.iterations != 1 {
            bail!("--iterations is only accepted with --random or --random-flank");
        }
        if mode != SimulationMode::RandomFlanking
            && (self.down_window.is_some() || self.up_window.is_some())
        {
            bail!("--down-window/--up-window are only accepted with --random-flank");
        }
        let simulator = match self.simulator {
            Some(program) => SimulatorCommand {
                program,
                prefix_args: self.simulator_args,
            },
            None => {
                if !self.simulator_args.is_empty() {
                    bail!("--simulator-arg requires --simulator");
                }
                SimulatorCommand::builtin().context("cannot locate the running executable")?
            }
        };
        Ok(DriverConfig {
            intervals: self.intervals,
            background: self.background,
            data_dir: self.data_dir,
            mode,
            iterations: self.iterations,
            window_down: self.down_window,
            window_up: self.up_window,
            output: self.out,
            simulator,
            timeout: self
                .timeout_secs
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs),
            stop_file: self.stop_file,
        })
    }
}

impl From<SimulateArgs> for SimulationConfig {
    fn from(args: SimulateArgs) -> Self {
        SimulationConfig {
            features: args.features,
            regions: args.regions,
            score_dir: args.score_dir,
            mode: args.mode.mode(),
            iterations: args.iterations,
            window_down: args.down_window,
            window_up: args.up_window,
            seed: args.seed,
        }
    }
}

impl From<AnalyzeArgs> for AnalysisConfig {
    fn from(args: AnalyzeArgs) -> Self {
        AnalysisConfig {
            input: args.input,
            out_dir: args.out,
            plan: args.plan,
            plots: !args.no_plots,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    tracing::init(cli.verbose);
    if let Err(err) = run(cli.command) {
        crate::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Drive(args) => {
            let config = args.into_config()?;
            let summary = run_driver(&config, &StopFlag::new())
                .with_context(|| format!("driver run on {} failed", config.intervals.display()))?;
            if !summary.failures.is_empty() {
                let lines: Vec<String> = summary
                    .failures
                    .iter()
                    .map(|f| format!("{} (line {})", f.index, f.line_no))
                    .collect();
                crate::warn!(
                    "{} record(s) failed: {}",
                    summary.failures.len(),
                    lines.join(", ")
                );
            }
        }
        Commands::Simulate(args) => {
            let config = SimulationConfig::from(args);
            let stdout = std::io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let summary = run_simulation(&config, &mut out)
                .with_context(|| format!("simulation of {} failed", config.features.display()))?;
            out.flush().context("cannot flush simulation output")?;
            crate::debug!(
                "{} of {} features written, {} without a score track",
                summary.written,
                summary.features,
                summary.missing_track
            );
        }
        Commands::Analyze(args) => {
            let config = AnalysisConfig::from(args);
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let summary = run_analysis(&config, &mut out)
                .with_context(|| format!("analysis of {} failed", config.input.display()))?;
            crate::info!(
                "{} comparisons written to {}",
                summary.comparisons.len(),
                config.out_dir.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
