#![warn(missing_docs)]
//! pvbench CLI Library
//!
//! This module provides the CLI infrastructure for the push-suite binary and
//! for binaries that register their own adapters. Use `pvbench_cli::run()` in
//! a main function to get the standard suite, or `run_with_registry` to add
//! cases of your own.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     pvbench_cli::run_with_registry(|registry, workload| {
//!         pvbench_adapters::register_push_suite(registry, workload)?;
//!         registry.register_adapter(MyVector::default(), workload)
//!     })
//! }
//! ```

mod config;
mod planner;

pub use config::*;
pub use planner::{build_plan, format_plan};

use anyhow::Context;
use clap::{Parser, Subcommand};
use pvbench_core::{
    AppendWorkload, CaseRegistry, Interrupt, RegistryError, Reporter, SamplerConfig, SuiteResult,
    SuiteRunner, check_equivalence, pin_to_cpu,
};
use pvbench_report::{ConsoleReporter, OutputFormat, ReportConfig, build_report, render};
use pvbench_stats::ConfidenceLevel;
use regex::Regex;
use std::io::Write;
use std::path::PathBuf;

/// pvbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "pvbench")]
#[command(author, version, about = "pvbench - persistent vector push benchmarks")]
pub struct Cli {
    /// Optional subcommand (List, Run, Init); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter cases by regex pattern
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Configuration file (default: nearest pvbench.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Elements pushed per invocation
    #[arg(long, short = 'n')]
    pub len: Option<u32>,

    /// Target duration of one sample (e.g. "50ms")
    #[arg(long)]
    pub sample_window: Option<String>,

    /// Minimum samples before the margin target can stop sampling
    #[arg(long)]
    pub min_samples: Option<usize>,

    /// Relative margin of error target, percent
    #[arg(long)]
    pub target_rme: Option<f64>,

    /// Per-case time budget (e.g. "5s")
    #[arg(long)]
    pub max_time: Option<String>,

    /// Confidence level: 0.90, 0.95 or 0.99
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Output format: human, json
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pin the measuring thread to this CPU
    #[arg(long)]
    pub pin_cpu: Option<usize>,

    /// Check that every adapter builds 0..len before timing
    #[arg(long)]
    pub verify: bool,

    /// Dry run - list cases without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// List the cases that would run
    List,
    /// Run the suite (default)
    Run,
    /// Print a default pvbench.toml
    Init,
}

/// Fully resolved run settings: pvbench.toml defaults with CLI overrides
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// The workload every adapter case runs
    pub workload: AppendWorkload,
    /// Convergence settings
    pub sampler: SamplerConfig,
    /// Report format
    pub format: OutputFormat,
    /// Report destination; stdout when absent
    pub output: Option<PathBuf>,
    /// CPU to pin the measuring thread to
    pub pin_cpu: Option<usize>,
    /// Run the equivalence check before timing
    pub verify: bool,
}

impl Settings {
    /// Layer CLI flags over file configuration and validate the result
    pub fn resolve(cli: &Cli, config: &PvbenchConfig) -> Result<Self, ConfigError> {
        let mut sampler = config.sampler_config()?;

        if let Some(window) = &cli.sample_window {
            sampler.sample_window_ns = parse_duration(window)?;
        }
        if let Some(max_time) = &cli.max_time {
            sampler.max_time_ns = parse_duration(max_time)?;
        }
        if let Some(min_samples) = cli.min_samples {
            sampler.min_samples = min_samples;
        }
        if let Some(target) = cli.target_rme {
            sampler.target_rme = target;
        }
        if let Some(level) = cli.confidence {
            sampler.confidence_level = ConfidenceLevel::try_from(level)?;
        }
        sampler.validate()?;

        let format = cli
            .format
            .as_deref()
            .unwrap_or(&config.output.format)
            .parse::<OutputFormat>()
            .map_err(ConfigError::Format)?;

        Ok(Self {
            workload: AppendWorkload::new(cli.len.unwrap_or(config.workload.len)),
            sampler,
            format,
            output: cli.output.clone(),
            pin_cpu: cli.pin_cpu.or(config.runner.pin_cpu),
            verify: cli.verify,
        })
    }
}

/// Run the pvbench CLI over the standard push suite.
/// This is the main entry point for the `pvbench` binary.
pub fn run() -> anyhow::Result<()> {
    run_with_registry(pvbench_adapters::register_push_suite)
}

/// Run the pvbench CLI over the cases `register` adds.
pub fn run_with_registry<F>(register: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut CaseRegistry, AppendWorkload) -> Result<(), RegistryError>,
{
    let cli = Cli::parse();
    run_with_cli(cli, register)
}

/// Run the pvbench CLI with pre-parsed arguments.
pub fn run_with_cli<F>(cli: Cli, register: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut CaseRegistry, AppendWorkload) -> Result<(), RegistryError>,
{
    init_logging(cli.verbose);

    if cli.command == Some(Commands::Init) {
        return write_output(cli.output.as_ref(), &PvbenchConfig::default_toml());
    }

    let config = load_config(&cli)?;
    let settings = Settings::resolve(&cli, &config)?;

    let mut registry = CaseRegistry::new();
    register(&mut registry, settings.workload).context("failed to register cases")?;
    let filter = Regex::new(&cli.filter)
        .with_context(|| format!("invalid case filter {:?}", cli.filter))?;
    let registry = build_plan(registry, Some(&filter));

    let list_only = cli.command == Some(Commands::List) || (cli.command.is_none() && cli.dry_run);
    if list_only {
        print!("{}", format_plan(&registry, settings.workload.len()));
        return Ok(());
    }

    if registry.is_empty() {
        println!("No cases found.");
        return Ok(());
    }

    let result = match settings.format {
        OutputFormat::Human => {
            println!(
                "Running {} cases ({} pushes per invocation)...\n",
                registry.len(),
                settings.workload.len()
            );
            run_suite(&settings, registry, &mut ConsoleReporter::stdout())?
        }
        OutputFormat::Json => run_suite(&settings, registry, &mut ())?,
    };

    let report = build_report(
        &result,
        ReportConfig::new(settings.workload.len(), &settings.sampler),
    );
    match (settings.format, &settings.output) {
        // Human lines already went to stdout as each case finished
        (OutputFormat::Human, None) => {}
        (format, output) => write_output(output.as_ref(), &render(&report, format)?)?,
    }

    if result.has_failures() {
        eprintln!("\n{} case(s) failed", result.failure_count());
        std::process::exit(1);
    }

    Ok(())
}

/// Execute a prepared suite: optional equivalence check, CPU pinning, then
/// the runner on a current-thread runtime with Ctrl-C wired to cancellation.
pub fn run_suite(
    settings: &Settings,
    mut registry: CaseRegistry,
    reporter: &mut dyn Reporter,
) -> anyhow::Result<SuiteResult> {
    if settings.verify {
        let checked = check_equivalence(&mut registry, settings.workload)?;
        tracing::info!(cases = checked, len = settings.workload.len(), "contents verified");
    }

    if let Some(cpu) = settings.pin_cpu {
        match pin_to_cpu(cpu) {
            Ok(()) => tracing::debug!(cpu, "pinned measuring thread"),
            Err(err) => tracing::warn!(cpu, %err, "failed to pin measuring thread"),
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let runner = SuiteRunner::new(settings.sampler);

    // The listener must exist before the first case starts measuring, or an
    // early Ctrl-C gets the default action and kills the process.
    let result = runtime.block_on(async {
        match CtrlC::install() {
            Ok(mut ctrl_c) => {
                runner
                    .run_until(&mut registry, reporter, &mut ctrl_c)
                    .await
            }
            Err(err) => {
                tracing::warn!(%err, "failed to listen for Ctrl-C, running uninterruptible");
                runner.run(&mut registry, reporter).await
            }
        }
    });

    if result.cancelled {
        tracing::warn!(ran = result.outcomes.len(), "suite cancelled");
    }
    Ok(result)
}

/// Ctrl-C listener, registered with the OS as soon as it is created
struct CtrlC {
    #[cfg(unix)]
    stream: tokio::signal::unix::Signal,
    #[cfg(windows)]
    stream: tokio::signal::windows::CtrlC,
}

impl CtrlC {
    /// Must be called from inside the runtime
    fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        let stream = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;
        #[cfg(windows)]
        let stream = tokio::signal::windows::ctrl_c()?;
        Ok(Self { stream })
    }
}

impl Interrupt for CtrlC {
    fn poll_interrupt(&mut self, cx: &mut std::task::Context<'_>) -> bool {
        matches!(self.stream.poll_recv(cx), std::task::Poll::Ready(Some(())))
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "pvbench=debug" } else { "pvbench=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    // A subscriber may already be installed when embedded in a larger binary
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<PvbenchConfig, ConfigError> {
    if let Some(path) = &cli.config {
        return PvbenchConfig::load(path);
    }
    match PvbenchConfig::discover()? {
        Some((path, config)) => {
            tracing::debug!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => Ok(PvbenchConfig::default()),
    }
}

fn write_output(path: Option<&PathBuf>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            file.write_all(content.as_bytes())?;
            eprintln!("Report written to: {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}
