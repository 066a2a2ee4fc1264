//! `vo2-sweep` command-line entry point

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use tracing::info;

use vo2_sweep::config::{RunConfiguration, RunOverrides, DEFAULT_MAPPING_PATH};
use vo2_sweep::experiment::{CommandLauncher, TrackingRepo};
use vo2_sweep::logging::init_logging;
use vo2_sweep::sweep::run_sweep;

/// Run the VO2 experiment grid and record the grid-key → experiment-id mapping.
#[derive(Parser, Debug)]
#[command(name = "vo2-sweep", version, about)]
struct Cli {
    /// Configuration overrides, e.g. `full_load=true time_list=[[0,1]]`
    #[arg(value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// YAML file with configuration overrides (applied before KEY=VALUE)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to write the mapping document
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_MAPPING_PATH)]
    output: PathBuf,

    /// Tracking repo root
    #[arg(long, value_name = "DIR", default_value = ".")]
    repo: PathBuf,

    /// Trainer program run once per grid point
    #[arg(long, value_name = "PROGRAM", conflicts_with = "dry_run")]
    trainer: Option<PathBuf>,

    /// Argument passed to the trainer (repeatable)
    #[arg(long = "trainer-arg", value_name = "ARG", allow_hyphen_values = true)]
    trainer_args: Vec<String>,

    /// Track runs without training anything
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let file_overrides = match &cli.config {
        Some(path) => RunOverrides::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RunOverrides::default(),
    };
    let cli_overrides = RunOverrides::from_dotlist(&cli.overrides)?;
    let config = RunConfiguration::resolve(file_overrides.merge(cli_overrides))
        .context("invalid run configuration")?;
    info!("resolved configuration:\n{}", config.to_yaml()?);

    let launcher = match (&cli.trainer, cli.dry_run) {
        (Some(program), _) => CommandLauncher::new(program, cli.trainer_args.iter().cloned()),
        (None, true) => CommandLauncher::dry_run(),
        (None, false) => bail!("either --trainer PROGRAM or --dry-run is required"),
    };
    let repo = TrackingRepo::open(&cli.repo)
        .with_context(|| format!("opening tracking repo at {}", cli.repo.display()))?;

    let report = run_sweep(&config, &launcher, &repo, &cli.output)?;
    if !report.failures.is_empty() {
        bail!(
            "{} of {} grid points failed (mapping written for the rest to {})",
            report.failures.len(),
            report.planned,
            cli.output.display()
        );
    }
    info!(
        experiments = report.completed,
        output = %cli.output.display(),
        "sweep complete"
    );
    Ok(())
}
