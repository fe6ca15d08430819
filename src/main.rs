use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use docker_build::cli::Cli;
use docker_build::config::{self, FileConfig};
use docker_build::docker::{self, DockerCli};
use docker_build::pipeline::{BuildReport, Orchestrator};

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.debug) {
        eprintln!("failed to initialise logging: {err:#}");
    }

    let build_config = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("{err:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let runner = DockerCli::new(&build_config.work_dir);
    info!("Current working directory is: {}", build_config.work_dir.display());

    if let Err(err) = docker::ensure_available(&runner, &build_config.docker_args) {
        error!("{err:#}");
        return ExitCode::from(EXIT_FAILURE);
    }

    let outcome = Orchestrator::new(&build_config, &runner).run();

    if let Some(path) = &cli.report
        && let Err(err) = write_report(path, &outcome.report)
    {
        error!("{err:#}");
    }

    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILURE)
    }
}

fn init_tracing(debug: bool) -> Result<()> {
    let default_level = if debug { "docker_build=debug" } else { "docker_build=info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("invalid log filter")?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("a global subscriber is already installed")?;
    Ok(())
}

/// Read the config file (explicit `--config`, or the default one in the
/// working directory) and merge the command line over it.
fn load_config(cli: &Cli) -> Result<config::BuildConfig> {
    let file = match &cli.config {
        Some(path) => Some(FileConfig::load_file(path)?),
        None => FileConfig::load(&cli.workdir)?,
    };
    let cfg = config::resolve(cli, file.as_ref())?;
    Ok(cfg)
}

fn write_report(path: &Path, report: &BuildReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialise report")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}
