use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::{error::ErrorKind, Parser};
use pobexport_core::{AppConfig, ExportRequest, ExternalDecoder, HttpFetcher, Pipeline};
use tracing_subscriber::{prelude::*, EnvFilter};

const USAGE: &str = "usage: pobexport [OPTIONS] <GAME_PATH> <TREE_VERSION> <GAME_VERSION>";

/// Export game data tables and the passive skill tree.
#[derive(Parser, Debug)]
#[command(name = "pobexport", version)]
struct Cli {
    /// Game installation directory (contains `Bundles2`).
    game_path: Option<PathBuf>,
    /// Passive tree export version, e.g. `3.22.0`.
    tree_version: Option<String>,
    /// Game version used to namespace the output, e.g. `3.22`.
    game_version: Option<String>,
    /// Configuration file; defaults to the user config directory.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output root, overriding the configured one.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Number of tables or assets processed concurrently.
    #[arg(long)]
    jobs: Option<usize>,
    /// Also append logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Do not export tables.
    #[arg(long)]
    skip_tables: bool,
    /// Do not download the skill tree.
    #[arg(long)]
    skip_tree: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };

    let request = match request_from(&cli) {
        Ok(request) => request,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_logging(cli.log_file.as_deref()) {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(&cli, &request) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("export failed: {err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Check the positional arguments in order.
fn request_from(cli: &Cli) -> std::result::Result<ExportRequest, &'static str> {
    let game_path = cli
        .game_path
        .clone()
        .ok_or("please provide path to the game directory")?;
    let tree_version = cli
        .tree_version
        .clone()
        .ok_or("please provide passive tree version")?;
    let game_version = cli.game_version.clone().ok_or("please provide game version")?;

    Ok(ExportRequest {
        skip_tables: cli.skip_tables,
        skip_tree: cli.skip_tree,
        ..ExportRequest::new(game_path, tree_version, game_version)
    })
}

fn run(cli: &Cli, request: &ExportRequest) -> Result<()> {
    let mut config =
        AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(output) = &cli.output {
        config.output_root = output.clone();
    }
    if let Some(jobs) = cli.jobs {
        config.jobs = jobs;
    }

    let decoder = ExternalDecoder::init(&config.decoder)?;
    let fetcher = HttpFetcher::new(&config)?;

    let manifest = Pipeline::new(&config, &decoder, &fetcher).run(request)?;
    tracing::info!(
        "export of {} finished: {} tables, {} sprite sheets",
        manifest.game_version,
        manifest.tables.len(),
        manifest.assets.len()
    );
    Ok(())
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .compact()
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
