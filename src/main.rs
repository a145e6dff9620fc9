//! Binary entrypoint for tapestry-capture.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tapestry_capture::config::Configuration;
use tapestry_capture::tasks;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(
    name = "tapestry-capture",
    version,
    about = "Timed snapshot documentation woven into a thread tapestry"
)]
struct Cli {
    /// Path to YAML config file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Run one whole session headless on a virtual clock and print the snapshots
    #[arg(long)]
    simulate: bool,

    /// Deterministic RNG seed (overrides `seed` from the config)
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(format!("tapestry_capture={level}").parse()?)
        .add_directive("winit=warn".parse()?);
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

fn load_configuration(cli: &Cli) -> Result<Configuration> {
    let mut cfg = match cli.config.as_ref() {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Configuration::default(),
    };
    if cli.seed.is_some() {
        cfg.seed = cli.seed;
    }
    cfg.validated().context("invalid configuration values")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let cfg = load_configuration(&cli)?;
    info!(
        captures = cfg.session.total_captures(),
        interval = %humantime::format_duration(cfg.session.capture_interval),
        seed = ?cfg.seed,
        "configuration loaded"
    );

    if cli.simulate {
        let report = tasks::simulate::run(&cfg)?;
        println!(
            "# simulated session\n# frames: {}\n# snapshots: {}\n",
            report.frames,
            report.snapshots.len()
        );
        for snapshot in &report.snapshots {
            let pointer = snapshot
                .mean_pointer()
                .map(|p| format!("({:.1}, {:.1})", p.x, p.y))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:>3}  {}  mic={:.3}  clicks={}  keys={}  pointer={}",
                snapshot.index() + 1,
                snapshot.timestamp(),
                snapshot.mic_level(),
                snapshot.clicks(),
                snapshot.keys(),
                pointer
            );
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    // The window owns the main thread until it closes or cancellation fires.
    let result = tasks::viewer::run_windowed(cfg, cancel.clone()).context("viewer failed");
    cancel.cancel();
    result
}
