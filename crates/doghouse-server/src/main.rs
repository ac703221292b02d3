//! Process bootstrap: parse the command line, load the map config, connect
//! the stats store, restore persisted state, and run the serialization
//! domain until INT/TERM asks for a final snapshot.

use std::path::PathBuf;
use std::thread;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use doghouse_app::app::Application;
use doghouse_app::config::load_game;
use doghouse_app::domain;
use doghouse_app::stats::{PlayerStatsStore, DB_URL_ENV};

#[derive(Debug, Parser)]
#[command(name = "doghouse-server", about = "Multiplayer dog/loot game server")]
struct Args {
    /// Auto-tick period in milliseconds; omit to let clients drive ticks.
    #[arg(long = "tick-period", value_name = "milliseconds")]
    tick_period: Option<u64>,

    /// Path to the JSON map configuration.
    #[arg(long = "config-file", value_name = "file")]
    config_file: PathBuf,

    /// Root directory of the static client files.
    #[arg(long = "www-root", value_name = "dir")]
    www_root: PathBuf,

    /// Spawn dogs at random road points instead of each map's first road.
    #[arg(
        long = "randomize-spawn-points",
        value_name = "bool",
        default_value_t = false,
        action = clap::ArgAction::Set
    )]
    randomize_spawn_points: bool,

    /// Path of the snapshot file; enables restore-on-start and save-on-exit.
    #[arg(long = "state-file", value_name = "file")]
    state_file: Option<PathBuf>,

    /// Autosave period in milliseconds of simulated time.
    #[arg(long = "save-state-period", value_name = "milliseconds")]
    save_state_period: Option<u64>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    match run().await {
        Ok(()) => {
            tracing::info!(code = 0, "server exited");
        }
        Err(e) => {
            tracing::error!(code = 1, error = %format!("{e:#}"), "server exited");
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    if !args.www_root.is_dir() {
        bail!("www-root '{}' is not a directory", args.www_root.display());
    }

    let game = load_game(&args.config_file)
        .with_context(|| format!("loading config '{}'", args.config_file.display()))?;
    tracing::info!(maps = game.maps().len(), "config loaded");

    let db_url = std::env::var(DB_URL_ENV)
        .with_context(|| format!("{DB_URL_ENV} is not specified"))?;
    let workers = thread::available_parallelism().map(usize::from).unwrap_or(1);
    let store = PlayerStatsStore::connect(&db_url, workers as u32)
        .await
        .context("connecting the stats store")?;

    let mut app = Application::new(game, args.randomize_spawn_points);
    if let Some(state_file) = &args.state_file {
        app.recover_from_file(state_file)
            .with_context(|| format!("recovering state from '{}'", state_file.display()))?;
        if let Some(period) = args.save_state_period {
            app.enable_autosave(period);
        }
    }

    let handle = domain::spawn(app, Some(store), args.tick_period.filter(|&p| p > 0));
    tracing::info!(
        www_root = %args.www_root.display(),
        tick_period = ?args.tick_period,
        "server started"
    );

    wait_for_shutdown_signal().await?;
    tracing::info!("shutdown signal received, saving state");
    handle.shutdown().await;
    Ok(())
}

async fn wait_for_shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
        Ok(())
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}
