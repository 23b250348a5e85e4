// nightwatch entry point.
//
// Startup sequence:
// 1. Load config (copying defaults on first run)
// 2. Initialize tracing (log to file, not terminal)
// 3. Create mpsc channels
// 4. Spawn WebSocket client task
// 5. Spawn spectator event loop task
// 6. Run the TUI until the user quits
// 7. Cleanup on exit

use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

use nightwatch_core::app::{self, Spectator};
use nightwatch_core::config::{self, Config};
use nightwatch_core::ws_client;
use nightwatch_tui::tui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config. Tracing is not up yet, so failures surface on stderr.
    // Outside the crate directory (e.g. the workspace root) use the shipped
    // defaults next to this crate's manifest.
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let base_dir = config::resolve_base_dir(&cwd, Path::new(env!("CARGO_MANIFEST_DIR")));
    let config = config::load_config(&base_dir).context("failed to load configuration")?;

    // 2. Initialize tracing
    init_tracing(&config)?;
    info!("nightwatch starting up");
    info!(
        "Server {}, reconnect delay {:?}, resync on connect: {}",
        config.server.url,
        config.server.reconnect_delay(),
        config.server.resync_on_connect
    );

    // 3. Create mpsc channels
    let (ws_tx, ws_rx) = mpsc::channel(256);
    let (out_tx, out_rx) = mpsc::channel(16);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    // 4. Spawn WebSocket client task
    let url = config.server.url.clone();
    let reconnect_delay = config.server.reconnect_delay();
    let ws_handle = tokio::spawn(async move {
        if let Err(e) = ws_client::run(url, reconnect_delay, ws_tx, out_rx).await {
            error!("WebSocket client error: {}", e);
        }
    });

    // 5. Spawn spectator event loop task
    let spectator = Spectator::new(config, out_tx);
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(ws_rx, cmd_rx, ui_tx, spectator).await {
            error!("Event loop error: {}", e);
        }
    });

    // 6. Run the TUI (blocks until the user quits)
    info!("Application ready");
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {:#}", e);
    }

    // 7. Cleanup: the event loop exits once the command channel closes
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), app_handle).await;

    // The client reconnects forever while anyone holds the channels.
    ws_handle.abort();

    info!("nightwatch shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
///
/// `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = log_directory(config)?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("nightwatch.log"))
        .context("failed to create log file")?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

/// Configured log directory, else the platform data directory.
fn log_directory(config: &Config) -> anyhow::Result<PathBuf> {
    if let Some(dir) = &config.logging.directory {
        return Ok(dir.clone());
    }
    directories::ProjectDirs::from("", "", "nightwatch")
        .map(|dirs| dirs.data_dir().join("logs"))
        .context("no home directory to place logs in; set logging.directory")
}
