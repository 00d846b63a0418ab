use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::config::DevConfig;
use crate::error::ReloadError;
use crate::supervisor::{ServerCommand, ServerState, Supervisor};
use crate::watcher::{FileWatcher, WatchFilter};

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Serves the working directory and restarts the server on relevant changes
/// until interrupted.
pub fn run(config: &DevConfig) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .map_err(ReloadError::from)
    .context("Error setting Ctrl+C handler")?;

    info!("Auto-reload development server");

    let command = ServerCommand::serve_current_dir(&config.host, config.port)
        .context("Failed to locate the server executable")?;
    debug!("Server command: {}", command.program().display());

    let mut supervisor = Supervisor::new(command, config.port)
        .with_stop_timeout(config.stop_timeout())
        .with_restart_pause(config.restart_pause());
    supervisor.start();
    if supervisor.state() == ServerState::Stopped {
        warn!("Server is not running; the next change will try again");
    }

    let watcher = FileWatcher::spawn(
        &config.watch_candidates(),
        WatchFilter::new(config.extensions()),
        config.debounce(),
        supervisor,
    )
    .context("Failed to start file watcher")?;

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    info!("Serving files from: {}", cwd.display());
    info!("Open: http://localhost:{}", config.port);
    info!(
        "Watching {} root(s) for changes to: {}",
        watcher.roots().len(),
        config.extensions().join(", ")
    );
    info!("Press Ctrl+C to stop");

    while running.load(Ordering::SeqCst) {
        thread::sleep(IDLE_POLL_INTERVAL);
    }

    info!("Shutting down...");

    let mut supervisor = watcher.stop().context("Failed to stop file watcher")?;
    supervisor.stop();

    info!("Development server stopped");
    Ok(())
}
