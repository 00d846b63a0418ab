use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::server::config::{DEFAULT_PORT, ServerConfig};
use crate::supervisor::{DEFAULT_RESTART_PAUSE, DEFAULT_STOP_TIMEOUT};
use crate::watcher::debounce::DEFAULT_DEBOUNCE;
use crate::watcher::{DEFAULT_EXTENSIONS, DEFAULT_WATCH_ROOTS};

/// Serve a front-end project over HTTP and restart the server whenever a source file changes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub dev: DevConfig,

    /// Also append log lines to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// IANA timezone used for log timestamps
    #[arg(long, global = true, default_value = "UTC")]
    pub log_timezone: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the document root over HTTP without watching (used as the supervised child)
    Serve(ServerConfig),
}

#[derive(Args, Debug, Clone)]
pub struct DevConfig {
    /// Port the HTTP server listens on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address the HTTP server binds
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Directory to watch recursively (repeatable); missing ones are skipped
    #[arg(short, long = "watch", value_name = "DIR")]
    pub watch: Vec<PathBuf>,

    /// File extension that triggers a restart (repeatable)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Minimum time between two restarts, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DEBOUNCE.as_millis() as u64)]
    pub debounce_ms: u64,

    /// Seconds to wait for the server to exit before killing it
    #[arg(long, default_value_t = DEFAULT_STOP_TIMEOUT.as_secs())]
    pub stop_timeout_secs: u64,

    /// Pause between stopping and starting the server, in milliseconds
    #[arg(long, default_value_t = DEFAULT_RESTART_PAUSE.as_millis() as u64)]
    pub restart_pause_ms: u64,
}

impl DevConfig {
    pub fn watch_candidates(&self) -> Vec<PathBuf> {
        if self.watch.is_empty() {
            DEFAULT_WATCH_ROOTS.iter().map(PathBuf::from).collect()
        } else {
            self.watch.clone()
        }
    }

    pub fn extensions(&self) -> Vec<String> {
        if self.extensions.is_empty() {
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
        } else {
            self.extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect()
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn restart_pause(&self) -> Duration {
        Duration::from_millis(self.restart_pause_ms)
    }
}
