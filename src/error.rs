use std::path::PathBuf;
use thiserror::Error;

pub type ReloadResult<T> = Result<T, ReloadError>;

#[derive(Error, Debug)]
pub enum ReloadError {
    /// The server child process could not be spawned
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The OS file watcher could not be created
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// A watch root exists but could not be registered
    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to install interrupt handler: {0}")]
    Interrupt(#[from] ctrlc::Error),

    #[error("watcher thread panicked")]
    WatcherPanicked,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
