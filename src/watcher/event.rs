use notify::EventKind;
use notify::event::{CreateKind, RemoveKind};
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Extensions that trigger a restart unless overridden
pub const DEFAULT_EXTENSIONS: &[&str] = &["html", "js", "css", "json", "md", "ts", "svelte"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// A single file change delivered by the OS watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl WatchEvent {
    /// Splits a notify event into one change per path.
    ///
    /// Access events, folder creation/removal and anything notify cannot
    /// classify produce nothing.
    pub fn from_notify(event: &notify::Event) -> Vec<WatchEvent> {
        let kind = match event.kind {
            EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
                return Vec::new();
            }
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Modify(_) => ChangeKind::Modified,
            EventKind::Remove(_) => ChangeKind::Removed,
            _ => return Vec::new(),
        };

        event
            .paths
            .iter()
            .map(|path| WatchEvent {
                path: path.clone(),
                kind,
            })
            .collect()
    }

    pub fn file_name(&self) -> Cow<'_, str> {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => self.path.to_string_lossy(),
        }
    }
}

/// Decides which changes are worth a restart
#[derive(Debug, Clone)]
pub struct WatchFilter {
    extensions: HashSet<String>,
}

impl WatchFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn has_relevant_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }

    /// Created or modified non-directory paths with an allowed extension.
    pub fn should_trigger(&self, event: &WatchEvent) -> bool {
        event.kind != ChangeKind::Removed
            && self.has_relevant_extension(&event.path)
            && !event.path.is_dir()
    }
}

impl Default for WatchFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}
