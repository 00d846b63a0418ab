use log::debug;
use std::path::PathBuf;

/// Directories watched unless overridden, relative to the working directory
pub const DEFAULT_WATCH_ROOTS: &[&str] = &[".", "src", "public", "css", "js"];

/// A directory registered for recursive watching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRoot {
    /// The candidate as given, for messages
    pub display: PathBuf,
    /// Canonical location handed to the OS watcher
    pub path: PathBuf,
}

/// Resolves candidate directories into the roots to register.
///
/// Missing candidates and non-directories are skipped. A candidate inside
/// another candidate's subtree is dropped since its events already arrive
/// through the outer root.
pub fn collect_roots(candidates: &[PathBuf]) -> Vec<WatchRoot> {
    let mut resolved: Vec<WatchRoot> = Vec::new();

    for candidate in candidates {
        let path = match candidate.canonicalize() {
            Ok(path) if path.is_dir() => path,
            Ok(_) => {
                debug!("Not a directory, skipping: {}", candidate.display());
                continue;
            }
            Err(_) => {
                debug!("Missing, skipping: {}", candidate.display());
                continue;
            }
        };

        resolved.push(WatchRoot {
            display: candidate.clone(),
            path,
        });
    }

    let mut roots = Vec::with_capacity(resolved.len());
    for (i, root) in resolved.iter().enumerate() {
        let covered = resolved.iter().enumerate().any(|(j, other)| {
            if other.path == root.path {
                j < i
            } else {
                root.path.starts_with(&other.path)
            }
        });

        if covered {
            debug!("Already covered by another root: {}", root.display.display());
        } else {
            roots.push(root.clone());
        }
    }

    roots
}
