//! File watching for server restarts
//!
//! The OS watcher thread only converts and filters notify events, then hands
//! them to a bounded queue. A single consumer thread owns the restart target,
//! applies the debounce window and performs restarts one at a time.

pub mod debounce;
pub mod event;
pub mod roots;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded, select};
use log::{debug, info, trace, warn};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{ReloadError, ReloadResult};

pub use debounce::Debouncer;
pub use event::{DEFAULT_EXTENSIONS, WatchEvent, WatchFilter};
pub use roots::{DEFAULT_WATCH_ROOTS, WatchRoot, collect_roots};

/// Pending relevant changes held between the OS watcher and the consumer
const EVENT_QUEUE_CAPACITY: usize = 64;

/// Something the watcher restarts when a relevant file changes.
pub trait RestartTarget: Send + 'static {
    fn restart(&mut self);
}

/// Recursive watcher over a set of roots, driving a [`RestartTarget`].
///
/// The target is moved onto the consumer thread and handed back by
/// [`FileWatcher::stop`], so nothing else can touch it while watching.
pub struct FileWatcher<T> {
    watcher: RecommendedWatcher,
    roots: Vec<WatchRoot>,
    shutdown_tx: Sender<()>,
    handle: JoinHandle<T>,
}

impl<T: RestartTarget> FileWatcher<T> {
    pub fn spawn(
        candidates: &[PathBuf],
        filter: WatchFilter,
        debounce: Duration,
        target: T,
    ) -> ReloadResult<Self> {
        let roots = collect_roots(candidates);
        let (event_tx, event_rx) = bounded(EVENT_QUEUE_CAPACITY);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => forward_changes(&event, &filter, &event_tx),
                Err(e) => warn!("Watch error: {}", e),
            }
        })?;

        for root in &roots {
            watcher
                .watch(&root.path, RecursiveMode::Recursive)
                .map_err(|source| ReloadError::Watch {
                    path: root.display.clone(),
                    source,
                })?;
            info!("Watching: {}", root.display.display());
        }

        let (shutdown_tx, shutdown_rx) = bounded(1);
        let debouncer = Debouncer::new(debounce);
        let handle = thread::Builder::new()
            .name("watcher".to_string())
            .spawn(move || run_event_loop(event_rx, shutdown_rx, debouncer, target))?;

        Ok(Self {
            watcher,
            roots,
            shutdown_tx,
            handle,
        })
    }

    pub fn roots(&self) -> &[WatchRoot] {
        &self.roots
    }

    /// Stops watching, waits for an in-flight restart to finish and returns
    /// the restart target.
    pub fn stop(self) -> ReloadResult<T> {
        let Self {
            watcher,
            shutdown_tx,
            handle,
            ..
        } = self;

        drop(watcher);
        let _ = shutdown_tx.send(());
        handle.join().map_err(|_| ReloadError::WatcherPanicked)
    }
}

fn forward_changes(event: &notify::Event, filter: &WatchFilter, queue: &Sender<WatchEvent>) {
    for change in WatchEvent::from_notify(event) {
        if !filter.should_trigger(&change) {
            trace!("Ignoring {:?} {:?}", change.kind, change.path);
            continue;
        }

        match queue.try_send(change) {
            Ok(()) => {}
            Err(TrySendError::Full(change)) => {
                debug!("Change queue full, dropping {:?}", change.path);
            }
            Err(TrySendError::Disconnected(_)) => return,
        }
    }
}

fn run_event_loop<T: RestartTarget>(
    events: Receiver<WatchEvent>,
    shutdown: Receiver<()>,
    mut debouncer: Debouncer,
    mut target: T,
) -> T {
    debug!("Watcher loop started (debounce {:?})", debouncer.window());

    'events: loop {
        select! {
            recv(shutdown) -> _ => break,
            recv(events) -> event => {
                let Ok(event) = event else { break };

                if !debouncer.accept(Instant::now()) {
                    trace!("Debounced change to {:?}", event.path);
                    continue;
                }
                if stop_requested(&shutdown) {
                    break;
                }

                info!("File changed: {}", event.file_name());
                target.restart();

                // Changes queued during a restart fold into a single follow-up restart.
                while let Some(latest) = events.try_iter().last() {
                    if stop_requested(&shutdown) {
                        break 'events;
                    }
                    if !debouncer.accept(Instant::now()) {
                        debug!("Dropped changes queued during restart inside the debounce window");
                        break;
                    }

                    info!("File changed: {}", latest.file_name());
                    target.restart();
                }
            }
        }
    }

    debug!("Watcher loop stopped");
    target
}

fn stop_requested(shutdown: &Receiver<()>) -> bool {
    !matches!(shutdown.try_recv(), Err(TryRecvError::Empty))
}
