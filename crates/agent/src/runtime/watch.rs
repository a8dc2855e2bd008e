//! Watch: drives the tailer from file-change notifications.
//!
//! Writes trigger a tail of the watched path. A rename means the node
//! rotated its log: re-subscribe to the path, drain the rotated sibling from
//! the current offset, and start the new file from zero. A periodic poke
//! reopens the file so platforms that batch notifications keep delivering
//! them, and retries the subscription if the new file was not there yet.

use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::delivery::ChannelSink;
use crate::runtime::boot::Booted;
use crate::runtime::stop::shutdown_signal;
use crate::tail::{drain_rotation, Tailer};

/// What a notification means for the tailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    Write,
    Rename,
}

/// Map a notify event kind; `None` for changes that need no action.
pub fn change_kind(kind: &EventKind) -> Option<FileChange> {
    match kind {
        EventKind::Modify(ModifyKind::Name(_)) => Some(FileChange::Rename),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(FileChange::Write),
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Access(_) => None,
        EventKind::Any | EventKind::Other => None,
    }
}

type SharedTailer = Arc<Mutex<Tailer<ChannelSink>>>;

/// Serializes tail calls and carries the offset between them.
struct TailSession {
    tailer: SharedTailer,
    offset: u64,
}

impl TailSession {
    /// Run `step` against the tailer on the blocking pool; it returns the
    /// offset to resume from.
    async fn run_blocking<F>(&mut self, step: F)
    where
        F: FnOnce(&mut Tailer<ChannelSink>, u64) -> u64 + Send + 'static,
    {
        let tailer = Arc::clone(&self.tailer);
        let offset = self.offset;

        let result = tokio::task::spawn_blocking(move || {
            let mut tailer = tailer.lock().unwrap_or_else(PoisonError::into_inner);
            step(&mut *tailer, offset)
        })
        .await;

        match result {
            Ok(next) => self.offset = next,
            Err(e) => error!("Tail task panicked: {}", e),
        }
    }

    async fn on_write(&mut self, path: &Path) {
        let path = path.to_path_buf();
        self.run_blocking(move |tailer, offset| tailer.follow(&path, offset))
            .await;
    }

    async fn on_rename(&mut self, path: &Path) {
        let path = path.to_path_buf();
        self.run_blocking(move |tailer, offset| drain_rotation(tailer, &path, offset))
            .await;
    }
}

/// Subscribe to `path`; `false` when it cannot be watched right now.
fn watch_path(watcher: &mut impl Watcher, path: &Path) -> bool {
    match watcher.watch(path, RecursiveMode::NonRecursive) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to watch {}: {}, retrying on next poke", path.display(), e);
            false
        }
    }
}

/// Drop the subscription to the rotated-out inode and watch the new file.
fn resubscribe(watcher: &mut impl Watcher, path: &Path) -> bool {
    if let Err(e) = watcher.unwatch(path) {
        debug!("Unwatch after rotation failed: {}", e);
    }
    watch_path(watcher, path)
}

/// Watch the log file until shutdown, then flush pending deliveries.
pub async fn run(booted: Booted) -> Result<(), Box<dyn std::error::Error>> {
    let Booted {
        config,
        log_path,
        sink,
        delivery,
        metrics,
    } = booted;

    let (tx, mut events) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        },
        Config::default(),
    )?;

    watcher
        .watch(&log_path, RecursiveMode::NonRecursive)
        .map_err(|e| {
            error!("Error initializing: no file {}", log_path.display());
            e
        })?;

    info!("Watching file {}", log_path.display());
    info!("Edge agent is ready...");

    let mut session = TailSession {
        tailer: Arc::new(Mutex::new(Tailer::new(sink, Arc::clone(&metrics)))),
        offset: 0,
    };

    let mut watching = true;
    let mut poke = time::interval(config.watch.poke_interval());
    poke.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            received = events.recv() => {
                let Some(result) = received else {
                    warn!("File watcher channel closed");
                    break;
                };
                match result {
                    Ok(event) => match change_kind(&event.kind) {
                        Some(FileChange::Write) => session.on_write(&log_path).await,
                        Some(FileChange::Rename) => {
                            // let the node finish its rotation
                            time::sleep(config.watch.rotation_settle()).await;
                            watching = resubscribe(&mut watcher, &log_path);
                            session.on_rename(&log_path).await;
                        }
                        None => {}
                    },
                    Err(e) => warn!("File watcher error: {}", e),
                }
            }
            _ = poke.tick() => {
                if !watching {
                    watching = watch_path(&mut watcher, &log_path);
                    if watching {
                        info!("Watching file {} again", log_path.display());
                        session.on_write(&log_path).await;
                    }
                }
                if let Err(e) = poke_file(&log_path) {
                    debug!("Poke of {} failed: {}", log_path.display(), e);
                }
            }
        }
    }

    drop(watcher);
    // dropping the tailer drops the sink, which closes the delivery queue
    drop(session);

    let grace = config.watch.shutdown_grace();
    if time::timeout(grace, delivery).await.is_err() {
        warn!("Pending deliveries not finished after {:?}, exiting", grace);
    }

    let snapshot = metrics.snapshot();
    info!(
        "Final counters: lines={} matched={} missed={} queued={} sent={} parse_errors={} bootstrap_pending={}",
        snapshot.lines_scanned,
        snapshot.lines_matched,
        snapshot.lines_missed,
        snapshot.records_queued,
        snapshot.records_sent,
        snapshot.parse_errors,
        snapshot.bootstrap_pending
    );
    Ok(())
}

/// Open and immediately close the file.
fn poke_file(path: &Path) -> std::io::Result<()> {
    File::open(path).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};

    #[test]
    fn test_change_kind_write() {
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(FileChange::Write)
        );
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Any)),
            Some(FileChange::Write)
        );
    }

    #[test]
    fn test_change_kind_rename() {
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            Some(FileChange::Rename)
        );
    }

    #[test]
    fn test_change_kind_ignored() {
        assert_eq!(change_kind(&EventKind::Create(CreateKind::File)), None);
        assert_eq!(change_kind(&EventKind::Remove(RemoveKind::File)), None);
        assert_eq!(change_kind(&EventKind::Access(AccessKind::Any)), None);
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions))),
            None
        );
        assert_eq!(change_kind(&EventKind::Other), None);
    }

    fn idle_watcher() -> RecommendedWatcher {
        RecommendedWatcher::new(|_res: notify::Result<Event>| {}, Config::default()).unwrap()
    }

    #[test]
    fn test_watch_path_retries_until_file_exists() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("log.log");
        let mut watcher = idle_watcher();

        assert!(!watch_path(&mut watcher, &path));
        std::fs::write(&path, b"").unwrap();
        assert!(watch_path(&mut watcher, &path));
    }

    #[test]
    fn test_resubscribe_after_rotation() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("log.log");
        std::fs::write(&path, b"old").unwrap();

        let mut watcher = idle_watcher();
        assert!(watch_path(&mut watcher, &path));

        std::fs::rename(&path, dir.path().join("log.old.log")).unwrap();
        assert!(!resubscribe(&mut watcher, &path));

        std::fs::write(&path, b"").unwrap();
        assert!(resubscribe(&mut watcher, &path));
    }

    #[test]
    fn test_poke_missing_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(poke_file(&dir.path().join("log.log")).is_err());
    }
}
