//! Rotation naming convention of the node's log writer.
//!
//! On rotation the active `log.log` is renamed to `log.old.log` and a fresh
//! `log.log` takes its place. The unread tail of the old file has to be
//! drained from the sibling before resuming on the new one.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::reader::Tailer;
use crate::delivery::RecordSink;

const ACTIVE_SUFFIX: &str = ".log";
const ROTATED_SUFFIX: &str = ".old.log";

/// Path the rotated-out file lives at, or `None` when `path` does not end
/// in `.log`.
pub fn rotated_sibling(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(ACTIVE_SUFFIX)?;
    Some(path.with_file_name(format!("{}{}", stem, ROTATED_SUFFIX)))
}

/// Finish the rotated-out file from `offset`, then start the fresh file at
/// `path` from zero. Returns the offset into the fresh file.
pub fn drain_rotation<S: RecordSink>(tailer: &mut Tailer<S>, path: &Path, offset: u64) -> u64 {
    match rotated_sibling(path) {
        Some(old) => {
            info!("Log rotated, draining {}", old.display());
            tailer.follow(&old, offset);
        }
        None => warn!("Log rotated but {} has no .log suffix, skipping drain", path.display()),
    }
    tailer.follow(path, 0)
}
