//! Tailer: offset-tracking reader over a single growing log file.
//!
//! Each call reopens the file, resets the offset to zero when the file has
//! shrunk underneath us, and pushes every newline-delimited line between the
//! offset and the size observed at stat time through classify → parse →
//! deliver. A bad line never aborts the scan.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::delivery::{DeliveryError, RecordSink};
use crate::parser::metrics::PipelineMetrics;
use crate::parser::{self, BootstrapState, Destination, Family, FilterOutcome, ParseError};

#[derive(Debug, Error)]
pub enum TailError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("failed to stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("failed to seek {} to {offset}: {source}", path.display())]
    Seek {
        path: PathBuf,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {} at {offset}: {source}", path.display())]
    Read {
        path: PathBuf,
        offset: u64,
        #[source]
        source: io::Error,
    },
}

impl TailError {
    /// Offset the next tail should start from. Lines before it were
    /// already handed to the sink.
    pub fn resume_offset(&self) -> u64 {
        match self {
            TailError::Open { offset, .. }
            | TailError::Stat { offset, .. }
            | TailError::Seek { offset, .. }
            | TailError::Read { offset, .. } => *offset,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TailError::Open { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// What happened to a single line.
#[derive(Debug)]
pub enum LineOutcome {
    /// Not one of ours
    Miss,
    /// Recognized kind that carries no record
    Skipped(Family),
    Queued(Destination),
    ParseFailed(Family, ParseError),
    DeliveryFailed(Destination, DeliveryError),
}

/// Counters for one tail call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TailStats {
    pub lines: u64,
    pub matches: u64,
    pub misses: u64,
    pub skipped: u64,
    pub parse_errors: u64,
    pub bootstrap_pending: u64,
    pub queued: u64,
    pub delivery_errors: u64,
}

impl TailStats {
    fn record(&mut self, outcome: &LineOutcome) {
        self.lines += 1;
        match outcome {
            LineOutcome::Miss => self.misses += 1,
            LineOutcome::Skipped(_) => {
                self.matches += 1;
                self.skipped += 1;
            }
            LineOutcome::Queued(_) => {
                self.matches += 1;
                self.queued += 1;
            }
            LineOutcome::ParseFailed(_, error) => {
                self.matches += 1;
                if error.is_bootstrap() {
                    self.bootstrap_pending += 1;
                } else {
                    self.parse_errors += 1;
                }
            }
            LineOutcome::DeliveryFailed(..) => {
                self.matches += 1;
                self.delivery_errors += 1;
            }
        }
    }
}

/// Result of a successful tail call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailReport {
    /// Offset the scan started from (0 after a rotation reset)
    pub start_offset: u64,
    /// Offset to pass to the next call
    pub offset: u64,
    pub rotated: bool,
    pub stats: TailStats,
}

/// Owns the cross-record state and the sink; the offset is handed in and
/// back on every call.
pub struct Tailer<S> {
    state: BootstrapState,
    sink: S,
    metrics: Arc<PipelineMetrics>,
}

impl<S: RecordSink> Tailer<S> {
    pub fn new(sink: S, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            state: BootstrapState::new(),
            sink,
            metrics,
        }
    }

    pub fn state(&self) -> &BootstrapState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Scan everything appended to `path` since `previous_offset`.
    pub fn tail(&mut self, path: &Path, previous_offset: u64) -> Result<TailReport, TailError> {
        let result = self.scan(path, previous_offset);
        match &result {
            Ok(report) => self.metrics.record_tail(report.rotated),
            Err(_) => self.metrics.record_io_error(),
        }
        result
    }

    fn scan(&mut self, path: &Path, previous_offset: u64) -> Result<TailReport, TailError> {
        let mut file = File::open(path).map_err(|source| TailError::Open {
            path: path.to_path_buf(),
            offset: previous_offset,
            source,
        })?;

        let size = file
            .metadata()
            .map_err(|source| TailError::Stat {
                path: path.to_path_buf(),
                offset: previous_offset,
                source,
            })?
            .len();

        let rotated = size < previous_offset;
        let start_offset = if rotated {
            debug!(
                "{} shrank from {} to {} bytes, rescanning from start",
                path.display(),
                previous_offset,
                size
            );
            0
        } else {
            previous_offset
        };

        file.seek(SeekFrom::Start(start_offset))
            .map_err(|source| TailError::Seek {
                path: path.to_path_buf(),
                offset: previous_offset,
                source,
            })?;

        // Bytes appended after the stat belong to the next call.
        let mut reader = BufReader::new(file.take(size - start_offset));
        let mut stats = TailStats::default();
        self.scan_lines(&mut reader, path, start_offset, &mut stats)?;

        debug!(
            "Tailed {}: lines={} matches={} misses={} skipped={} queued={} parse_errors={} bootstrap_pending={}",
            path.display(),
            stats.lines,
            stats.matches,
            stats.misses,
            stats.skipped,
            stats.queued,
            stats.parse_errors,
            stats.bootstrap_pending
        );

        Ok(TailReport {
            start_offset,
            offset: size,
            rotated,
            stats,
        })
    }

    /// Feed every line of `reader` through [`Self::process_line`]. A read
    /// error reports the offset just past the last consumed line.
    fn scan_lines<R: BufRead>(
        &mut self,
        reader: &mut R,
        path: &Path,
        start_offset: u64,
        stats: &mut TailStats,
    ) -> Result<u64, TailError> {
        let mut buf = Vec::new();
        let mut consumed = 0u64;

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).map_err(|source| TailError::Read {
                path: path.to_path_buf(),
                offset: start_offset + consumed,
                source,
            })?;
            if read == 0 {
                return Ok(consumed);
            }
            consumed += read as u64;

            let outcome = self.process_line(trim_line_ending(&buf));
            stats.record(&outcome);
        }
    }

    /// Tail `path` and return the offset to resume from, logging failures
    /// instead of returning them.
    pub fn follow(&mut self, path: &Path, previous_offset: u64) -> u64 {
        match self.tail(path, previous_offset) {
            Ok(report) => report.offset,
            Err(e) if e.is_not_found() => {
                warn!("Tail skipped: {}", e);
                e.resume_offset()
            }
            Err(e) => {
                error!("Tail failed: {}", e);
                e.resume_offset()
            }
        }
    }

    /// Classify, parse and deliver one line. Never fails.
    pub fn process_line(&mut self, line: &[u8]) -> LineOutcome {
        self.metrics.record_line();

        let family = match parser::filter(line) {
            FilterOutcome::Family(family) => family,
            FilterOutcome::Unrecognized => {
                self.metrics.record_miss();
                return LineOutcome::Miss;
            }
        };
        self.metrics.record_match();

        let record = match parser::parse(family, line, &mut self.state) {
            Ok(record) => record,
            Err(ParseError::NoMatch) => {
                self.metrics.record_skip();
                return LineOutcome::Skipped(family);
            }
            Err(error) => {
                self.metrics.record_parse_error(&error);
                if error.is_bootstrap() {
                    debug!("Skipping {} line until bootstrapped: {}", family.as_str(), error);
                } else {
                    warn!("Failed to parse {} line: {}", family.as_str(), error);
                }
                return LineOutcome::ParseFailed(family, error);
            }
        };

        let destination = record.destination();
        match self.sink.deliver(record) {
            Ok(()) => {
                self.metrics.record_queued();
                LineOutcome::Queued(destination)
            }
            Err(error) => {
                self.metrics.record_delivery_error();
                warn!("Dropping record for {}: {}", destination.path(), error);
                LineOutcome::DeliveryFailed(destination, error)
            }
        }
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
