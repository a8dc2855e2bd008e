use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

use super::model::ParseError;

/// A wrapper that forces the wrapped data onto its own cache line.
///
/// The tail loop and the delivery worker update different groups from
/// different threads.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<T>(pub T);

/// Per-line classification counters (updated once per scanned line)
#[derive(Debug, Default)]
pub struct LineMetrics {
    pub scanned: AtomicU64,
    pub matched: AtomicU64,
    pub missed: AtomicU64,
    /// Recognized kinds that produce no record
    pub skipped: AtomicU64,
}

/// Error counters by type
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    pub parse: AtomicU64,
    pub bootstrap_pending: AtomicU64,
    pub delivery: AtomicU64,
    pub io: AtomicU64,
}

/// Delivery counters
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    pub queued: AtomicU64,
    pub sent: AtomicU64,
    pub rejected: AtomicU64,
}

/// Tail invocation counters
#[derive(Debug, Default)]
pub struct TailCallMetrics {
    pub calls: AtomicU64,
    pub rotations: AtomicU64,
}

/// Process-wide counters for the tailing pipeline.
///
/// All operations use `Ordering::Relaxed`; `snapshot()` is not
/// transactional across groups, which is fine for observability.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    pub lines: CacheAligned<LineMetrics>,
    pub errors: CacheAligned<ErrorMetrics>,
    pub delivery: CacheAligned<DeliveryMetrics>,
    pub tails: CacheAligned<TailCallMetrics>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_line(&self) {
        self.lines.0.scanned.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_match(&self) {
        self.lines.0.matched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_miss(&self) {
        self.lines.0.missed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_skip(&self) {
        self.lines.0.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Bootstrap failures are counted apart from real parse errors.
    #[inline]
    pub fn record_parse_error(&self, error: &ParseError) {
        if error.is_bootstrap() {
            self.errors.0.bootstrap_pending.fetch_add(1, Ordering::Relaxed);
        } else {
            self.errors.0.parse.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_queued(&self) {
        self.delivery.0.queued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_delivery_error(&self) {
        self.errors.0.delivery.fetch_add(1, Ordering::Relaxed);
    }

    /// Outcome of a network submission, recorded by the delivery worker.
    #[inline]
    pub fn record_submission(&self, accepted: bool) {
        if accepted {
            self.delivery.0.sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.delivery.0.rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_tail(&self, rotated: bool) {
        self.tails.0.calls.fetch_add(1, Ordering::Relaxed);
        if rotated {
            self.tails.0.rotations.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_io_error(&self) {
        self.errors.0.io.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_scanned: self.lines.0.scanned.load(Ordering::Relaxed),
            lines_matched: self.lines.0.matched.load(Ordering::Relaxed),
            lines_missed: self.lines.0.missed.load(Ordering::Relaxed),
            lines_skipped: self.lines.0.skipped.load(Ordering::Relaxed),

            parse_errors: self.errors.0.parse.load(Ordering::Relaxed),
            bootstrap_pending: self.errors.0.bootstrap_pending.load(Ordering::Relaxed),
            delivery_errors: self.errors.0.delivery.load(Ordering::Relaxed),
            io_errors: self.errors.0.io.load(Ordering::Relaxed),

            records_queued: self.delivery.0.queued.load(Ordering::Relaxed),
            records_sent: self.delivery.0.sent.load(Ordering::Relaxed),
            records_rejected: self.delivery.0.rejected.load(Ordering::Relaxed),

            tail_calls: self.tails.0.calls.load(Ordering::Relaxed),
            rotations: self.tails.0.rotations.load(Ordering::Relaxed),
        }
    }
}

/// A read-only snapshot of pipeline metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub lines_scanned: u64,
    pub lines_matched: u64,
    pub lines_missed: u64,
    pub lines_skipped: u64,

    pub parse_errors: u64,
    pub bootstrap_pending: u64,
    pub delivery_errors: u64,
    pub io_errors: u64,

    pub records_queued: u64,
    pub records_sent: u64,
    pub records_rejected: u64,

    pub tail_calls: u64,
    pub rotations: u64,
}
