use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::parser::Record;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery queue is full")]
    QueueFull,

    #[error("delivery queue is closed")]
    Closed,

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("collector returned status {status} for {path}")]
    Status { status: u16, path: &'static str },

    #[error("invalid collector URL: {0}")]
    InvalidUrl(String),
}

/// Accepts parsed records from the tail loop.
///
/// Failures are reported back to the caller, which logs and drops the record.
pub trait RecordSink: Send {
    fn deliver(&mut self, record: Record) -> Result<(), DeliveryError>;
}

/// Non-blocking hand-off into the delivery worker's bounded queue.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Record>,
}

impl ChannelSink {
    /// Create the sink together with the receiving end for the worker.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Record>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl RecordSink for ChannelSink {
    fn deliver(&mut self, record: Record) -> Result<(), DeliveryError> {
        self.tx.try_send(record).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
