//! Delivery worker: drains the record queue and submits each record after
//! its jitter delay.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use super::http::CollectorClient;
use super::jitter::DelayStrategy;
use super::sink::DeliveryError;
use crate::parser::metrics::PipelineMetrics;
use crate::parser::Record;

/// Network side of delivery.
///
/// Object-safe thanks to the boxed future; `CollectorClient` is the real
/// implementation.
pub trait Collector: Send + Sync {
    fn submit<'a>(
        &'a self,
        record: &'a Record,
    ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>;
}

impl Collector for CollectorClient {
    fn submit<'a>(
        &'a self,
        record: &'a Record,
    ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>> {
        Box::pin(async move { CollectorClient::submit(self, record).await.map(|_| ()) })
    }
}

/// Spawn the worker. It runs until every [`super::ChannelSink`] is dropped,
/// then waits for in-flight submissions before returning.
pub fn spawn_delivery_worker(
    rx: mpsc::Receiver<Record>,
    collector: Arc<dyn Collector>,
    delay: Arc<dyn DelayStrategy>,
    metrics: Arc<PipelineMetrics>,
) -> JoinHandle<()> {
    tokio::spawn(run(rx, collector, delay, metrics))
}

async fn run(
    mut rx: mpsc::Receiver<Record>,
    collector: Arc<dyn Collector>,
    delay: Arc<dyn DelayStrategy>,
    metrics: Arc<PipelineMetrics>,
) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            received = rx.recv() => {
                let Some(record) = received else { break };
                let collector = Arc::clone(&collector);
                let metrics = Arc::clone(&metrics);
                let wait = delay.next_delay();

                in_flight.spawn(async move {
                    tokio::time::sleep(wait).await;
                    match collector.submit(&record).await {
                        Ok(()) => metrics.record_submission(true),
                        Err(e) => {
                            metrics.record_submission(false);
                            warn!("Failed to deliver to {}: {}", record.destination().path(), e);
                        }
                    }
                });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    warn!("Delivery task failed: {}", e);
                }
            }
        }
    }

    if !in_flight.is_empty() {
        debug!("Delivery queue closed, waiting for {} in-flight submissions", in_flight.len());
    }
    while in_flight.join_next().await.is_some() {}
    info!("Delivery worker stopped");
}
