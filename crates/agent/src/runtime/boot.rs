//! Boot: logging init, config load, log path resolution, delivery setup.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AgentConfig;
use crate::delivery::{
    spawn_delivery_worker, ChannelSink, CollectorClient, DelayStrategy, NoJitter, RandomJitter,
};
use crate::parser::metrics::PipelineMetrics;

/// Everything the watch loop needs.
pub struct Booted {
    pub config: AgentConfig,
    pub log_path: PathBuf,
    pub sink: ChannelSink,
    pub delivery: tokio::task::JoinHandle<()>,
    pub metrics: Arc<PipelineMetrics>,
}

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edge_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load and validate config, resolve the log path, and spawn the
/// delivery worker.
pub fn boot() -> Result<Booted, Box<dyn std::error::Error>> {
    info!("Initializing edge agent v{}", env!("CARGO_PKG_VERSION"));
    info!("System version: {}/{}", std::env::consts::OS, std::env::consts::ARCH);

    let config = AgentConfig::load()?;
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    let log_path = config.resolve_log_path().map_err(|e| {
        error!("Error initializing: {}", e);
        e
    })?;

    info!(
        "Collector: {} (jitter up to {}ms, queue capacity {})",
        config.collector.url, config.collector.jitter_max_ms, config.collector.queue_capacity
    );

    let client = CollectorClient::new(
        config.collector.url.clone(),
        config.collector.api_key.clone(),
        config.collector.request_timeout(),
    )?;

    let delay: Arc<dyn DelayStrategy> = if config.collector.jitter_max_ms == 0 {
        Arc::new(NoJitter)
    } else {
        Arc::new(RandomJitter::new(config.collector.jitter_max()))
    };

    let metrics = Arc::new(PipelineMetrics::new());
    let (sink, rx) = ChannelSink::bounded(config.collector.queue_capacity);
    let delivery = spawn_delivery_worker(rx, Arc::new(client), delay, Arc::clone(&metrics));

    Ok(Booted {
        config,
        log_path,
        sink,
        delivery,
        metrics,
    })
}
