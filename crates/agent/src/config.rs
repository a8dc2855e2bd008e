use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "Theta Edge Node";
const LOG_FILE: &str = "log.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Explicit log file path; resolved per OS when unset
    pub log_path: Option<String>,
    pub collector: CollectorConfig,
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub url: String,
    pub api_key: String,
    pub request_timeout_secs: u64,
    /// Upper bound of the random pre-delivery delay (0 disables it)
    pub jitter_max_ms: u64,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// How often the log file is reopened to keep change notifications flowing
    pub poke_interval_ms: u64,
    /// Pause after a rename before draining the rotated file
    pub rotation_settle_ms: u64,
    pub shutdown_grace_secs: u64,
}

impl AgentConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("AGENT_CONFIG_FILE")
            .unwrap_or_else(|_| "/etc/edge-agent/agent.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", config_path);
            Self::from_env()
        };

        // Environment variables override file config for critical settings
        if let Ok(path) = std::env::var("LOG_FILEPATH") {
            if !path.is_empty() {
                config.log_path = Some(path);
            }
        }
        if let Ok(url) = std::env::var("COLLECTOR_URL") {
            config.collector.url = url;
        }
        if let Ok(key) = std::env::var("COLLECTOR_API_KEY") {
            config.collector.api_key = key;
        }
        if let Some(jitter) = std::env::var("AGENT_JITTER_MAX_MS").ok().and_then(|s| s.parse().ok()) {
            config.collector.jitter_max_ms = jitter;
        }

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: AgentConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        let defaults = CollectorConfig::default();
        Self {
            log_path: std::env::var("LOG_FILEPATH").ok().filter(|p| !p.is_empty()),
            collector: CollectorConfig {
                url: std::env::var("COLLECTOR_URL").unwrap_or(defaults.url),
                api_key: std::env::var("COLLECTOR_API_KEY").unwrap_or(defaults.api_key),
                jitter_max_ms: std::env::var("AGENT_JITTER_MAX_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.jitter_max_ms),
                ..defaults
            },
            watch: WatchConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        let url = &self.collector.url;
        if url.is_empty() {
            return Err("collector.url must not be empty".to_string());
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!("collector.url must start with http:// or https://, got: {}", url));
        }
        if self.collector.queue_capacity == 0 {
            return Err("collector.queue_capacity must be > 0".to_string());
        }
        if self.collector.request_timeout_secs == 0 {
            return Err("collector.request_timeout_secs must be > 0".to_string());
        }
        if self.watch.poke_interval_ms == 0 {
            return Err("watch.poke_interval_ms must be > 0".to_string());
        }
        Ok(())
    }

    /// The log file to tail: the configured path, or the node's default
    /// location for this OS.
    pub fn resolve_log_path(&self) -> Result<PathBuf, String> {
        if let Some(path) = &self.log_path {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().ok_or("cannot determine home directory")?;
        default_log_path(std::env::consts::OS, &home)
            .ok_or_else(|| format!("os not supported: {} (set LOG_FILEPATH)", std::env::consts::OS))
    }
}

impl CollectorConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn jitter_max(&self) -> Duration {
        Duration::from_millis(self.jitter_max_ms)
    }
}

impl WatchConfig {
    pub fn poke_interval(&self) -> Duration {
        Duration::from_millis(self.poke_interval_ms)
    }

    pub fn rotation_settle(&self) -> Duration {
        Duration::from_millis(self.rotation_settle_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Where the edge node writes its log on each supported OS.
pub fn default_log_path(os: &str, home: &Path) -> Option<PathBuf> {
    match os {
        "macos" => Some(home.join("Library").join("Logs").join(APP_DIR).join(LOG_FILE)),
        "windows" => Some(home.join("AppData").join("Roaming").join(APP_DIR).join(LOG_FILE)),
        _ => None,
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            collector: CollectorConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000".to_string(),
            api_key: "devkey".to_string(),
            request_timeout_secs: 30,
            jitter_max_ms: 6000,
            queue_capacity: 1024,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poke_interval_ms: 6000,
            rotation_settle_ms: 1000,
            shutdown_grace_secs: 6,
        }
    }
}
