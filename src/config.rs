use serde::Deserialize;

use crate::series::DEFAULT_WINDOW_SIZE;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the management API (http or https). The traffic channel
    /// uses the matching ws/wss scheme on the same host.
    pub base_url: String,
    #[serde(default = "default_device_vendor")]
    pub device_vendor: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_device_vendor() -> String {
    "MikroTik".into()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

#[derive(Clone, Default, Deserialize)]
pub struct SessionConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Samples kept per interface.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_open_timeout_ms")]
    pub open_timeout_ms: u64,
    /// Inbound frames buffered between the socket reader and the worker.
    #[serde(default = "default_inbound_capacity")]
    pub inbound_capacity: usize,
    /// Device selected at startup.
    #[serde(default)]
    pub device_id: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            open_timeout_ms: default_open_timeout_ms(),
            inbound_capacity: default_inbound_capacity(),
            device_id: None,
        }
    }
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_open_timeout_ms() -> u64 {
    10_000
}

fn default_inbound_capacity() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (chart clients, updates applied, messages dropped) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        let base = url::Url::parse(&self.backend.base_url).map_err(|e| {
            anyhow::anyhow!(
                "backend.base_url is not a valid url ({}): {}",
                self.backend.base_url,
                e
            )
        })?;
        anyhow::ensure!(
            matches!(base.scheme(), "http" | "https"),
            "backend.base_url must use http or https, got {}",
            base.scheme()
        );
        anyhow::ensure!(
            base.host_str().is_some(),
            "backend.base_url must have a host"
        );
        anyhow::ensure!(
            self.backend.request_timeout_ms > 0,
            "backend.request_timeout_ms must be > 0, got {}",
            self.backend.request_timeout_ms
        );
        anyhow::ensure!(
            self.stream.window_size > 0,
            "stream.window_size must be > 0, got {}",
            self.stream.window_size
        );
        anyhow::ensure!(
            self.stream.open_timeout_ms > 0,
            "stream.open_timeout_ms must be > 0, got {}",
            self.stream.open_timeout_ms
        );
        anyhow::ensure!(
            self.stream.inbound_capacity > 0,
            "stream.inbound_capacity must be > 0, got {}",
            self.stream.inbound_capacity
        );
        if let Some(id) = &self.stream.device_id {
            anyhow::ensure!(!id.is_empty(), "stream.device_id must be non-empty when set");
        }
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
