use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub stream: StreamConfig,
    #[serde(default)]
    pub mock_server: MockServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend; the stream uses wss:// when this is https://.
    pub base_url: String,
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

fn default_fetch_timeout_ms() -> u64 {
    5000
}

/// Which transport feeds the metrics stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamSource {
    Websocket,
    Simulated,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    pub source: StreamSource,
    /// Push cadence of the simulated transport.
    #[serde(default = "default_simulated_interval_ms")]
    pub simulated_interval_ms: u64,
    /// Max wait for the server's close acknowledgment before the socket is dropped.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
}

fn default_simulated_interval_ms() -> u64 {
    2000
}

fn default_close_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct MockServerConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub push_interval_ms: u64,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".into(),
            port: 8080,
            push_interval_ms: 1000,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed `client.base_url`; valid after `validate`.
    pub fn base_url(&self) -> anyhow::Result<Url> {
        Ok(Url::parse(&self.client.base_url)?)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let base = Url::parse(&self.client.base_url).map_err(|e| {
            anyhow::anyhow!(
                "client.base_url must be an absolute URL, got {:?}: {}",
                self.client.base_url,
                e
            )
        })?;
        anyhow::ensure!(
            matches!(base.scheme(), "http" | "https"),
            "client.base_url must use http or https, got {}",
            base.scheme()
        );
        anyhow::ensure!(
            self.client.fetch_timeout_ms > 0,
            "client.fetch_timeout_ms must be > 0, got {}",
            self.client.fetch_timeout_ms
        );
        anyhow::ensure!(
            self.stream.simulated_interval_ms > 0,
            "stream.simulated_interval_ms must be > 0, got {}",
            self.stream.simulated_interval_ms
        );
        anyhow::ensure!(
            self.stream.close_timeout_ms > 0,
            "stream.close_timeout_ms must be > 0, got {}",
            self.stream.close_timeout_ms
        );
        if self.mock_server.enabled {
            anyhow::ensure!(
                self.mock_server.port > 0,
                "mock_server.port must be between 1 and 65535, got {}",
                self.mock_server.port
            );
            anyhow::ensure!(
                !self.mock_server.host.is_empty(),
                "mock_server.host must be non-empty"
            );
            anyhow::ensure!(
                self.mock_server.push_interval_ms > 0,
                "mock_server.push_interval_ms must be > 0, got {}",
                self.mock_server.push_interval_ms
            );
        }
        Ok(())
    }
}
