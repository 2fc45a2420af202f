//! Client configuration

use serde::{Deserialize, Serialize};
use traceline_core::{ApiKey, Error};
use traceline_transport::HttpClientConfig;

/// Default collection API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.traceline.dev";

/// Environment variable holding the API key
pub const ENV_API_KEY: &str = "TRACELINE_API_KEY";

/// Environment variable overriding the collection endpoint
pub const ENV_API_ENDPOINT: &str = "TRACELINE_API_ENDPOINT";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API key exchanged for a session JWT
    pub api_key: ApiKey,

    /// Collection API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Maximum events buffered in the dispatch queue
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,

    /// Maximum events per transmitted batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum time to wait before flushing a partial batch (milliseconds)
    #[serde(default = "default_batch_interval_ms")]
    pub batch_interval_ms: u64,

    /// Tags applied to every session started without explicit tags
    #[serde(default)]
    pub default_tags: Vec<String>,

    /// Version check behavior
    #[serde(default)]
    pub version_check: VersionCheckConfig,

    /// HTTP client knobs
    #[serde(skip, default)]
    pub http: HttpClientConfig,
}

/// Version check behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionCheckConfig {
    /// Run the check at client construction
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Registry URL override; `None` uses the public registry
    #[serde(default)]
    pub registry_url: Option<String>,
}

impl Default for VersionCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            registry_url: None,
        }
    }
}

// Default value functions for serde
fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_max_queue_size() -> usize {
    512
}

fn default_batch_size() -> usize {
    32
}

fn default_batch_interval_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the key
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            endpoint: default_endpoint(),
            max_queue_size: default_max_queue_size(),
            batch_size: default_batch_size(),
            batch_interval_ms: default_batch_interval_ms(),
            default_tags: Vec::new(),
            version_check: VersionCheckConfig::default(),
            http: HttpClientConfig::default(),
        }
    }

    /// Read configuration from the environment
    ///
    /// `TRACELINE_API_KEY` is required; `TRACELINE_API_ENDPOINT` overrides
    /// the default endpoint.
    pub fn from_env() -> crate::Result<Self> {
        let key = std::env::var(ENV_API_KEY)
            .map_err(|_| Error::Config(format!("{} is not set", ENV_API_KEY)))?;
        let mut config = Self::new(ApiKey::new(key)?);

        if let Ok(endpoint) = std::env::var(ENV_API_ENDPOINT) {
            config.endpoint = endpoint;
        }

        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_batch_interval_ms(mut self, batch_interval_ms: u64) -> Self {
        self.batch_interval_ms = batch_interval_ms;
        self
    }

    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    pub fn with_default_tags(mut self, tags: Vec<String>) -> Self {
        self.default_tags = tags;
        self
    }

    pub fn with_version_check(mut self, version_check: VersionCheckConfig) -> Self {
        self.version_check = version_check;
        self
    }

    pub fn with_http(mut self, http: HttpClientConfig) -> Self {
        self.http = http;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.endpoint.is_empty() {
            return Err(Error::Config("endpoint must not be empty".to_string()).into());
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()).into());
        }
        if self.max_queue_size == 0 {
            return Err(Error::Config("max_queue_size must be at least 1".to_string()).into());
        }
        if self.batch_interval_ms == 0 {
            return Err(Error::Config("batch_interval_ms must be at least 1".to_string()).into());
        }
        if self.batch_size > self.max_queue_size {
            return Err(Error::Config(
                "batch_size must not exceed max_queue_size".to_string(),
            )
            .into());
        }
        Ok(())
    }
}
