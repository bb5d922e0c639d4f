//! Configuration types for imagegen.
//!
//! A single `imagegen.json` file configures both halves of the system: the
//! `server` and `provider` sections drive the generation gateway, and the
//! `client` section drives the session orchestrator. The generation profile
//! (resolution, steps, seed) is deliberately absent; it is fixed policy.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "imagegen.json";

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_base_url() -> String {
    "https://api.studio.nebius.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "NEBIUS_API_KEY".to_string()
}

/// Default provider timeout in seconds.
const fn default_provider_timeout() -> u64 {
    120
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

/// Default client-visible generation timeout in seconds.
const fn default_client_timeout() -> u64 {
    60
}

/// Default directory for persisted session history.
fn default_history_dir() -> String {
    ".imagegen".to_string()
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Where the gateway listens.
    #[serde(default)]
    pub server: ServerConfig,

    /// How the gateway reaches the image provider.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// How the session orchestrator reaches the gateway and stores history.
    #[serde(default)]
    pub client: ClientConfig,
}

impl Config {
    /// Loads configuration from `imagegen.json` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            ConfigError::parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `imagegen.json` in a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the validated default configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the file cannot be read or holds
    /// invalid JSON, and `ConfigError::Validation` if values are unusable.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(ConfigError::parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::validation(
                "server.host must not be empty",
                "Set server.host to an address such as 127.0.0.1 in your imagegen.json",
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::validation(
                "server.port must be greater than 0",
                "Set server.port to a free port such as 3000 in your imagegen.json",
            ));
        }

        if !is_http_url(&self.provider.base_url) {
            return Err(ConfigError::validation(
                format!(
                    "provider.baseUrl must be an http(s) URL, got '{}'",
                    self.provider.base_url
                ),
                "Set provider.baseUrl to the provider's API root, e.g. https://api.studio.nebius.com/v1",
            ));
        }

        if self.provider.api_key_env.trim().is_empty() {
            return Err(ConfigError::validation(
                "provider.apiKeyEnv must not be empty",
                "Name the environment variable holding the provider API key, e.g. NEBIUS_API_KEY",
            ));
        }

        if self.provider.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "provider.timeoutSeconds must be greater than 0",
                "Set provider.timeoutSeconds to at least 1 second in your imagegen.json",
            ));
        }

        if !is_http_url(&self.client.gateway_url) {
            return Err(ConfigError::validation(
                format!(
                    "client.gatewayUrl must be an http(s) URL, got '{}'",
                    self.client.gateway_url
                ),
                "Set client.gatewayUrl to the gateway address, e.g. http://127.0.0.1:3000",
            ));
        }

        if self.client.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "client.timeoutSeconds must be greater than 0",
                "Set client.timeoutSeconds to at least 1 second in your imagegen.json",
            ));
        }

        if self.client.history_dir.trim().is_empty() {
            return Err(ConfigError::validation(
                "client.historyDir must not be empty",
                "Provide a directory for stored history in your imagegen.json (use '.' for current directory)",
            ));
        }

        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Gateway listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Image provider connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Root of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable that holds the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Upper bound on a single provider call, in seconds.
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

impl ProviderConfig {
    /// Returns the provider timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

/// Session orchestrator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base URL of the generation gateway.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Client-visible bound on a generation, in seconds.
    #[serde(default = "default_client_timeout")]
    pub timeout_seconds: u64,

    /// Directory where session history is persisted.
    #[serde(default = "default_history_dir")]
    pub history_dir: String,
}

impl ClientConfig {
    /// Returns the generation timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            timeout_seconds: default_client_timeout(),
            history_dir: default_history_dir(),
        }
    }
}
