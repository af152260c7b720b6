// src/config.rs
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("{var} must be set to call the upstream API")]
    MissingApiKey { var: &'static str },

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Upstream chat-completion provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenRouter,
    Gemini,
}

impl Provider {
    pub fn api_key_var(self) -> &'static str {
        match self {
            Provider::OpenRouter => "OPENROUTER_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenRouter => "openai/gpt-oss-20b:free",
            Provider::Gemini => "gemini-2.0-flash",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::OpenRouter => "https://openrouter.ai/api/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenRouter => write!(f, "openrouter"),
            Provider::Gemini => write!(f, "gemini"),
        }
    }
}

/// API credential. Never printed by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    #[serde(rename = "log_level")]
    pub level: String,
    #[serde(rename = "log_format")]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub chat_path: String,
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            chat_path: "/api/chat".to_string(),
            static_dir: None,
        }
    }
}

// Empty `model` / `base_url` fall back to the provider defaults after loading.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    #[serde(rename = "upstream_provider")]
    pub provider: Provider,
    #[serde(skip)]
    pub api_key: ApiKey,
    #[serde(rename = "upstream_model")]
    pub model: String,
    #[serde(rename = "upstream_base_url")]
    pub base_url: String,
    #[serde(rename = "upstream_timeout_secs", deserialize_with = "duration_secs")]
    pub timeout: Duration,
    #[serde(rename = "upstream_max_in_flight")]
    pub max_in_flight: Option<usize>,
    #[serde(rename = "openrouter_referer")]
    pub referer: Option<String>,
    #[serde(rename = "openrouter_title")]
    pub title: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key: ApiKey::default(),
            model: String::new(),
            base_url: String::new(),
            timeout: Duration::from_secs(30),
            max_in_flight: None,
            referer: None,
            title: "ErgoMatrix Local Coach".to_string(),
        }
    }
}

impl UpstreamConfig {
    /// Provider defaults with the given credential.
    pub fn new(provider: Provider, api_key: ApiKey) -> Self {
        Self {
            provider,
            api_key,
            model: provider.default_model().to_string(),
            base_url: provider.default_base_url().to_string(),
            ..Self::default()
        }
    }
}

fn duration_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
    pub topic_filter: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(::config::Environment::default())
    }

    /// Same as `from_env`, reading the given variables instead of the process
    /// environment.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let source: ::config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::load(::config::Environment::default().source(Some(source)))
    }

    fn load(environment: ::config::Environment) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(environment.try_parsing(true).ignore_empty(true))
            .build()?;

        let server: ServerConfig = settings.clone().try_deserialize()?;
        let mut upstream: UpstreamConfig = settings.clone().try_deserialize()?;
        let logging: LoggingConfig = settings.clone().try_deserialize()?;
        let topic_filter = match settings.get_bool("topic_filter") {
            Ok(enabled) => enabled,
            Err(::config::ConfigError::NotFound(_)) => true,
            Err(err) => return Err(err.into()),
        };

        if !server.chat_path.starts_with('/') || server.chat_path == "/" {
            return Err(ConfigError::invalid(
                "CHAT_PATH",
                &server.chat_path,
                "must start with '/' and not be the root path",
            ));
        }

        let key_var = upstream.provider.api_key_var();
        let api_key = settings
            .get_string(&key_var.to_lowercase())
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey { var: key_var })?;
        upstream.api_key = ApiKey::new(api_key.trim());

        if upstream.model.trim().is_empty() {
            upstream.model = upstream.provider.default_model().to_string();
        }
        if upstream.base_url.trim().is_empty() {
            upstream.base_url = upstream.provider.default_base_url().to_string();
        } else if !(upstream.base_url.starts_with("http://")
            || upstream.base_url.starts_with("https://"))
        {
            return Err(ConfigError::invalid(
                "UPSTREAM_BASE_URL",
                &upstream.base_url,
                "expected an http(s) URL",
            ));
        }
        upstream.base_url = upstream.base_url.trim_end_matches('/').to_string();

        if upstream.timeout.is_zero() {
            return Err(ConfigError::invalid(
                "UPSTREAM_TIMEOUT_SECS",
                0,
                "expected a positive number of seconds",
            ));
        }
        if let Some(permits) = upstream.max_in_flight {
            if permits == 0 || permits > Semaphore::MAX_PERMITS {
                return Err(ConfigError::invalid(
                    "UPSTREAM_MAX_IN_FLIGHT",
                    permits,
                    format!("expected 1..={}", Semaphore::MAX_PERMITS),
                ));
            }
        }

        Ok(Self {
            server,
            upstream,
            logging,
            topic_filter,
        })
    }
}
