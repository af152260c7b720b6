// src/services/upstream/mod.rs
pub mod gemini;
pub mod openrouter;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{Provider, UpstreamConfig};
use crate::error::UpstreamError;

pub use gemini::GeminiClient;
pub use openrouter::OpenRouterClient;

#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Sends one completion request and returns the reply text.
    async fn generate(&self, system_prompt: &str, user_message: &str)
    -> Result<String, UpstreamError>;

    fn provider_name(&self) -> &'static str;
}

/// Builds the client for the configured provider.
pub fn build_client(config: &UpstreamConfig) -> Result<Arc<dyn UpstreamClient>, reqwest::Error> {
    let http = http_client(config.timeout)?;
    let client: Arc<dyn UpstreamClient> = match config.provider {
        Provider::OpenRouter => Arc::new(OpenRouterClient::new(http, config)),
        Provider::Gemini => Arc::new(GeminiClient::new(http, config)),
    };
    Ok(client)
}

pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Upstream response read as text, with a best-effort JSON parse.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: reqwest::StatusCode,
    pub text: String,
    pub json: Option<Value>,
}

impl RawResponse {
    pub(crate) async fn read(
        response: reqwest::Response,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, timeout))?;
        let json = serde_json::from_str(&text).ok();
        Ok(Self { status, text, json })
    }

    /// Reply text at `pointer`, after the status check.
    pub(crate) fn into_reply(self, pointer: &str, provider: &str) -> Result<String, UpstreamError> {
        if !self.status.is_success() {
            return Err(self.into_http_error(provider));
        }

        let reply = self
            .json
            .as_ref()
            .and_then(|json| json.pointer(pointer))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        reply.ok_or_else(|| UpstreamError::Parse {
            message: format!("No '{}' in {provider} response", describe_pointer(pointer)),
            body: self.text,
        })
    }

    fn into_http_error(self, provider: &str) -> UpstreamError {
        let from_json = self
            .json
            .as_ref()
            .and_then(|json| json.pointer("/error/message"))
            .and_then(Value::as_str)
            .filter(|msg| !msg.trim().is_empty())
            .map(str::to_string);

        let message = from_json
            .or_else(|| Some(self.text.trim().to_string()).filter(|t| !t.is_empty()))
            .unwrap_or_else(|| format!("{provider} returned a non-2xx status code"));

        UpstreamError::Http {
            status: self.status.as_u16(),
            message,
        }
    }
}

/// `/choices/0/message/content` -> `choices[0].message.content`
fn describe_pointer(pointer: &str) -> String {
    let mut out = String::new();
    for segment in pointer.split('/').filter(|s| !s.is_empty()) {
        if segment.chars().all(|c| c.is_ascii_digit()) {
            out.push_str(&format!("[{segment}]"));
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(segment);
        }
    }
    out
}
