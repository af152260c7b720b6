// src/services/upstream/gemini.rs
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{RawResponse, UpstreamClient};
use crate::config::{ApiKey, UpstreamConfig};
use crate::error::UpstreamError;
use crate::services::prompt::embed_user_message;

const REPLY_POINTER: &str = "/candidates/0/content/parts/0/text";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

/// Gemini `generateContent` client. The API key travels as a query
/// parameter and the instructions are inlined into the user turn.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: ApiKey,
    url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, config: &UpstreamConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            url: format!(
                "{}/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl UpstreamClient for GeminiClient {
    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, UpstreamError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: embed_user_message(system_prompt, user_message),
                }],
            }],
        };

        tracing::debug!(url = %self.url, "calling gemini");
        let response = self
            .http
            .post(&self.url)
            .query(&[("key", self.api_key.expose())])
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        RawResponse::read(response, self.timeout)
            .await?
            .into_reply(REPLY_POINTER, self.provider_name())
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}
