// src/services/upstream/openrouter.rs
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{RawResponse, UpstreamClient};
use crate::config::{ApiKey, UpstreamConfig};
use crate::error::UpstreamError;

const REPLY_POINTER: &str = "/choices/0/message/content";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    reasoning: Reasoning,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Reasoning {
    enabled: bool,
}

/// OpenRouter chat-completions client (OpenAI-compatible schema).
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: ApiKey,
    model: String,
    url: String,
    referer: Option<String>,
    title: String,
    timeout: Duration,
}

impl OpenRouterClient {
    pub fn new(http: reqwest::Client, config: &UpstreamConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            referer: config.referer.clone(),
            title: config.title.clone(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl UpstreamClient for OpenRouterClient {
    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, UpstreamError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            reasoning: Reasoning { enabled: true },
        };

        let mut request = self
            .http
            .post(&self.url)
            .bearer_auth(self.api_key.expose())
            .header("X-Title", &self.title)
            .json(&body);
        if let Some(referer) = &self.referer {
            request = request.header("HTTP-Referer", referer);
        }

        tracing::debug!(model = %self.model, url = %self.url, "calling openrouter");
        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        RawResponse::read(response, self.timeout)
            .await?
            .into_reply(REPLY_POINTER, self.provider_name())
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }
}
