// src/services/chatbot.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::prompt::AssistantProfile;
use super::rules::{ReplyRules, TopicFilter};
use super::upstream::UpstreamClient;
use crate::error::{AppError, UpstreamError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Canned,
    Refusal,
    Upstream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

/// Answers one message: canned rules, then the optional topic filter, then
/// a single upstream call. Holds no per-request state.
pub struct Chatbot {
    profile: AssistantProfile,
    system_prompt: String,
    rules: ReplyRules,
    topic_filter: Option<TopicFilter>,
    client: Arc<dyn UpstreamClient>,
    timeout: Duration,
    limiter: Option<Semaphore>,
}

impl Chatbot {
    pub fn new(client: Arc<dyn UpstreamClient>, profile: AssistantProfile) -> Self {
        Self {
            system_prompt: profile.system_prompt(),
            rules: ReplyRules::from_profile(&profile),
            topic_filter: None,
            profile,
            client,
            timeout: DEFAULT_TIMEOUT,
            limiter: None,
        }
    }

    pub fn with_topic_filter(mut self, filter: TopicFilter) -> Self {
        self.topic_filter = Some(filter);
        self
    }

    pub fn with_rules(mut self, rules: ReplyRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Caps concurrent upstream calls. Excess requests wait for a permit.
    pub fn with_max_in_flight(mut self, permits: usize) -> Self {
        self.limiter = Some(Semaphore::new(permits.clamp(1, Semaphore::MAX_PERMITS)));
        self
    }

    pub fn profile(&self) -> &AssistantProfile {
        &self.profile
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// `message` is forwarded as received; only an empty string is rejected.
    pub async fn generate_reply(&self, message: &str) -> Result<Reply, AppError> {
        if message.is_empty() {
            return Err(AppError::missing_message());
        }

        if let Some(rule) = self.rules.find(message) {
            tracing::debug!(rule = rule.name(), "canned reply");
            return Ok(Reply {
                text: rule.reply().to_string(),
                source: ReplySource::Canned,
            });
        }

        if let Some(filter) = &self.topic_filter {
            if !filter.allows(message) {
                tracing::debug!("message outside allowed topics");
                return Ok(Reply {
                    text: self.profile.refusal.clone(),
                    source: ReplySource::Refusal,
                });
            }
        }

        let _permit = match &self.limiter {
            Some(limiter) => Some(
                limiter
                    .acquire()
                    .await
                    .map_err(|e| AppError::Server(format!("upstream limiter closed: {e}")))?,
            ),
            None => None,
        };

        let call = self.client.generate(&self.system_prompt, message);
        let text = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| UpstreamError::Timeout(self.timeout))?
            .inspect_err(|err| {
                if let UpstreamError::Parse { body, .. } = err {
                    tracing::warn!(
                        provider = self.client.provider_name(),
                        body = %body,
                        "upstream response had no reply text"
                    );
                }
            })?;

        Ok(Reply {
            text,
            source: ReplySource::Upstream,
        })
    }
}
