#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ergomatrix_backend::error::UpstreamError;
use ergomatrix_backend::services::chatbot::Chatbot;
use ergomatrix_backend::services::prompt::AssistantProfile;
use ergomatrix_backend::services::rules::TopicFilter;
use ergomatrix_backend::services::upstream::UpstreamClient;

/// What the fake upstream does on every call.
pub enum Behavior {
    Reply(String),
    SlowReply(String, Duration),
    HttpError { status: u16, message: String },
    Parse(String),
    Hang,
}

/// Upstream stand-in that counts calls, tracks concurrency and remembers
/// the last message.
pub struct FakeUpstream {
    behavior: Behavior,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    last_user_message: std::sync::Mutex<Option<String>>,
}

impl FakeUpstream {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            last_user_message: std::sync::Mutex::new(None),
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(Behavior::Reply(text.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of `generate` calls that overlapped.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_user_message(&self) -> Option<String> {
        self.last_user_message.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamClient for FakeUpstream {
    async fn generate(
        &self,
        _system_prompt: &str,
        user_message: &str,
    ) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_user_message.lock().unwrap() = Some(user_message.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = self.respond().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

impl FakeUpstream {
    async fn respond(&self) -> Result<String, UpstreamError> {
        match &self.behavior {
            Behavior::Reply(text) => Ok(text.clone()),
            Behavior::SlowReply(text, delay) => {
                tokio::time::sleep(*delay).await;
                Ok(text.clone())
            }
            Behavior::HttpError { status, message } => Err(UpstreamError::Http {
                status: *status,
                message: message.clone(),
            }),
            Behavior::Parse(body) => Err(UpstreamError::Parse {
                message: "No 'choices[0].message.content' in fake response".to_string(),
                body: body.clone(),
            }),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok("too late".to_string())
            }
        }
    }
}

/// Chatbot over `upstream` with the built-in profile and topic filter on.
pub fn filtered_chatbot(upstream: Arc<FakeUpstream>) -> Chatbot {
    let profile = AssistantProfile::ergomatrix();
    let filter = TopicFilter::from_profile(&profile);
    Chatbot::new(upstream, profile).with_topic_filter(filter)
}
