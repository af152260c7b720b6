// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::chatbot::Chatbot;
use crate::services::prompt::AssistantProfile;
use crate::services::rules::TopicFilter;
use crate::services::upstream::build_client;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub chatbot: Chatbot,
}

impl AppState {
    pub fn new(chatbot: Chatbot) -> Self {
        Self { chatbot }
    }

    /// Wires the configured provider and the built-in assistant profile.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let profile = AssistantProfile::ergomatrix();
        let client = build_client(&config.upstream)?;

        let mut chatbot = Chatbot::new(client, profile).with_timeout(config.upstream.timeout);
        if config.topic_filter {
            let filter = TopicFilter::from_profile(chatbot.profile());
            chatbot = chatbot.with_topic_filter(filter);
        }
        if let Some(permits) = config.upstream.max_in_flight {
            chatbot = chatbot.with_max_in_flight(permits);
        }

        Ok(Self::new(chatbot))
    }
}
