// src/services/rules.rs

use std::fmt;

use super::prompt::AssistantProfile;

type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// A fixed reply returned when `predicate` matches the lowercased message.
pub struct CannedRule {
    name: String,
    predicate: Predicate,
    reply: String,
}

impl CannedRule {
    pub fn new<F>(name: impl Into<String>, predicate: F, reply: impl Into<String>) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
            reply: reply.into(),
        }
    }

    /// Matches when the message contains any of `phrases` (already lowercase).
    pub fn contains_any(name: impl Into<String>, phrases: Vec<String>, reply: impl Into<String>) -> Self {
        Self::new(
            name,
            move |msg: &str| phrases.iter().any(|p| msg.contains(p.as_str())),
            reply,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reply(&self) -> &str {
        &self.reply
    }
}

impl fmt::Debug for CannedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CannedRule")
            .field("name", &self.name)
            .field("reply", &self.reply)
            .finish()
    }
}

/// Ordered canned rules, first match wins.
#[derive(Debug, Default)]
pub struct ReplyRules {
    rules: Vec<CannedRule>,
}

impl ReplyRules {
    pub fn new(rules: Vec<CannedRule>) -> Self {
        Self { rules }
    }

    pub fn from_profile(profile: &AssistantProfile) -> Self {
        Self::new(vec![CannedRule::contains_any(
            "creator",
            profile.creator_questions.clone(),
            profile.attribution.clone(),
        )])
    }

    pub fn push(&mut self, rule: CannedRule) {
        self.rules.push(rule);
    }

    pub fn find(&self, message: &str) -> Option<&CannedRule> {
        let lowered = message.to_lowercase();
        self.rules.iter().find(|rule| (rule.predicate)(&lowered))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Case-insensitive keyword allow-list. A plain substring check, easy to
/// phrase around, so not an input-safety boundary.
#[derive(Debug, Clone)]
pub struct TopicFilter {
    keywords: Vec<String>,
}

impl TopicFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn from_profile(profile: &AssistantProfile) -> Self {
        Self::new(&profile.keywords)
    }

    pub fn allows(&self, message: &str) -> bool {
        let lowered = message.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}
