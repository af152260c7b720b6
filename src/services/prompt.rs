// src/services/prompt.rs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantProfile {
    /// Product brand, used in the status message.
    pub brand: String,
    pub name: String,
    /// Topics listed in the prompt.
    pub topics: Vec<String>,
    /// Lowercase terms for the topic pre-filter.
    pub keywords: Vec<String>,
    pub refusal: String,
    pub attribution: String,
    /// Lowercase phrases answered with `attribution` directly.
    pub creator_questions: Vec<String>,
    pub health_directive: String,
}

impl AssistantProfile {
    pub fn ergomatrix() -> Self {
        Self {
            brand: "ErgoMatrix".to_string(),
            name: "ErgoMatrix Local Coach".to_string(),
            topics: strings(&[
                "ErgoMatrix",
                "the Posture Pro system",
                "the Eye-Q Sensor",
                "Mesh-Up",
                "posture tips for desk workers",
                "workspace ergonomics and micro-breaks",
                "this website",
            ]),
            keywords: strings(&[
                "ergomatrix",
                "ergo",
                "posture",
                "eye-q",
                "eyeq",
                "sensor",
                "mesh-up",
                "mesh up",
                "desk",
                "chair",
                "seat",
                "sit",
                "stand",
                "monitor",
                "screen",
                "keyboard",
                "mouse",
                "back",
                "neck",
                "shoulder",
                "wrist",
                "spine",
                "eye",
                "strain",
                "stretch",
                "break",
                "workstation",
                "office",
                "website",
                "price",
                "order",
            ]),
            refusal: "I can only help with questions about ErgoMatrix, the Posture Pro system, \
                      the Eye-Q Sensor, Mesh-Up, and posture or desk ergonomics."
                .to_string(),
            attribution: "I was made by the ErgoMatrix team to help you work more comfortably."
                .to_string(),
            creator_questions: strings(&[
                "who made you",
                "who created you",
                "who built you",
                "who developed you",
            ]),
            health_directive: "Do not diagnose medical conditions or recommend medication. \
                               If someone describes pain or symptoms, suggest ergonomic \
                               adjustments and short micro-breaks, and advise seeing a \
                               professional if the problem persists."
                .to_string(),
        }
    }

    /// Instruction text sent ahead of every user message.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are the '{name}', a narrow FAQ and posture assistant. \
             You ONLY answer questions about {topics}. \
             If the question is outside this scope, reply exactly: \"{refusal}\" \
             If asked who made or created you, reply: \"{attribution}\" \
             {health} \
             Keep answers short and practical.",
            name = self.name,
            topics = self.topics.join(", "),
            refusal = self.refusal,
            attribution = self.attribution,
            health = self.health_directive,
        )
    }
}

impl Default for AssistantProfile {
    fn default() -> Self {
        Self::ergomatrix()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Single-text form for providers that take no separate system role.
pub fn embed_user_message(system_prompt: &str, user_message: &str) -> String {
    format!("{system_prompt}\n\nUser question: {user_message}")
}
