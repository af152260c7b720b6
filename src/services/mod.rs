pub mod chatbot;
pub mod prompt;
pub mod rules;
pub mod upstream;
