// src/message.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, ErrorKind};

/// Incoming chat payload. `message` stays untyped so that a missing or
/// non-string field is reported as an input error by the handler.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<Value>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(Value::String(message.into())),
        }
    }

    /// The message text as received, or an input error.
    pub fn validated_message(&self) -> Result<&str, AppError> {
        match &self.message {
            Some(Value::String(text)) if !text.is_empty() => Ok(text),
            _ => Err(AppError::missing_message()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub ok: bool,
    pub reply: String,
}

impl ChatResponse {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            ok: true,
            reply: reply.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub ok: bool,
    pub error_type: ErrorKind,
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub message: String,
}
