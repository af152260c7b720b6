// src/error.rs
use std::any::Any;
use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::ErrorBody;

const GENERIC_SERVER_MESSAGE: &str = "Unexpected server error";

/// Client-visible failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Input,
    UpstreamHttp,
    UpstreamTimeout,
    Parse,
    Server,
}

/// Failure of the single outbound call to the model provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    /// 2xx response without usable reply text. `body` keeps the raw text
    /// for logs only.
    #[error("{message}")]
    Parse { message: String, body: String },

    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl UpstreamError {
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(timeout)
        } else {
            UpstreamError::Transport(err)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Input(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Anything unexpected. The detail is logged, never sent to the client.
    #[error("{0}")]
    Server(String),
}

impl AppError {
    pub fn missing_message() -> Self {
        AppError::Input("Request JSON must include a 'message' string".to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Input(_) => ErrorKind::Input,
            AppError::Upstream(UpstreamError::Http { .. }) => ErrorKind::UpstreamHttp,
            AppError::Upstream(UpstreamError::Timeout(_)) => ErrorKind::UpstreamTimeout,
            AppError::Upstream(UpstreamError::Parse { .. }) => ErrorKind::Parse,
            AppError::Upstream(UpstreamError::Transport(_)) | AppError::Server(_) => {
                ErrorKind::Server
            }
        }
    }

    /// Upstream HTTP status, only for `UPSTREAM_HTTP` failures.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            AppError::Upstream(UpstreamError::Http { status, .. }) => Some(*status),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Input => StatusCode::BAD_REQUEST,
            ErrorKind::UpstreamHttp => self
                .upstream_status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ErrorKind::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Parse | ErrorKind::Server => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Never empty.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Input(msg) => msg.clone(),
            AppError::Upstream(UpstreamError::Http { message, .. }) => message.clone(),
            AppError::Upstream(err @ UpstreamError::Timeout(_)) => err.to_string(),
            AppError::Upstream(UpstreamError::Parse { message, .. }) => message.clone(),
            AppError::Upstream(UpstreamError::Transport(_)) | AppError::Server(_) => {
                GENERIC_SERVER_MESSAGE.to_string()
            }
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            ok: false,
            error_type: self.kind(),
            error_message: self.client_message(),
            status: self.upstream_status(),
            status_text: self
                .upstream_status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .and_then(|s| s.canonical_reason())
                .map(str::to_string),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.kind() {
            ErrorKind::Server => tracing::error!(error = ?self, "chat request failed"),
            ErrorKind::Input => tracing::debug!(error = %self, "rejected chat request"),
            _ => tracing::warn!(error = %self, "upstream call failed"),
        }

        (self.status_code(), Json(self.to_body())).into_response()
    }
}

/// Renders a handler panic as a `SERVER` failure.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");

    AppError::Server(format!("handler panicked: {detail}")).into_response()
}
