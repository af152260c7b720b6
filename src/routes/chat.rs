use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use uuid::Uuid;

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse, StatusResponse},
    services::chatbot::ReplySource,
    state::SharedState,
};

#[tracing::instrument(name = "chat", skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(%rejection, "unreadable chat body");
        AppError::missing_message()
    })?;

    let message = payload.validated_message()?;
    let reply = state.chatbot.generate_reply(message).await?;

    if reply.source != ReplySource::Upstream {
        tracing::info!(source = ?reply.source, "answered without upstream call");
    }

    Ok(Json(ChatResponse::new(reply.text)))
}

pub async fn status_handler(State(state): State<SharedState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        ok: true,
        message: format!("{} backend is running.", state.chatbot.profile().brand),
    })
}
