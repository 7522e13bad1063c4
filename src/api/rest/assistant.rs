use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::rest::extract::AuthSession;
use crate::assistant::{ChatTurn, CHAT_FALLBACK, DEFAULT_ITEM_PROMPT, DESCRIBE_FALLBACK};
use crate::engine::orders::validate_image;
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/assistant/describe-item", post(describe_item))
        .route("/assistant/chat", post(chat))
}

#[derive(Deserialize)]
pub struct DescribeItemRequest {
    pub image_base64: String,
    pub mime_type: String,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// `degraded` is set when the reply is a fallback notice rather than model
/// output.
#[derive(Serialize)]
pub struct AssistantReply {
    pub reply: String,
    pub degraded: bool,
}

fn into_reply(
    state: &AppState,
    kind: &str,
    result: Result<String, AppError>,
    fallback: &str,
) -> AssistantReply {
    let (reply, degraded) = match result {
        Ok(reply) => (reply, false),
        Err(AppError::ExternalServiceUnavailable(notice)) => (notice, true),
        Err(err) => {
            warn!(kind, error = %err, "unexpected assistant failure");
            (fallback.to_string(), true)
        }
    };

    let outcome = if degraded { "degraded" } else { "success" };
    state
        .metrics
        .assistant_requests_total
        .with_label_values(&[kind, outcome])
        .inc();

    AssistantReply { reply, degraded }
}

async fn describe_item(
    State(state): State<Arc<AppState>>,
    _session: AuthSession,
    Json(payload): Json<DescribeItemRequest>,
) -> Result<Json<AssistantReply>, AppError> {
    validate_image(&payload.image_base64)?;
    if !payload.mime_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "unsupported mime type: {}",
            payload.mime_type
        )));
    }

    let prompt = payload
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty())
        .unwrap_or(DEFAULT_ITEM_PROMPT);

    let result = state
        .assistant
        .describe_item(&payload.image_base64, &payload.mime_type, prompt)
        .await;

    Ok(Json(into_reply(&state, "describe_item", result, DESCRIBE_FALLBACK)))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    _session: AuthSession,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<AssistantReply>, AppError> {
    if payload.message.trim().is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }

    let result = state
        .assistant
        .chat(&payload.message, &payload.history)
        .await;

    Ok(Json(into_reply(&state, "chat", result, CHAT_FALLBACK)))
}
