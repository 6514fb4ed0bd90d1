use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bodhi_core::format_response;

use crate::relay::{RelayError, DEFAULT_SESSION_ID};
use crate::state::{AppState, ChatRequest, ChatResponse, HealthResponse};

pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(e) => {
            tracing::warn!("Rejected chat request body: {}", e);
            return relay_error_response(RelayError::EmptyInput);
        }
    };

    let session_id = payload
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_SESSION_ID);
    let message = payload.message.unwrap_or_default();

    match state.relay.handle(session_id, &message).await {
        Ok(reply) => {
            let body = ChatResponse {
                response: format_response(&reply),
                status: "success".to_string(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => relay_error_response(e),
    }
}

pub async fn health_handler() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
        }),
    )
}

fn relay_error_response(error: RelayError) -> Response {
    match error {
        RelayError::EmptyInput => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": error.to_string() })),
        )
            .into_response(),
        RelayError::UpstreamFailure => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": error.to_string(), "status": "error" })),
        )
            .into_response(),
    }
}
