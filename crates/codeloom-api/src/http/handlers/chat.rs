//! Chat relay endpoint.
//!
//! Unlike the project endpoints this one speaks the bare reply contract:
//! `{message, code, filename}` on success and `{error, message}` on failure,
//! where `message` is the fixed apology.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use codeloom_types::chat::{ChatFailure, ChatRequest};
use codeloom_types::error::ChatError;

use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

/// POST /api/v1/chat - Relay one chat turn to the LLM.
pub async fn relay(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let apology = state.config.chat.apology_message.clone();

    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return failure(StatusCode::BAD_REQUEST, rejection.body_text(), apology);
        }
    };

    let chat = match state.chat() {
        Ok(chat) => chat,
        Err(e) => {
            tracing::error!(error = %e, "chat relay unavailable");
            let err = ChatError::Upstream(e);
            return failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), apology);
        }
    };

    match chat.relay(&user_id, request).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            let body = chat.failure(&e);
            (status, Json(body)).into_response()
        }
    }
}

fn failure(status: StatusCode, error: String, message: String) -> Response {
    (status, Json(ChatFailure { error, message })).into_response()
}
