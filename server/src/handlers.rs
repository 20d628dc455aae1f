use axum::{
    extract::{rejection::JsonRejection, ws::WebSocketUpgrade, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;

use crate::{
    error::AppError,
    models::{HealthResponse, MessageView, PostMessageRequest, RECENT_WINDOW},
    security::middleware::ClientContext,
    state::AppState,
    websocket::handle_websocket,
};

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_websocket(socket, state))
}

pub async fn post_message(
    State(state): State<AppState>,
    Extension(client): Extension<ClientContext>,
    payload: Result<Json<PostMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageView>), AppError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    let text = request
        .text
        .ok_or_else(|| AppError::InvalidRequest("Message text is required".to_string()))?;

    let message = state
        .ingestion
        .submit(&client.client_key, &text, request.emoji.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<MessageView>>, AppError> {
    let messages = state.ingestion.list_recent(RECENT_WINDOW).await?;
    Ok(Json(messages))
}

/// Liveness probe
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        storage: state.ingestion.store().backend().as_str(),
        active_connections: state.metrics.active_connections(),
    })
}

/// Prometheus exposition of the process metrics
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
