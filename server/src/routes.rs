use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{handlers, security::middleware::client_context_middleware, state::AppState};

/// Request bodies above this size are refused before parsing
const MAX_BODY_BYTES: usize = 16 * 1024;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(handlers::websocket_handler))
        .route(
            "/api/messages",
            get(handlers::get_messages).post(handlers::post_message),
        )
        .route("/api/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            client_context_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::connect_info::MockConnectInfo,
        http::{Request, StatusCode},
    };
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::store::InMemoryMessageStore;

    fn app_from(peer: [u8; 4], state: AppState) -> Router {
        create_router(state).layer(MockConnectInfo(SocketAddr::from((peer, 40000))))
    }

    fn test_state() -> AppState {
        AppState::with_store(
            Arc::new(InMemoryMessageStore::new()),
            "test-secret".to_string(),
            None,
        )
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/messages")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn post_then_list_round_trip() {
        let state = test_state();

        let response = app_from([10, 0, 0, 1], state.clone())
            .oneshot(post(r#"{"text":"hello world","emoji":"😊"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let posted = json_body(response).await;
        assert_eq!(posted["text"], "hello world");
        assert_eq!(posted["emoji"], "😊");
        assert!(posted.get("client_hash").is_none());

        let response = app_from([10, 0, 0, 1], state)
            .oneshot(get("/api/messages"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listed = json_body(response).await;
        let first = &listed[0];
        assert_eq!(first["id"], posted["id"]);
        assert_eq!(first["text"], "hello world");
        assert!(first.get("client_hash").is_none());
    }

    #[tokio::test]
    async fn second_post_from_same_peer_is_rate_limited() {
        let state = test_state();

        let first = app_from([10, 0, 0, 2], state.clone())
            .oneshot(post(r#"{"text":"first message"}"#))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app_from([10, 0, 0, 2], state.clone())
            .oneshot(post(r#"{"text":"second message"}"#))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json_body(second).await["error"], "rate_limited");

        let other_peer = app_from([10, 0, 0, 3], state)
            .oneshot(post(r#"{"text":"another client"}"#))
            .await
            .unwrap();
        assert_eq!(other_peer.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn moderated_post_returns_reason() {
        let response = app_from([10, 0, 0, 4], test_state())
            .oneshot(post(r#"{"text":"I want to kill myself"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "content_rejected");
        assert_eq!(body["reason"], "self_harm_resource");
    }

    #[tokio::test]
    async fn missing_text_is_invalid_data() {
        let response = app_from([10, 0, 0, 5], test_state())
            .oneshot(post(r#"{"emoji":"😊"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "invalid_data");
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_data() {
        let response = app_from([10, 0, 0, 6], test_state())
            .oneshot(post("{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "invalid_data");
    }

    #[tokio::test]
    async fn health_reports_status_and_backend() {
        let response = app_from([10, 0, 0, 7], test_state())
            .oneshot(get("/api/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"], "memory");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_not_found() {
        let response = app_from([10, 0, 0, 8], test_state())
            .oneshot(get("/metrics"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
