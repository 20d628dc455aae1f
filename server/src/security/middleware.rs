use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::state::AppState;

/// Per-request client identity, inserted into request extensions
#[derive(Clone, Debug)]
pub struct ClientContext {
    /// Hashed peer address; the only form of the client identity kept around
    pub client_key: String,
}

/// Middleware that hashes the peer IP into a client key for downstream handlers
pub async fn client_context_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let client_key = state.key_hasher.hash(&addr.ip().to_string());
    req.extensions_mut().insert(ClientContext { client_key });

    next.run(req).await
}
