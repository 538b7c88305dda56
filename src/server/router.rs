use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{get, post},
};

use super::{assets, claims, signals};
use crate::engine::ClaimEngine;

pub struct AppState {
    pub engine: Arc<ClaimEngine>,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/assets", post(assets::create_asset))
        .route(
            "/api/v1/assets/{asset_id}",
            get(assets::get_asset).delete(assets::delete_asset),
        )
        .route(
            "/api/v1/assets/{asset_id}/gate-message",
            post(assets::bind_gate_message),
        )
        .route(
            "/api/v1/assets/{asset_id}/claims",
            post(claims::attempt_claim),
        )
        .route(
            "/api/v1/channels/{channel_id}/assets",
            get(assets::list_channel_assets),
        )
        .route(
            "/api/v1/gates/{gate_message_id}/signals",
            post(signals::apply_signal),
        )
        .route(
            "/api/v1/gates/{gate_message_id}/passcode",
            post(signals::submit_passcode),
        )
        .route("/api/v1/deliveries", get(claims::list_deliveries))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
