use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::dto::{ClaimRequest, ListDeliveriesParams};
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::validate_identifier;
use crate::types::DeliveryFilter;

pub async fn attempt_claim(
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<String>,
    Json(req): Json<ClaimRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_identifier(&req.user_id, "user id")?;

    let outcome = state.engine.attempt_claim(&asset_id, &req.user_id).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn list_deliveries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListDeliveriesParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = DeliveryFilter {
        asset_id: params.asset_id,
        user_id: params.user_id,
        limit: params.limit,
    };

    let deliveries = state.engine.list_deliveries(&filter)?;
    Ok(Json(ApiResponse::success(deliveries)))
}
