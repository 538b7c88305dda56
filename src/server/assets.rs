use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::engine::CreateAssetInput;
use crate::policy::AccessMode;
use crate::server::AppState;
use crate::server::dto::{BindGateMessageRequest, CreateAssetRequest, ListAssetsParams};
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::validate_identifier;
use crate::types::{QuotaPolicy, SourceKind};

const DEFAULT_LIST_LIMIT: i64 = 25;

pub async fn create_asset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAssetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_identifier(&req.guild_id, "guild id")?;
    validate_identifier(&req.owner_user_id, "owner user id")?;
    validate_identifier(&req.gate_channel_id, "gate channel id")?;

    let input = CreateAssetInput {
        guild_id: req.guild_id,
        owner_user_id: req.owner_user_id,
        gate_channel_id: req.gate_channel_id,
        source_kind: SourceKind::parse(&req.source_kind)?,
        source_channel_id: req.source_channel_id,
        source_message_id: req.source_message_id,
        source_url: req.source_url,
        access_mode: AccessMode::parse(&req.access_mode)?,
        passcode: req.passcode,
        quota_policy: match req.quota_policy.as_deref() {
            Some(tag) => QuotaPolicy::parse(tag)?,
            None => QuotaPolicy::OpenShare,
        },
        statement_text: req.statement,
        files: req.files,
    };

    let asset = state.engine.create_asset(input)?;
    Ok(Json(ApiResponse::success(asset)))
}

pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let asset = state
        .engine
        .get_asset(&asset_id)?
        .ok_or_else(|| ApiError::not_found("Asset not found"))?;
    Ok(Json(ApiResponse::success(asset)))
}

pub async fn bind_gate_message(
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<String>,
    Json(req): Json<BindGateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_identifier(&req.gate_message_id, "gate message id")?;

    let asset = state
        .engine
        .bind_gate_message(&asset_id, &req.gate_message_id)?;
    Ok(Json(ApiResponse::success(asset)))
}

pub async fn delete_asset(
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.engine.delete_asset(&asset_id)?;
    Ok(Json(ApiResponse::success(json!({ "deleted": deleted }))))
}

pub async fn list_channel_assets(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Query(params): Query<ListAssetsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let assets = state.engine.list_assets_by_gate_channel(&channel_id, limit)?;
    Ok(Json(ApiResponse::success(assets)))
}
