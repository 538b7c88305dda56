use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::dto::{ApplySignalRequest, SubmitPasscodeRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::validate_identifier;
use crate::unlock::Signal;

pub async fn apply_signal(
    State(state): State<Arc<AppState>>,
    Path(gate_message_id): Path<String>,
    Json(req): Json<ApplySignalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_identifier(&req.user_id, "user id")?;

    let signal = match req.signal.as_str() {
        "reaction" => Signal::Reaction,
        "comment" => Signal::Comment,
        "statement" => Signal::Statement,
        "password" => {
            return Err(ApiError::bad_request(
                "passcode attempts must go through the passcode endpoint",
            ));
        }
        other => {
            return Err(ApiError::bad_request(format!("unsupported signal: {other}")));
        }
    };

    let outcome = state
        .engine
        .apply_signal(&gate_message_id, &req.user_id, signal)?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn submit_passcode(
    State(state): State<Arc<AppState>>,
    Path(gate_message_id): Path<String>,
    Json(req): Json<SubmitPasscodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_identifier(&req.user_id, "user id")?;

    let outcome = state
        .engine
        .submit_passcode(&gate_message_id, &req.user_id, &req.passcode)?;
    Ok(Json(ApiResponse::success(outcome)))
}
