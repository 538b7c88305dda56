use serde::Deserialize;

use crate::types::AssetFile;

/// Modes and tags arrive as raw strings so the engine can reject unknown
/// values with its own validation message instead of a serde error.
#[derive(Debug, Deserialize)]
pub struct CreateAssetRequest {
    pub guild_id: String,
    pub owner_user_id: String,
    pub gate_channel_id: String,
    pub source_kind: String,
    #[serde(default)]
    pub source_channel_id: Option<String>,
    #[serde(default)]
    pub source_message_id: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    pub access_mode: String,
    #[serde(default)]
    pub passcode: Option<String>,
    #[serde(default)]
    pub quota_policy: Option<String>,
    #[serde(default)]
    pub statement: Option<String>,
    pub files: Vec<AssetFile>,
}

#[derive(Debug, Deserialize)]
pub struct BindGateMessageRequest {
    pub gate_message_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplySignalRequest {
    pub user_id: String,
    pub signal: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPasscodeRequest {
    pub user_id: String,
    pub passcode: String,
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub user_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAssetsParams {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListDeliveriesParams {
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}
