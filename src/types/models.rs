use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::policy::{AccessMode, AccessPolicy};

/// Where an asset's files originally came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Upload,
    MessageLink,
    MessageContext,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Upload => "upload",
            SourceKind::MessageLink => "message_link",
            SourceKind::MessageContext => "message_context",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "upload" => Ok(SourceKind::Upload),
            "message_link" => Ok(SourceKind::MessageLink),
            "message_context" => Ok(SourceKind::MessageContext),
            other => Err(Error::Validation(format!(
                "unsupported source kind: {other}"
            ))),
        }
    }
}

/// Descriptive redemption tag carried by an asset. The daily cap applies
/// regardless of the tag; it only labels how the asset was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaPolicy {
    OpenShare,
    DailyLimited,
}

impl QuotaPolicy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaPolicy::OpenShare => "open_share",
            QuotaPolicy::DailyLimited => "daily_limited",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "open_share" => Ok(QuotaPolicy::OpenShare),
            "daily_limited" => Ok(QuotaPolicy::DailyLimited),
            other => Err(Error::Validation(format!(
                "unsupported quota policy: {other}"
            ))),
        }
    }

    /// Lenient variant for rows written before the tag existed.
    #[must_use]
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or(QuotaPolicy::OpenShare)
    }
}

/// One file in an asset bundle. The URL points at the platform's CDN copy;
/// the engine never stores file bytes itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFile {
    pub id: String,
    pub name: String,
    pub size: i64,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Asset {
    pub id: String,
    pub guild_id: String,
    pub owner_user_id: String,
    pub gate_channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate_message_id: Option<String>,
    pub source_kind: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub access_mode: AccessMode,
    pub passcode_enabled: bool,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub quota_policy: QuotaPolicy,
    pub statement_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement_text: Option<String>,
    pub files: Vec<AssetFile>,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    #[must_use]
    pub fn policy(&self) -> AccessPolicy {
        AccessPolicy {
            mode: self.access_mode,
            passcode_enabled: self.passcode_enabled,
        }
    }
}

/// Input for asset creation. The password hash is computed by the engine
/// before the store sees it; the store only validates presence.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub guild_id: String,
    pub owner_user_id: String,
    pub gate_channel_id: String,
    pub source_kind: SourceKind,
    pub source_channel_id: Option<String>,
    pub source_message_id: Option<String>,
    pub source_url: Option<String>,
    pub access_mode: AccessMode,
    pub passcode_enabled: bool,
    pub password_hash: Option<String>,
    pub quota_policy: QuotaPolicy,
    pub statement_text: Option<String>,
    pub files: Vec<AssetFile>,
}

/// The four monotonic unlock flags for one (gate, user) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressFlags {
    pub reaction_met: bool,
    pub comment_met: bool,
    pub password_met: bool,
    pub statement_confirmed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnlockProgress {
    pub gate_message_id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub flags: ProgressFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of the atomic delivery-recording transaction.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryRecord {
    pub already_delivered: bool,
    pub used_today: i64,
}

#[derive(Debug, Clone, Default)]
pub struct DeliveryFilter {
    pub asset_id: Option<String>,
    pub user_id: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryLogEntry {
    pub asset_id: String,
    pub gate_message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub user_id: String,
    pub delivered_at: DateTime<Utc>,
    pub file_names: Vec<String>,
}
