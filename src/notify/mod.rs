mod webhook;

pub use webhook::{WebhookAuditSink, WebhookNotifier};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::types::Asset;

/// Proof that the host platform accepted an asset for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    pub sent_at: DateTime<Utc>,
    /// Platform-side message reference, when the transport reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Delivers an asset bundle to a user. Supplied by the host application;
/// failures surface as transport errors and must never be assumed away.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_asset(
        &self,
        user_id: &str,
        asset: &Asset,
        quota_label: &str,
    ) -> Result<DeliveryReceipt>;
}

/// One trace record per successful delivery.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub user_id: String,
    pub asset_id: String,
    pub gate_channel_id: String,
    pub file_names: Vec<String>,
    pub delivered_at: DateTime<Utc>,
}

/// Best-effort trace channel. Errors are logged and swallowed by the
/// engine; a failing sink never affects claim outcomes.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<()>;
}
