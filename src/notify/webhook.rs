use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use super::{AuditEntry, AuditSink, DeliveryReceipt, Notifier};
use crate::error::{Error, Result};
use crate::types::Asset;

/// Reference notifier: POSTs the delivery payload to a host-provided
/// webhook. The host is responsible for fanning the files out to the user.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_asset(
        &self,
        user_id: &str,
        asset: &Asset,
        quota_label: &str,
    ) -> Result<DeliveryReceipt> {
        let payload = json!({
            "user_id": user_id,
            "asset_id": asset.id,
            "quota": quota_label,
            "files": asset.files,
            "source_url": asset.source_url,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "delivery webhook returned {}",
                response.status()
            )));
        }

        let reference = response
            .headers()
            .get("x-delivery-reference")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(DeliveryReceipt {
            sent_at: Utc::now(),
            reference,
        })
    }
}

/// Trace-record sink backed by the same webhook shape. Failures propagate
/// as transport errors; the engine downgrades them to warnings.
pub struct WebhookAuditSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookAuditSink {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl AuditSink for WebhookAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(entry)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "audit webhook returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
