use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::notify::{AuditEntry, AuditSink, Notifier};
use crate::policy::AccessMode;
use crate::quota;
use crate::secret::SecretHasher;
use crate::store::Store;
use crate::types::*;
use crate::unlock::{Signal, apply_unlock_signal, is_signal_relevant};

/// Input for publishing a new gated asset. Carries the plaintext passcode;
/// the engine hashes it before anything is persisted.
#[derive(Debug, Clone)]
pub struct CreateAssetInput {
    pub guild_id: String,
    pub owner_user_id: String,
    pub gate_channel_id: String,
    pub source_kind: SourceKind,
    pub source_channel_id: Option<String>,
    pub source_message_id: Option<String>,
    pub source_url: Option<String>,
    pub access_mode: AccessMode,
    pub passcode: Option<String>,
    pub quota_policy: QuotaPolicy,
    pub statement_text: Option<String>,
    pub files: Vec<AssetFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalOutcome {
    pub changed: bool,
    pub completed: bool,
    pub progress: ProgressFlags,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PasscodeOutcome {
    /// The gate has no passcode requirement; nothing was recorded.
    NotRequired,
    Incorrect,
    Accepted(SignalOutcome),
}

/// Terminal states of one claim attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ClaimOutcome {
    Ineligible {
        missing: Vec<String>,
    },
    /// Access is complete but the author statement has not been confirmed;
    /// the caller must present it and resubmit via the statement signal.
    StatementPending,
    QuotaExceeded {
        reason: String,
        used_today: i64,
        limit: i64,
    },
    DeliveryFailed {
        reason: String,
    },
    Delivered {
        already_delivered: bool,
        used_today: i64,
        limit: i64,
    },
    Failed {
        reason: String,
    },
}

/// Coordinates policy, progress, quota, delivery, and recording. Shared
/// across request handlers via `Arc`; all cross-request coordination
/// happens inside the store.
pub struct ClaimEngine {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    audit: Option<Arc<dyn AuditSink>>,
    secrets: SecretHasher,
    config: EngineConfig,
}

impl ClaimEngine {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        audit: Option<Arc<dyn AuditSink>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            audit,
            secrets: SecretHasher::new(config.passcode_salt.clone()),
            config,
        }
    }

    pub fn create_asset(&self, input: CreateAssetInput) -> Result<Asset> {
        if input.files.is_empty() {
            return Err(Error::Validation(
                "an asset needs at least one file".to_string(),
            ));
        }

        let passcode = input
            .passcode
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty());

        let new_asset = NewAsset {
            guild_id: input.guild_id,
            owner_user_id: input.owner_user_id,
            gate_channel_id: input.gate_channel_id,
            source_kind: input.source_kind,
            source_channel_id: input.source_channel_id,
            source_message_id: input.source_message_id,
            source_url: input.source_url,
            access_mode: input.access_mode,
            passcode_enabled: passcode.is_some(),
            password_hash: passcode.map(|code| self.secrets.hash(code)),
            quota_policy: input.quota_policy,
            statement_text: input.statement_text,
            files: input.files,
        };

        self.store.create_asset(&new_asset)
    }

    pub fn bind_gate_message(&self, asset_id: &str, gate_message_id: &str) -> Result<Asset> {
        self.store.bind_gate_message(asset_id, gate_message_id)
    }

    pub fn get_asset(&self, asset_id: &str) -> Result<Option<Asset>> {
        self.store.get_asset_by_id(asset_id)
    }

    pub fn get_asset_by_gate_message(&self, gate_message_id: &str) -> Result<Option<Asset>> {
        self.store.get_asset_by_gate_message(gate_message_id)
    }

    pub fn list_assets_by_gate_channel(&self, channel_id: &str, limit: i64) -> Result<Vec<Asset>> {
        self.store.list_assets_by_gate_channel(channel_id, limit)
    }

    pub fn list_deliveries(&self, filter: &DeliveryFilter) -> Result<Vec<DeliveryLogEntry>> {
        self.store.list_deliveries(filter)
    }

    pub fn delete_asset(&self, asset_id: &str) -> Result<bool> {
        self.store.delete_asset(asset_id)
    }

    /// Applies one inbound signal for a user. Irrelevant signals and
    /// re-applications never touch storage.
    pub fn apply_signal(
        &self,
        gate_message_id: &str,
        user_id: &str,
        signal: Signal,
    ) -> Result<SignalOutcome> {
        let asset = self
            .store
            .get_asset_by_gate_message(gate_message_id)?
            .ok_or(Error::NotFound)?;
        let policy = asset.policy();

        let current = self
            .store
            .get_progress(gate_message_id, user_id)?
            .map(|progress| progress.flags)
            .unwrap_or_default();

        if !is_signal_relevant(&policy, signal) {
            return Ok(SignalOutcome {
                changed: false,
                completed: policy.is_complete(&current),
                progress: current,
            });
        }

        let (next, completed) = apply_unlock_signal(&policy, &current, signal);
        if next == current {
            return Ok(SignalOutcome {
                changed: false,
                completed,
                progress: current,
            });
        }

        let saved = self.store.merge_progress(gate_message_id, user_id, &next)?;

        Ok(SignalOutcome {
            changed: true,
            completed: policy.is_complete(&saved.flags),
            progress: saved.flags,
        })
    }

    /// Verifies a passcode attempt against the gate's stored digest and, on
    /// a match, applies the password signal.
    pub fn submit_passcode(
        &self,
        gate_message_id: &str,
        user_id: &str,
        attempt: &str,
    ) -> Result<PasscodeOutcome> {
        let asset = self
            .store
            .get_asset_by_gate_message(gate_message_id)?
            .ok_or(Error::NotFound)?;

        if !asset.passcode_enabled {
            return Ok(PasscodeOutcome::NotRequired);
        }

        let Some(hash) = asset.password_hash.as_deref() else {
            return Err(Error::Validation(
                "gate passcode is enabled but no secret is stored".to_string(),
            ));
        };

        if !self.secrets.verify(attempt.trim(), hash) {
            return Ok(PasscodeOutcome::Incorrect);
        }

        let outcome = self.apply_signal(gate_message_id, user_id, Signal::Password)?;
        Ok(PasscodeOutcome::Accepted(outcome))
    }

    /// Runs one claim attempt to a terminal state. Store failures inside
    /// the attempt become a declined outcome instead of crashing the
    /// calling handler; not-found propagates for the transport to map.
    pub async fn attempt_claim(&self, asset_id: &str, user_id: &str) -> Result<ClaimOutcome> {
        match self.try_claim(asset_id, user_id).await {
            Ok(outcome) => Ok(outcome),
            Err(err @ (Error::NotFound | Error::Validation(_))) => Err(err),
            Err(err) => {
                tracing::error!(
                    "claim for asset {} by user {} failed: {}",
                    asset_id,
                    user_id,
                    err
                );
                Ok(ClaimOutcome::Failed {
                    reason: "internal error while processing the claim".to_string(),
                })
            }
        }
    }

    async fn try_claim(&self, asset_id: &str, user_id: &str) -> Result<ClaimOutcome> {
        let asset = self
            .store
            .get_asset_by_id(asset_id)?
            .ok_or(Error::NotFound)?;

        // An asset without a bound gate message was never published.
        let Some(gate_message_id) = asset.gate_message_id.clone() else {
            return Err(Error::NotFound);
        };

        let policy = asset.policy();
        let progress = self
            .store
            .get_progress(&gate_message_id, user_id)?
            .map(|progress| progress.flags)
            .unwrap_or_default();

        if !policy.is_complete(&progress) {
            let missing = policy
                .missing_conditions(&progress)
                .into_iter()
                .map(str::to_string)
                .collect();
            return Ok(ClaimOutcome::Ineligible { missing });
        }

        if asset.statement_enabled && !progress.statement_confirmed {
            return Ok(ClaimOutcome::StatementPending);
        }

        let today = quota::date_key(Utc::now());
        let used_today = self.store.get_daily_usage(user_id, &today)?;
        let decision = quota::evaluate(self.config.daily_download_limit, used_today);

        if !decision.allowed {
            return Ok(ClaimOutcome::QuotaExceeded {
                reason: decision.reason,
                used_today: decision.used_today,
                limit: decision.limit,
            });
        }

        let quota_label = format!("{}/{}", decision.used_today + 1, decision.limit);
        let receipt = match self
            .notifier
            .send_asset(user_id, &asset, &quota_label)
            .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                tracing::warn!(
                    "delivery failed for asset {} to user {}: {}",
                    asset.id,
                    user_id,
                    err
                );
                return Ok(ClaimOutcome::DeliveryFailed {
                    reason: err.to_string(),
                });
            }
        };

        let record =
            self.store
                .record_delivery(&gate_message_id, user_id, &today, receipt.sent_at)?;

        self.emit_audit(&asset, user_id, receipt.sent_at).await;

        Ok(ClaimOutcome::Delivered {
            already_delivered: record.already_delivered,
            used_today: record.used_today,
            limit: decision.limit,
        })
    }

    async fn emit_audit(&self, asset: &Asset, user_id: &str, delivered_at: DateTime<Utc>) {
        let Some(audit) = &self.audit else {
            return;
        };

        let entry = AuditEntry {
            user_id: user_id.to_string(),
            asset_id: asset.id.clone(),
            gate_channel_id: asset.gate_channel_id.clone(),
            file_names: asset.files.iter().map(|file| file.name.clone()).collect(),
            delivered_at,
        };

        if let Err(err) = audit.record(&entry).await {
            tracing::warn!("audit record for asset {} failed: {}", asset.id, err);
        }
    }
}
