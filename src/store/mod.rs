mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// All methods are safe to call from concurrent tasks; implementations must
/// make identifier allocation, progress merges, usage increments, and
/// delivery recording atomic so no cross-task coordination is needed above
/// this trait.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Asset operations
    fn allocate_asset_id(&self) -> Result<String>;
    fn create_asset(&self, input: &NewAsset) -> Result<Asset>;
    fn bind_gate_message(&self, asset_id: &str, gate_message_id: &str) -> Result<Asset>;
    fn get_asset_by_id(&self, asset_id: &str) -> Result<Option<Asset>>;
    fn get_asset_by_gate_message(&self, gate_message_id: &str) -> Result<Option<Asset>>;
    fn list_assets_by_gate_channel(&self, channel_id: &str, limit: i64) -> Result<Vec<Asset>>;
    fn delete_asset(&self, asset_id: &str) -> Result<bool>;

    // Unlock progress operations
    fn get_progress(&self, gate_message_id: &str, user_id: &str)
    -> Result<Option<UnlockProgress>>;
    fn merge_progress(
        &self,
        gate_message_id: &str,
        user_id: &str,
        flags: &ProgressFlags,
    ) -> Result<UnlockProgress>;

    // Daily usage operations
    fn get_daily_usage(&self, user_id: &str, date_key: &str) -> Result<i64>;
    fn increment_daily_usage(&self, user_id: &str, date_key: &str, delta: i64) -> Result<i64>;

    /// Marks a delivery in one transaction: a first delivery stamps the
    /// timestamp and increments today's usage; a repeat leaves both alone.
    fn record_delivery(
        &self,
        gate_message_id: &str,
        user_id: &str,
        date_key: &str,
        delivered_at: DateTime<Utc>,
    ) -> Result<DeliveryRecord>;

    // Audit support
    fn list_deliveries(&self, filter: &DeliveryFilter) -> Result<Vec<DeliveryLogEntry>>;

    fn close(&self) -> Result<()>;
}
