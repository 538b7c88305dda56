use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::policy::normalize_stored_policy;
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_files(raw: &str) -> Vec<AssetFile> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::error!("Invalid files payload in database: {}", e);
        Vec::new()
    })
}

fn parse_source_kind(raw: &str) -> SourceKind {
    SourceKind::parse(raw).unwrap_or_else(|_| {
        tracing::error!("Invalid source kind in database: '{}'", raw);
        SourceKind::Upload
    })
}

const ASSET_COLUMNS: &str = "id, guild_id, owner_user_id, gate_channel_id, gate_message_id, \
     source_kind, source_channel_id, source_message_id, source_url, \
     unlock_mode, base_mode, passcode_enabled, password_hash, \
     quota_policy, statement_enabled, statement_text, files_json, created_at";

fn asset_from_row(row: &Row<'_>) -> rusqlite::Result<Asset> {
    let unlock_mode: String = row.get(9)?;
    let base_mode: Option<String> = row.get(10)?;
    let passcode_column: bool = row.get(11)?;
    let password_hash: Option<String> = row.get(12)?;

    // Legacy rows are translated here so nothing downstream ever sees the
    // old mode vocabulary.
    let policy = normalize_stored_policy(
        &unlock_mode,
        base_mode.as_deref(),
        passcode_column,
        password_hash.is_some(),
    );

    let source_kind: String = row.get(5)?;
    let quota_policy: String = row.get(13)?;
    let files_json: String = row.get(16)?;

    Ok(Asset {
        id: row.get(0)?,
        guild_id: row.get(1)?,
        owner_user_id: row.get(2)?,
        gate_channel_id: row.get(3)?,
        gate_message_id: row.get(4)?,
        source_kind: parse_source_kind(&source_kind),
        source_channel_id: row.get(6)?,
        source_message_id: row.get(7)?,
        source_url: row.get(8)?,
        access_mode: policy.mode,
        passcode_enabled: policy.passcode_enabled,
        password_hash,
        quota_policy: QuotaPolicy::parse_or_default(&quota_policy),
        statement_enabled: row.get(14)?,
        statement_text: row.get(15)?,
        files: parse_files(&files_json),
        created_at: parse_datetime(&row.get::<_, String>(17)?),
    })
}

fn progress_from_row(row: &Row<'_>) -> rusqlite::Result<UnlockProgress> {
    Ok(UnlockProgress {
        gate_message_id: row.get(0)?,
        user_id: row.get(1)?,
        flags: ProgressFlags {
            reaction_met: row.get(2)?,
            comment_met: row.get(3)?,
            password_met: row.get(4)?,
            statement_confirmed: row.get(5)?,
        },
        delivered_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

const PROGRESS_COLUMNS: &str = "gate_message_id, user_id, reaction_met, comment_met, \
     password_met, statement_confirmed, delivered_at, updated_at";

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn allocate_asset_id(&self) -> Result<String> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let stored: Option<i64> = tx
            .query_row(
                "SELECT next_value FROM asset_id_sequence WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let mut next = stored.unwrap_or(1).max(1);

        // Probe past ids inserted out of band (manual rows, restored
        // backups) so allocation never hands out an id that exists.
        loop {
            let taken: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM assets WHERE id = ?1",
                    params![next.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_none() {
                break;
            }
            next += 1;
        }

        tx.execute(
            "INSERT INTO asset_id_sequence (id, next_value) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET next_value = excluded.next_value",
            params![next + 1],
        )?;

        tx.commit()?;
        Ok(next.to_string())
    }

    fn create_asset(&self, input: &NewAsset) -> Result<Asset> {
        if input.passcode_enabled
            && input
                .password_hash
                .as_deref()
                .is_none_or(|hash| hash.trim().is_empty())
        {
            return Err(Error::Validation(
                "passcode is enabled but no secret was provided".to_string(),
            ));
        }

        let statement_text = input
            .statement_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        let id = self.allocate_asset_id()?;
        let files_json = serde_json::to_string(&input.files)
            .map_err(|e| Error::Validation(format!("unserializable file list: {e}")))?;
        let created_at = Utc::now();

        let inserted = self.conn().execute(
            "INSERT INTO assets (
                id, guild_id, owner_user_id, gate_channel_id,
                source_kind, source_channel_id, source_message_id, source_url,
                unlock_mode, base_mode, passcode_enabled, password_hash,
                quota_policy, statement_enabled, statement_text,
                files_json, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                id,
                input.guild_id,
                input.owner_user_id,
                input.gate_channel_id,
                input.source_kind.as_str(),
                input.source_channel_id,
                input.source_message_id,
                input.source_url,
                input.access_mode.as_str(),
                input.access_mode.as_str(),
                input.passcode_enabled,
                if input.passcode_enabled {
                    input.password_hash.as_deref()
                } else {
                    None
                },
                input.quota_policy.as_str(),
                statement_text.is_some(),
                statement_text,
                files_json,
                format_datetime(&created_at),
            ],
        );

        if let Err(err) = inserted {
            if is_unique_violation(&err) {
                return Err(Error::Conflict(format!("asset id {id} already exists")));
            }
            return Err(err.into());
        }

        self.get_asset_by_id(&id)?.ok_or(Error::NotFound)
    }

    fn bind_gate_message(&self, asset_id: &str, gate_message_id: &str) -> Result<Asset> {
        {
            let mut conn = self.conn();
            let tx = conn.transaction()?;

            let current: Option<Option<String>> = tx
                .query_row(
                    "SELECT gate_message_id FROM assets WHERE id = ?1",
                    params![asset_id],
                    |row| row.get(0),
                )
                .optional()?;

            match current.ok_or(Error::NotFound)? {
                Some(existing) if existing == gate_message_id => {
                    // Repeat bind with the same reference is a no-op.
                }
                Some(_) => {
                    return Err(Error::Conflict(format!(
                        "asset {asset_id} is already bound to a different gate message"
                    )));
                }
                None => {
                    let claimed: Option<String> = tx
                        .query_row(
                            "SELECT id FROM assets WHERE gate_message_id = ?1",
                            params![gate_message_id],
                            |row| row.get(0),
                        )
                        .optional()?;

                    if let Some(other) = claimed {
                        return Err(Error::Conflict(format!(
                            "gate message is already bound to asset {other}"
                        )));
                    }

                    tx.execute(
                        "UPDATE assets SET gate_message_id = ?1 WHERE id = ?2",
                        params![gate_message_id, asset_id],
                    )?;
                }
            }

            tx.commit()?;
        }

        self.get_asset_by_id(asset_id)?.ok_or(Error::NotFound)
    }

    fn get_asset_by_id(&self, asset_id: &str) -> Result<Option<Asset>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = ?1"),
            params![asset_id],
            asset_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_asset_by_gate_message(&self, gate_message_id: &str) -> Result<Option<Asset>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {ASSET_COLUMNS} FROM assets WHERE gate_message_id = ?1"),
            params![gate_message_id],
            asset_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_assets_by_gate_channel(&self, channel_id: &str, limit: i64) -> Result<Vec<Asset>> {
        let limit = limit.clamp(1, 100);
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets
             WHERE gate_channel_id = ?1 AND gate_message_id IS NOT NULL
             ORDER BY created_at DESC LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![channel_id, limit], asset_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_asset(&self, asset_id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let gate: Option<Option<String>> = tx
            .query_row(
                "SELECT gate_message_id FROM assets WHERE id = ?1",
                params![asset_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(gate_message_id) = gate else {
            return Ok(false);
        };

        if let Some(gate_message_id) = gate_message_id {
            tx.execute(
                "DELETE FROM unlock_progress WHERE gate_message_id = ?1",
                params![gate_message_id],
            )?;
        }

        tx.execute("DELETE FROM assets WHERE id = ?1", params![asset_id])?;
        tx.commit()?;
        Ok(true)
    }

    fn get_progress(
        &self,
        gate_message_id: &str,
        user_id: &str,
    ) -> Result<Option<UnlockProgress>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {PROGRESS_COLUMNS} FROM unlock_progress
                 WHERE gate_message_id = ?1 AND user_id = ?2"
            ),
            params![gate_message_id, user_id],
            progress_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn merge_progress(
        &self,
        gate_message_id: &str,
        user_id: &str,
        flags: &ProgressFlags,
    ) -> Result<UnlockProgress> {
        let now = format_datetime(&Utc::now());

        // MAX-merge keeps flags monotonic under concurrent signal writes;
        // delivered_at belongs to record_delivery and is never touched here.
        self.conn().execute(
            "INSERT INTO unlock_progress (
                gate_message_id, user_id,
                reaction_met, comment_met, password_met, statement_confirmed,
                updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(gate_message_id, user_id) DO UPDATE SET
                reaction_met = MAX(unlock_progress.reaction_met, excluded.reaction_met),
                comment_met = MAX(unlock_progress.comment_met, excluded.comment_met),
                password_met = MAX(unlock_progress.password_met, excluded.password_met),
                statement_confirmed = MAX(unlock_progress.statement_confirmed, excluded.statement_confirmed),
                updated_at = excluded.updated_at",
            params![
                gate_message_id,
                user_id,
                flags.reaction_met,
                flags.comment_met,
                flags.password_met,
                flags.statement_confirmed,
                now,
            ],
        )?;

        self.get_progress(gate_message_id, user_id)?
            .ok_or(Error::NotFound)
    }

    fn get_daily_usage(&self, user_id: &str, date_key: &str) -> Result<i64> {
        let conn = self.conn();
        let count: Option<i64> = conn
            .query_row(
                "SELECT used_count FROM daily_usage WHERE user_id = ?1 AND date_key = ?2",
                params![user_id, date_key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.unwrap_or(0))
    }

    fn increment_daily_usage(&self, user_id: &str, date_key: &str, delta: i64) -> Result<i64> {
        let delta = if delta > 0 { delta } else { 1 };
        let conn = self.conn();
        increment_usage_in(&conn, user_id, date_key, delta)
    }

    fn record_delivery(
        &self,
        gate_message_id: &str,
        user_id: &str,
        date_key: &str,
        delivered_at: DateTime<Utc>,
    ) -> Result<DeliveryRecord> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let existing: Option<Option<String>> = tx
            .query_row(
                "SELECT delivered_at FROM unlock_progress
                 WHERE gate_message_id = ?1 AND user_id = ?2",
                params![gate_message_id, user_id],
                |row| row.get(0),
            )
            .optional()?;

        let record = match existing {
            Some(Some(_)) => {
                // Redelivery: the original timestamp and today's counter
                // both stay as they are.
                let used: Option<i64> = tx
                    .query_row(
                        "SELECT used_count FROM daily_usage WHERE user_id = ?1 AND date_key = ?2",
                        params![user_id, date_key],
                        |row| row.get(0),
                    )
                    .optional()?;
                DeliveryRecord {
                    already_delivered: true,
                    used_today: used.unwrap_or(0),
                }
            }
            Some(None) => {
                let now = format_datetime(&delivered_at);
                tx.execute(
                    "UPDATE unlock_progress SET delivered_at = ?1, updated_at = ?1
                     WHERE gate_message_id = ?2 AND user_id = ?3",
                    params![now, gate_message_id, user_id],
                )?;
                let used = increment_usage_in(&tx, user_id, date_key, 1)?;
                DeliveryRecord {
                    already_delivered: false,
                    used_today: used,
                }
            }
            None => {
                let now = format_datetime(&delivered_at);
                tx.execute(
                    "INSERT INTO unlock_progress (gate_message_id, user_id, delivered_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3)",
                    params![gate_message_id, user_id, now],
                )?;
                let used = increment_usage_in(&tx, user_id, date_key, 1)?;
                DeliveryRecord {
                    already_delivered: false,
                    used_today: used,
                }
            }
        };

        tx.commit()?;
        Ok(record)
    }

    fn list_deliveries(&self, filter: &DeliveryFilter) -> Result<Vec<DeliveryLogEntry>> {
        let limit = filter.limit.unwrap_or(20).clamp(1, 30);
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT a.id, a.gate_message_id, a.source_url, a.files_json, p.user_id, p.delivered_at
             FROM unlock_progress p
             INNER JOIN assets a ON a.gate_message_id = p.gate_message_id
             WHERE p.delivered_at IS NOT NULL
               AND (?1 IS NULL OR a.id = ?1)
               AND (?2 IS NULL OR p.user_id = ?2)
             ORDER BY p.delivered_at DESC
             LIMIT ?3",
        )?;

        let rows = stmt.query_map(
            params![filter.asset_id, filter.user_id, limit],
            |row| {
                let files_json: String = row.get(3)?;
                Ok(DeliveryLogEntry {
                    asset_id: row.get(0)?,
                    gate_message_id: row.get(1)?,
                    source_url: row.get(2)?,
                    user_id: row.get(4)?,
                    delivered_at: parse_datetime(&row.get::<_, String>(5)?),
                    file_names: parse_files(&files_json)
                        .into_iter()
                        .map(|file| file.name)
                        .collect(),
                })
            },
        )?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn increment_usage_in(conn: &Connection, user_id: &str, date_key: &str, delta: i64) -> Result<i64> {
    let now = format_datetime(&Utc::now());

    conn.execute(
        "INSERT INTO daily_usage (user_id, date_key, used_count, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id, date_key) DO UPDATE SET
            used_count = daily_usage.used_count + excluded.used_count,
            updated_at = excluded.updated_at",
        params![user_id, date_key, delta, now],
    )?;

    let count: i64 = conn.query_row(
        "SELECT used_count FROM daily_usage WHERE user_id = ?1 AND date_key = ?2",
        params![user_id, date_key],
        |row| row.get(0),
    )?;
    Ok(count)
}
