pub const SCHEMA: &str = r#"
-- Gated asset bundles
CREATE TABLE IF NOT EXISTS assets (
    id TEXT PRIMARY KEY,
    guild_id TEXT NOT NULL,
    owner_user_id TEXT NOT NULL,
    gate_channel_id TEXT NOT NULL,

    -- Bound once, after the gate announcement exists
    gate_message_id TEXT UNIQUE,

    -- Provenance
    source_kind TEXT NOT NULL,
    source_channel_id TEXT,
    source_message_id TEXT,
    source_url TEXT,

    -- unlock_mode keeps the raw stored vocabulary (possibly legacy);
    -- base_mode/passcode_enabled carry the current two-axis policy
    unlock_mode TEXT NOT NULL,
    base_mode TEXT NOT NULL DEFAULT 'reaction',
    passcode_enabled INTEGER NOT NULL DEFAULT 0,
    password_hash TEXT,

    quota_policy TEXT NOT NULL DEFAULT 'open_share',
    statement_enabled INTEGER NOT NULL DEFAULT 0,
    statement_text TEXT,

    files_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Per-(gate, user) unlock state; flags are monotonic
CREATE TABLE IF NOT EXISTS unlock_progress (
    gate_message_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    reaction_met INTEGER NOT NULL DEFAULT 0,
    comment_met INTEGER NOT NULL DEFAULT 0,
    password_met INTEGER NOT NULL DEFAULT 0,
    statement_confirmed INTEGER NOT NULL DEFAULT 0,
    delivered_at TEXT,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (gate_message_id, user_id)
);

-- Per-(user, UTC day) redemption counters; rows are never deleted
CREATE TABLE IF NOT EXISTS daily_usage (
    user_id TEXT NOT NULL,
    date_key TEXT NOT NULL,
    used_count INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (user_id, date_key)
);

-- Single-row counter backing asset id allocation
CREATE TABLE IF NOT EXISTS asset_id_sequence (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    next_value INTEGER NOT NULL
);

INSERT OR IGNORE INTO asset_id_sequence (id, next_value) VALUES (1, 1);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_assets_gate_channel ON assets(gate_channel_id);
CREATE INDEX IF NOT EXISTS idx_progress_user ON unlock_progress(user_id);
CREATE INDEX IF NOT EXISTS idx_daily_usage_date ON daily_usage(date_key);
"#;
