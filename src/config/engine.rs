use serde::Deserialize;

use crate::quota::DEFAULT_DAILY_LIMIT;

fn default_salt() -> String {
    // Stable fallback so a bare install still verifies its own hashes;
    // deployments should set their own salt.
    "gateman-default-passcode-salt".to_string()
}

fn default_daily_limit() -> i64 {
    DEFAULT_DAILY_LIMIT
}

/// Engine tuning shared by every claim and signal handler.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Process-wide salt for passcode digests. Changing it invalidates
    /// every stored hash.
    #[serde(default = "default_salt")]
    pub passcode_salt: String,
    /// Per-user daily redemption cap.
    #[serde(default = "default_daily_limit")]
    pub daily_download_limit: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            passcode_salt: default_salt(),
            daily_download_limit: default_daily_limit(),
        }
    }
}
