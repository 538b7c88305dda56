mod engine;
mod server;

pub use engine::EngineConfig;
pub use server::ServerConfig;

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// On-disk configuration (`gateman.toml`). Every section is optional;
/// missing values fall back to defaults and CLI flags override the server
/// section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub webhooks: WebhookConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConfig {
    /// Delivery endpoint; required to serve claims.
    pub delivery_url: Option<String>,
    /// Optional trace-record endpoint.
    pub audit_url: Option<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Loads the file when present, defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
