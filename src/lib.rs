//! # Gateman
//!
//! An access-gated asset delivery engine, usable both as a standalone
//! server and as a library.
//!
//! Assets are bundles of files published behind a "gate": a policy made of
//! a primary social-proof condition (none, reaction, reaction-or-comment)
//! plus an optional passcode. Users advance per-gate unlock progress by
//! sending signals; claims re-check the policy, meter a per-user daily
//! quota, deliver through a host-supplied notifier, and record the outcome.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! gateman = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gateman::config::EngineConfig;
//! use gateman::engine::ClaimEngine;
//! use gateman::notify::WebhookNotifier;
//! use gateman::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/gateman.db").unwrap();
//! store.initialize().unwrap();
//!
//! let engine = ClaimEngine::new(
//!     Arc::new(store),
//!     Arc::new(WebhookNotifier::new("https://host.example/deliver")),
//!     None,
//!     EngineConfig::default(),
//! );
//! // Wire into your own transport, or serve with gateman::server.
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the binary's CLI. Disable with
//!   `default-features = false`.

pub mod config;
pub mod engine;
pub mod error;
pub mod notify;
pub mod policy;
pub mod quota;
pub mod secret;
pub mod server;
pub mod store;
pub mod types;
pub mod unlock;
