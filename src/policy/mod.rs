mod legacy;

pub use legacy::normalize_stored_policy;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::ProgressFlags;

/// The primary access condition on a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    None,
    Reaction,
    ReactionOrComment,
}

impl AccessMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::None => "none",
            AccessMode::Reaction => "reaction",
            AccessMode::ReactionOrComment => "reaction_or_comment",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "none" => Ok(AccessMode::None),
            "reaction" => Ok(AccessMode::Reaction),
            "reaction_or_comment" => Ok(AccessMode::ReactionOrComment),
            other => Err(Error::Validation(format!(
                "unsupported access mode: {other}"
            ))),
        }
    }
}

/// Mode plus the orthogonal passcode requirement. Statement confirmation is
/// not part of the policy; it gates only the final claim step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessPolicy {
    pub mode: AccessMode,
    pub passcode_enabled: bool,
}

impl AccessPolicy {
    pub fn derive(mode: &str, passcode_enabled: bool) -> Result<Self> {
        Ok(Self {
            mode: AccessMode::parse(mode)?,
            passcode_enabled,
        })
    }

    fn primary_condition_met(&self, progress: &ProgressFlags) -> bool {
        match self.mode {
            AccessMode::None => true,
            AccessMode::Reaction => progress.reaction_met,
            AccessMode::ReactionOrComment => progress.reaction_met || progress.comment_met,
        }
    }

    #[must_use]
    pub fn is_complete(&self, progress: &ProgressFlags) -> bool {
        if !self.primary_condition_met(progress) {
            return false;
        }

        if self.passcode_enabled && !progress.password_met {
            return false;
        }

        true
    }

    /// Human-readable gaps, primary condition first, then passcode.
    #[must_use]
    pub fn missing_conditions(&self, progress: &ProgressFlags) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if !self.primary_condition_met(progress) {
            match self.mode {
                AccessMode::None => {}
                AccessMode::Reaction => missing.push("a reaction on the gate message"),
                AccessMode::ReactionOrComment => {
                    missing.push("a reaction or comment on the gate message");
                }
            }
        }

        if self.passcode_enabled && !progress.password_met {
            missing.push("the passcode");
        }

        missing
    }
}
