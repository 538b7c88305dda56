use serde::{Deserialize, Serialize};

use crate::policy::{AccessMode, AccessPolicy};
use crate::types::ProgressFlags;

/// A discrete user action that may advance unlock progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Reaction,
    Comment,
    Password,
    Statement,
}

impl Signal {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Reaction => "reaction",
            Signal::Comment => "comment",
            Signal::Password => "password",
            Signal::Statement => "statement",
        }
    }
}

/// A signal is relevant only if it can affect completeness under the given
/// policy. Statement confirmation is orthogonal to the access policy and is
/// always recorded.
#[must_use]
pub fn is_signal_relevant(policy: &AccessPolicy, signal: Signal) -> bool {
    match signal {
        Signal::Reaction => matches!(
            policy.mode,
            AccessMode::Reaction | AccessMode::ReactionOrComment
        ),
        Signal::Comment => policy.mode == AccessMode::ReactionOrComment,
        Signal::Password => policy.passcode_enabled,
        Signal::Statement => true,
    }
}

/// Applies one signal to a progress snapshot. Flags only ever transition to
/// true; irrelevant signals return the input unchanged. Pure; callers
/// persist the result.
#[must_use]
pub fn apply_unlock_signal(
    policy: &AccessPolicy,
    progress: &ProgressFlags,
    signal: Signal,
) -> (ProgressFlags, bool) {
    let mut next = *progress;

    if is_signal_relevant(policy, signal) {
        match signal {
            Signal::Reaction => next.reaction_met = true,
            Signal::Comment => next.comment_met = true,
            Signal::Password => next.password_met = true,
            Signal::Statement => next.statement_confirmed = true,
        }
    }

    let completed = policy.is_complete(&next);
    (next, completed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(mode: AccessMode, passcode_enabled: bool) -> AccessPolicy {
        AccessPolicy {
            mode,
            passcode_enabled,
        }
    }

    #[test]
    fn test_relevance_matrix() {
        let none = policy(AccessMode::None, false);
        assert!(!is_signal_relevant(&none, Signal::Reaction));
        assert!(!is_signal_relevant(&none, Signal::Comment));
        assert!(!is_signal_relevant(&none, Signal::Password));
        assert!(is_signal_relevant(&none, Signal::Statement));

        let reaction = policy(AccessMode::Reaction, true);
        assert!(is_signal_relevant(&reaction, Signal::Reaction));
        assert!(!is_signal_relevant(&reaction, Signal::Comment));
        assert!(is_signal_relevant(&reaction, Signal::Password));

        let either = policy(AccessMode::ReactionOrComment, false);
        assert!(is_signal_relevant(&either, Signal::Reaction));
        assert!(is_signal_relevant(&either, Signal::Comment));
        assert!(!is_signal_relevant(&either, Signal::Password));
    }

    #[test]
    fn test_irrelevant_signal_is_a_no_op() {
        let policy = policy(AccessMode::None, false);
        let progress = ProgressFlags::default();

        let (next, completed) = apply_unlock_signal(&policy, &progress, Signal::Reaction);
        assert_eq!(next, progress);
        assert!(completed, "mode none is vacuously complete");
    }

    #[test]
    fn test_apply_is_idempotent() {
        let policy = policy(AccessMode::Reaction, false);
        let progress = ProgressFlags::default();

        let (once, _) = apply_unlock_signal(&policy, &progress, Signal::Reaction);
        let (twice, _) = apply_unlock_signal(&policy, &once, Signal::Reaction);
        assert_eq!(once, twice);
        assert!(once.reaction_met);
    }

    #[test]
    fn test_flags_are_monotonic() {
        let policy = policy(AccessMode::ReactionOrComment, true);
        let mut progress = ProgressFlags::default();

        for signal in [
            Signal::Comment,
            Signal::Reaction,
            Signal::Statement,
            Signal::Password,
            Signal::Comment,
            Signal::Reaction,
        ] {
            let before = progress;
            let (next, _) = apply_unlock_signal(&policy, &progress, signal);
            assert!(!before.reaction_met || next.reaction_met);
            assert!(!before.comment_met || next.comment_met);
            assert!(!before.password_met || next.password_met);
            assert!(!before.statement_confirmed || next.statement_confirmed);
            progress = next;
        }

        assert!(policy.is_complete(&progress));
    }

    #[test]
    fn test_statement_does_not_affect_completeness() {
        let policy = policy(AccessMode::Reaction, false);
        let (next, completed) =
            apply_unlock_signal(&policy, &ProgressFlags::default(), Signal::Statement);
        assert!(next.statement_confirmed);
        assert!(!completed);
    }

    #[test]
    fn test_password_completes_passcode_policy() {
        let policy = policy(AccessMode::None, true);
        let (next, completed) =
            apply_unlock_signal(&policy, &ProgressFlags::default(), Signal::Password);
        assert!(next.password_met);
        assert!(completed);
    }
}
