use super::{AccessMode, AccessPolicy};

const CURRENT_MODES: [&str; 3] = ["none", "reaction", "reaction_or_comment"];

/// Maps the superseded unlock-mode vocabulary (independent reaction, comment,
/// and password requirements plus their combinations) onto the current
/// two-axis policy. Unknown values fall back to requiring a reaction, with
/// the passcode axis inferred from whether a hash was stored.
fn derive_legacy_policy(unlock_mode: &str, has_password_hash: bool) -> AccessPolicy {
    let (mode, passcode_enabled) = match unlock_mode {
        "none" => (AccessMode::None, false),
        "reaction" => (AccessMode::Reaction, false),
        "reaction_or_comment" => (AccessMode::ReactionOrComment, false),
        "comment" | "reaction_comment" => (AccessMode::ReactionOrComment, false),
        "password" => (AccessMode::None, true),
        "reaction_password" => (AccessMode::Reaction, true),
        "comment_password" | "all" => (AccessMode::ReactionOrComment, true),
        _ => (AccessMode::Reaction, has_password_hash),
    };

    AccessPolicy {
        mode,
        passcode_enabled,
    }
}

/// Resolves the effective policy for a stored row. Rows written by the
/// current code carry `base_mode` and `passcode_enabled` columns; rows from
/// the legacy vocabulary are translated here so nothing downstream ever sees
/// an old mode value.
#[must_use]
pub fn normalize_stored_policy(
    unlock_mode: &str,
    base_mode: Option<&str>,
    passcode_enabled: bool,
    has_password_hash: bool,
) -> AccessPolicy {
    let legacy = derive_legacy_policy(unlock_mode, has_password_hash);
    let looks_legacy = !CURRENT_MODES.contains(&unlock_mode);

    if looks_legacy {
        return legacy;
    }

    let mode = base_mode
        .and_then(|value| AccessMode::parse(value).ok())
        .unwrap_or(legacy.mode);

    AccessPolicy {
        mode,
        passcode_enabled: passcode_enabled || legacy.passcode_enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_vocabulary_translation() {
        let table = [
            ("none", AccessMode::None, false),
            ("reaction", AccessMode::Reaction, false),
            ("reaction_or_comment", AccessMode::ReactionOrComment, false),
            ("comment", AccessMode::ReactionOrComment, false),
            ("reaction_comment", AccessMode::ReactionOrComment, false),
            ("password", AccessMode::None, true),
            ("reaction_password", AccessMode::Reaction, true),
            ("comment_password", AccessMode::ReactionOrComment, true),
            ("all", AccessMode::ReactionOrComment, true),
        ];

        for (stored, mode, passcode) in table {
            let policy = derive_legacy_policy(stored, false);
            assert_eq!(policy.mode, mode, "stored={stored}");
            assert_eq!(policy.passcode_enabled, passcode, "stored={stored}");
        }
    }

    #[test]
    fn test_unknown_mode_falls_back_to_reaction() {
        let policy = derive_legacy_policy("mystery", false);
        assert_eq!(policy.mode, AccessMode::Reaction);
        assert!(!policy.passcode_enabled);

        let policy = derive_legacy_policy("mystery", true);
        assert!(policy.passcode_enabled);
    }

    #[test]
    fn test_current_rows_prefer_stored_columns() {
        let policy = normalize_stored_policy("reaction", Some("reaction_or_comment"), true, true);
        assert_eq!(policy.mode, AccessMode::ReactionOrComment);
        assert!(policy.passcode_enabled);
    }

    #[test]
    fn test_legacy_rows_ignore_stored_columns() {
        // A row stamped with a legacy mode is translated wholesale, even if
        // a later migration backfilled base_mode with a default.
        let policy = normalize_stored_policy("comment_password", Some("reaction"), false, true);
        assert_eq!(policy.mode, AccessMode::ReactionOrComment);
        assert!(policy.passcode_enabled);
    }

    #[test]
    fn test_passcode_column_or_legacy() {
        let policy = normalize_stored_policy("none", Some("none"), false, false);
        assert!(!policy.passcode_enabled);

        let policy = normalize_stored_policy("none", Some("none"), true, true);
        assert!(policy.passcode_enabled);
    }
}
