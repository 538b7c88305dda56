use crate::server::response::ApiError;

const MAX_IDENTIFIER_LEN: usize = 64;

/// Platform identifiers (users, guilds, channels, messages) are opaque to
/// the engine but must be present, bounded, and printable.
pub fn validate_identifier(value: &str, entity: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{entity} cannot be empty")));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(ApiError::bad_request(format!(
            "{entity} cannot exceed {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ApiError::bad_request(format!(
            "{entity} cannot contain whitespace or control characters"
        )));
    }
    Ok(())
}
