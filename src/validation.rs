//! User identifier validation.
//!
//! Pets are keyed by user id, and the id doubles as a sled key and a log
//! field, so it is normalized (trimmed, lowercased) and restricted to a small
//! safe alphabet before it reaches storage.

/// User id validation errors with helpful messages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserIdError {
    #[error("user id is too short (minimum {min} characters)")]
    TooShort { min: usize },

    #[error("user id is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("user id contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },

    #[error("user id contains path separators (/ or \\)")]
    PathTraversal,
}

pub const USER_ID_MIN_LEN: usize = 3;
pub const USER_ID_MAX_LEN: usize = 32;

/// Trim, lowercase and validate a user id.
///
/// Accepted ids are `USER_ID_MIN_LEN..=USER_ID_MAX_LEN` characters drawn from
/// ASCII letters, digits, `_`, `-` and `.`.
pub fn normalize_user_id(raw: &str) -> Result<String, UserIdError> {
    let id = raw.trim().to_ascii_lowercase();

    if id.contains('/') || id.contains('\\') {
        return Err(UserIdError::PathTraversal);
    }

    let len = id.chars().count();
    if len < USER_ID_MIN_LEN {
        return Err(UserIdError::TooShort {
            min: USER_ID_MIN_LEN,
        });
    }
    if len > USER_ID_MAX_LEN {
        return Err(UserIdError::TooLong {
            max: USER_ID_MAX_LEN,
        });
    }

    let bad: String = id
        .chars()
        .filter(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        .collect();
    if !bad.is_empty() {
        return Err(UserIdError::InvalidCharacters { chars: bad });
    }

    Ok(id)
}
