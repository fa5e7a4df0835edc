//! User name and key set validation.

use std::collections::HashSet;

use super::errors::UserError;
use crate::keys::Key;

/// Longest accepted user name, in bytes.
pub const MAX_USER_NAME_LEN: usize = 255;

/// Whether `name` can be used as a user name.
///
/// Accepts plain usernames and e-mail addresses: an ASCII letter or digit
/// followed by letters, digits, `_`, `.`, `@`, `+` or `-`.
pub fn is_valid_user_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    name.len() <= MAX_USER_NAME_LEN
        && first.is_ascii_alphanumeric()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

pub fn validate_user_name(name: &str) -> Result<(), UserError> {
    if is_valid_user_name(name) {
        Ok(())
    } else {
        Err(UserError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Reject key sets that reuse a key name.
pub fn validate_key_names(username: &str, keys: &[Key]) -> Result<(), UserError> {
    let mut seen = HashSet::with_capacity(keys.len());
    for key in keys {
        if !seen.insert(key.name.as_str()) {
            return Err(UserError::DuplicateKeyName {
                username: username.to_string(),
                key_name: key.name.clone(),
            });
        }
    }
    Ok(())
}

/// Reject key content that would span more than one `authorized_keys` line.
///
/// A trailing line ending, as left by reading a `.pub` file, is accepted.
pub fn validate_key_content(username: &str, keys: &[Key]) -> Result<(), UserError> {
    let spans_lines = |key: &&Key| {
        key.content
            .trim_end_matches(['\r', '\n'])
            .contains(['\r', '\n'])
    };
    match keys.iter().find(spans_lines) {
        Some(key) => Err(UserError::InvalidKeyContent {
            username: username.to_string(),
            key_name: key.name.clone(),
        }),
        None => Ok(()),
    }
}
