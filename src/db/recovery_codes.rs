//! Two-factor recovery codes, stored as a single `;`-joined token value.
//!
//! A code can neither be empty nor contain the separator, so the encoding
//! stays unambiguous: an empty stored value is an empty list. Stored values
//! written elsewhere may hold empty segments; those are ignored on read.

use crate::db::error::RepositoryError;

pub const SEPARATOR: char = ';';

fn validate(code: &str) -> Result<(), RepositoryError> {
    if code.is_empty() {
        return Err(RepositoryError::invalid_argument(
            "recovery_codes",
            "a recovery code cannot be empty",
        ));
    }
    if code.contains(SEPARATOR) {
        return Err(RepositoryError::invalid_argument(
            "recovery_codes",
            format!("a recovery code cannot contain '{SEPARATOR}'"),
        ));
    }
    Ok(())
}

pub fn encode(codes: &[&str]) -> Result<String, RepositoryError> {
    for code in codes {
        validate(code)?;
    }
    Ok(codes.join(SEPARATOR.to_string().as_str()))
}

/// Empty segments (`A;;B`, trailing `;`) are not codes and are skipped
pub fn decode(merged: &str) -> Vec<&str> {
    merged
        .split(SEPARATOR)
        .filter(|code| !code.is_empty())
        .collect()
}

pub fn count(merged: &str) -> usize {
    decode(merged).len()
}

/// Removes one occurrence of `code`. Returns the remaining codes, encoded,
/// or `None` when the code is not part of the list.
pub fn redeem(merged: &str, code: &str) -> Result<Option<String>, RepositoryError> {
    validate(code)?;

    let mut codes = decode(merged);
    let Some(position) = codes.iter().position(|c| *c == code) else {
        return Ok(None);
    };
    codes.remove(position);
    encode(&codes).map(Some)
}
