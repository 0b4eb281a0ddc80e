//! Identifiers: generated card ids and user-chosen board/list slugs

use thiserror::Error;
use ulid::Ulid;

/// Number of characters shown for a card id in listings
pub const SHORT_ID_LEN: usize = 8;

/// Names git resolves as symbolic refs before branches
const SYMBOLIC_REFS: [&str; 5] = [
    "HEAD",
    "FETCH_HEAD",
    "ORIG_HEAD",
    "MERGE_HEAD",
    "CHERRY_PICK_HEAD",
];

/// Reasons a board or list id is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("must not be empty")]
    Empty,

    #[error("must start with a letter or digit")]
    InvalidStart,

    #[error("contains invalid character '{0}'")]
    InvalidCharacter(char),

    #[error("must not contain '..'")]
    DoubleDot,

    #[error("must not end with '.lock'")]
    LockSuffix,

    #[error("must not end with '.'")]
    TrailingDot,

    #[error("'{0}' is reserved")]
    Reserved(String),
}

/// Generate a new card id
pub fn new_card_id() -> String {
    Ulid::new().to_string().to_lowercase()
}

/// Abbreviated form of a card id.
///
/// The leading characters of a ULID encode its timestamp, so the random
/// tail is what tells cards created together apart.
pub fn short_id(id: &str) -> &str {
    let start = id
        .char_indices()
        .rev()
        .nth(SHORT_ID_LEN - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &id[start..]
}

/// Check that `id` can be used as a file name and as a git branch name
pub fn validate_slug(id: &str, reserved: &[&str]) -> Result<(), SlugError> {
    let mut chars = id.chars();
    let first = chars.next().ok_or(SlugError::Empty)?;
    if !first.is_ascii_alphanumeric() {
        return Err(SlugError::InvalidStart);
    }

    if let Some(c) = chars.find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))) {
        return Err(SlugError::InvalidCharacter(c));
    }

    if id.contains("..") {
        return Err(SlugError::DoubleDot);
    }

    if id.ends_with(".lock") {
        return Err(SlugError::LockSuffix);
    }

    if id.ends_with('.') {
        return Err(SlugError::TrailingDot);
    }

    if SYMBOLIC_REFS.contains(&id) || reserved.contains(&id) {
        return Err(SlugError::Reserved(id.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_id_generation() {
        let id = new_card_id();
        assert_eq!(id.len(), 26);
        assert_eq!(id, id.to_lowercase());
        assert_ne!(id, new_card_id());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("01j9zq4m2k7x8c3v5b6n1p0r2t"), "6n1p0r2t");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_valid_slugs() {
        for id in ["foo", "Foo-bar", "v1.2", "a_b", "0day"] {
            assert!(validate_slug(id, &[]).is_ok(), "{id} should be valid");
        }
    }

    #[test]
    fn test_invalid_slugs() {
        assert_eq!(validate_slug("", &[]), Err(SlugError::Empty));
        assert_eq!(validate_slug("-foo", &[]), Err(SlugError::InvalidStart));
        assert_eq!(validate_slug("foo:", &[]), Err(SlugError::InvalidCharacter(':')));
        assert_eq!(validate_slug("foo bar", &[]), Err(SlugError::InvalidCharacter(' ')));
        assert_eq!(validate_slug("foo@bar", &[]), Err(SlugError::InvalidCharacter('@')));
        assert_eq!(validate_slug("foo..bar", &[]), Err(SlugError::DoubleDot));
        assert_eq!(validate_slug("foo.lock", &[]), Err(SlugError::LockSuffix));
        assert_eq!(validate_slug("foo.", &[]), Err(SlugError::TrailingDot));
        assert_eq!(validate_slug("HEAD", &[]), Err(SlugError::Reserved("HEAD".to_string())));
        assert_eq!(
            validate_slug("FETCH_HEAD", &["master"]),
            Err(SlugError::Reserved("FETCH_HEAD".to_string()))
        );
        assert!(validate_slug("head", &[]).is_ok());
        assert_eq!(
            validate_slug("master", &["master"]),
            Err(SlugError::Reserved("master".to_string()))
        );
    }
}
