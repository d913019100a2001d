//! Boundary validation for user-supplied identifiers and passwords.
//!
//! Both the client (before deriving keys) and the server (before creating
//! an organization) apply these rules, so the two ends can never disagree
//! on what a well-formed slug is.

use thiserror::Error;

/// Minimum organization password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validation failures for request fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Slug is empty or contains characters outside `[a-z0-9-]`.
    #[error("slug must be lowercase alphanumeric with hyphens")]
    InvalidSlug,

    /// Password is shorter than [`MIN_PASSWORD_LEN`].
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Check that a slug matches `^[a-z0-9-]+$`.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(ValidationError::InvalidSlug);
    }
    if slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        Ok(())
    } else {
        Err(ValidationError::InvalidSlug)
    }
}

/// Check the password length floor. Key derivation must not be attempted
/// on a password that fails this.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        Err(ValidationError::PasswordTooShort)
    } else {
        Ok(())
    }
}
