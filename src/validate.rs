//! Credential validation. Pure checks, run before any network call.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Credentials, ValidationError};

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    // `local@domain.tld`: no whitespace, exactly one `@`, a dot after it.
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|e| unreachable!("email pattern: {e}"))
});

/// Check that both fields are filled in and the email looks like an address.
///
/// # Errors
///
/// `EmptyField` when either field is blank after trimming,
/// `InvalidEmailFormat` when the email does not match `local@domain.tld`.
pub fn validate(credentials: &Credentials) -> Result<(), ValidationError> {
    if credentials.email.trim().is_empty() || credentials.password.trim().is_empty() {
        return Err(ValidationError::EmptyField);
    }
    if !is_valid_email(&credentials.email) {
        return Err(ValidationError::InvalidEmailFormat);
    }
    Ok(())
}

/// Email shape test, applied to the untrimmed input.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
