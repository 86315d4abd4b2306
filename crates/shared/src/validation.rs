//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of a configuration key.
pub const MAX_KEY_LENGTH: u64 = 255;

/// Validates that a string contains at least one non-whitespace character.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates that a string has no control characters (tabs, newlines, NUL...).
pub fn validate_printable(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(char::is_control) {
        let mut err = ValidationError::new("control_characters");
        err.message = Some("Value must not contain control characters".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates a configuration key: not blank and printable.
pub fn validate_config_key(key: &str) -> Result<(), ValidationError> {
    validate_not_blank(key)?;
    validate_printable(key)
}
