/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Signup, login and profile management
/// - `tokens`: Access/refresh token issuance, renewal and revocation
/// - `contacts`: Contact CRUD
/// - `addresses`: Address CRUD
/// - `confirmation_codes`: Emailed confirmation codes

pub mod addresses;
pub mod confirmation_codes;
pub mod contacts;
pub mod health;
pub mod tokens;
pub mod users;

/// Rejects empty and whitespace-only values
///
/// Request fields are trimmed before they are stored, so `"   "` would
/// otherwise pass a length check and be saved as an empty string.
pub(crate) fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if !value.trim().is_empty() {
        return Ok(());
    }

    let mut error = validator::ValidationError::new("blank");
    error.message = Some("Must not be blank".into());
    Err(error)
}
