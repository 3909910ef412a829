/// Email confirmation codes
///
/// A confirmation code is a 6-digit number drawn uniformly from
/// `000000..=999999`. Codes are stored hashed per email address, expire after
/// a short window and can be used once.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::confirmation_code::ConfirmationCode;

/// Number of digits in a confirmation code
pub const CODE_DIGITS: usize = 6;

/// Default lifetime of a confirmation code
pub const DEFAULT_CODE_TTL_MINUTES: i64 = 10;

/// Guesses a code accepts; each verification claims one before comparing,
/// and a correct guess consumes the code
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Outcome of verifying a confirmation code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    /// Code matches an outstanding, unexpired code
    Valid,

    /// No outstanding code, wrong code, or too many failed attempts
    Invalid,

    /// The outstanding code has expired
    Expired,
}

/// Generates a zero-padded 6-digit code
///
/// # Example
///
/// ```
/// use contacthub_shared::auth::confirmation::generate_code;
///
/// let code = generate_code();
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_digit()));
/// ```
pub fn generate_code() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:0width$}", value, width = CODE_DIGITS)
}

/// Hashes a code for storage (SHA-256, hex)
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks the shape of a user-supplied code
pub fn is_well_formed(code: &str) -> bool {
    let code = code.trim();
    code.len() == CODE_DIGITS && code.chars().all(|c| c.is_ascii_digit())
}

/// Classifies the outstanding record for an email before a guess is made
///
/// `Valid` means the record can still take a guess; the guess itself is
/// compared with [`code_matches`] once an attempt has been claimed.
pub fn check_record(record: Option<&ConfirmationCode>, now: DateTime<Utc>) -> CodeStatus {
    let Some(record) = record else {
        return CodeStatus::Invalid;
    };

    if record.consumed_at.is_some() || record.failed_attempts >= MAX_FAILED_ATTEMPTS {
        return CodeStatus::Invalid;
    }

    if record.expires_at <= now {
        return CodeStatus::Expired;
    }

    CodeStatus::Valid
}

/// Compares a presented code with the stored hash
pub fn code_matches(record: &ConfirmationCode, code: &str) -> bool {
    is_well_formed(code) && record.code_hash == hash_code(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn record(code: &str, expires_in: Duration) -> ConfirmationCode {
        let now = Utc::now();
        ConfirmationCode {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            code_hash: hash_code(code),
            created_at: now,
            expires_at: now + expires_in,
            consumed_at: None,
            failed_attempts: 0,
        }
    }

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..1000 {
            let code = generate_code();
            assert!(is_well_formed(&code), "bad code {}", code);
        }
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed("012345"));
        assert!(is_well_formed(" 012345 "));
        assert!(!is_well_formed("12345"));
        assert!(!is_well_formed("1234567"));
        assert!(!is_well_formed("12a456"));
    }

    #[test]
    fn test_check_record_open() {
        let record = record("123456", Duration::minutes(10));
        assert_eq!(check_record(Some(&record), Utc::now()), CodeStatus::Valid);
        assert_eq!(check_record(None, Utc::now()), CodeStatus::Invalid);
    }

    #[test]
    fn test_check_record_expired() {
        let record = record("123456", Duration::seconds(-1));
        assert_eq!(check_record(Some(&record), Utc::now()), CodeStatus::Expired);
    }

    #[test]
    fn test_check_record_consumed_or_locked() {
        let mut consumed = record("123456", Duration::minutes(10));
        consumed.consumed_at = Some(Utc::now());
        assert_eq!(check_record(Some(&consumed), Utc::now()), CodeStatus::Invalid);

        let mut locked = record("123456", Duration::minutes(10));
        locked.failed_attempts = MAX_FAILED_ATTEMPTS;
        assert_eq!(check_record(Some(&locked), Utc::now()), CodeStatus::Invalid);

        locked.failed_attempts = MAX_FAILED_ATTEMPTS - 1;
        assert_eq!(check_record(Some(&locked), Utc::now()), CodeStatus::Valid);
    }

    #[test]
    fn test_code_matches() {
        let record = record("012345", Duration::minutes(10));
        assert!(code_matches(&record, "012345"));
        assert!(code_matches(&record, " 012345 "));
        assert!(!code_matches(&record, "543210"));
        assert!(!code_matches(&record, "12345"));
    }
}
