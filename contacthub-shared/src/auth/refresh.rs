/// Opaque refresh token utilities
///
/// Refresh tokens are 64 random bytes, hex encoded for transport. Only the
/// SHA-256 hash of a token is persisted, bound to the user it was issued to
/// (see [`crate::models::refresh_token`]).
///
/// # Example
///
/// ```
/// use contacthub_shared::auth::refresh::{generate_refresh_token, hash_refresh_token};
///
/// let (token, hash) = generate_refresh_token();
/// assert_eq!(token.len(), 128);
/// assert_eq!(hash, hash_refresh_token(&token));
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::refresh_token::RefreshToken;

/// Number of random bytes in a refresh token
pub const REFRESH_TOKEN_BYTES: usize = 64;

/// Default refresh token lifetime
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Outcome of checking a presented refresh token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTokenStatus {
    /// Token is known, not revoked and not expired
    Valid,

    /// Token is unknown or has been revoked
    Invalid,

    /// Token is known but past its expiry
    Expired,
}

/// Generates a new refresh token
///
/// Returns a tuple of (plaintext_token, sha256_hash).
pub fn generate_refresh_token() -> (String, String) {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let token = hex::encode(bytes);
    let hash = hash_refresh_token(&token);

    (token, hash)
}

/// Hashes a refresh token using SHA-256 (hex output, 64 chars)
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Expiry for a token issued at `issued_at` with the given lifetime
pub fn expires_at(issued_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    issued_at + ttl
}

/// Classifies a stored token record found for a presented token
///
/// `None` means the hash matched no record.
pub fn check_refresh_token(record: Option<&RefreshToken>, now: DateTime<Utc>) -> RefreshTokenStatus {
    match record {
        None => RefreshTokenStatus::Invalid,
        Some(token) if token.revoked_at.is_some() => RefreshTokenStatus::Invalid,
        Some(token) if token.expires_at <= now => RefreshTokenStatus::Expired,
        Some(_) => RefreshTokenStatus::Valid,
    }
}
