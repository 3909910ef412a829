/// Password hashing module using keyed HMAC-SHA512
///
/// Every user gets a freshly generated random key which is stored next to the
/// digest as the "salt". Verification recomputes the MAC with the stored key
/// and compares it in constant time.
///
/// # Security
///
/// - **Algorithm**: HMAC-SHA512
/// - **Key (salt)**: 128 random bytes from the OS-seeded thread RNG
/// - **Output**: 64-byte digest
/// - **Comparison**: constant time via [`Mac::verify_slice`]
///
/// There is no work factor. The scheme is kept for compatibility with
/// existing password material.
///
/// # Example
///
/// ```
/// use contacthub_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let digest = hash_password("Sup3rSecret")?;
///
/// assert!(verify_password("Sup3rSecret", &digest.hash, &digest.salt)?);
/// assert!(!verify_password("wrong", &digest.hash, &digest.salt)?);
/// # Ok(())
/// # }
/// ```

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Length of the per-user HMAC key in bytes
pub const SALT_LENGTH: usize = 128;

/// Length of an HMAC-SHA512 digest in bytes
pub const HASH_LENGTH: usize = 64;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Stored password material is unusable
    #[error("Invalid password material: {0}")]
    InvalidMaterial(String),
}

/// Password hash plus the key it was computed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    /// HMAC-SHA512 output
    pub hash: Vec<u8>,

    /// Random HMAC key
    pub salt: Vec<u8>,
}

/// Hashes a password with a freshly generated key
///
/// # Errors
///
/// Returns `PasswordError::HashError` if the MAC cannot be keyed
///
/// # Example
///
/// ```
/// use contacthub_shared::auth::password::{hash_password, HASH_LENGTH, SALT_LENGTH};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let digest = hash_password("my_password")?;
/// assert_eq!(digest.hash.len(), HASH_LENGTH);
/// assert_eq!(digest.salt.len(), SALT_LENGTH);
/// # Ok(())
/// # }
/// ```
pub fn hash_password(password: &str) -> Result<PasswordDigest, PasswordError> {
    let mut salt = vec![0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut mac = HmacSha512::new_from_slice(&salt)
        .map_err(|e| PasswordError::HashError(format!("Invalid key: {}", e)))?;
    mac.update(password.as_bytes());

    Ok(PasswordDigest {
        hash: mac.finalize().into_bytes().to_vec(),
        salt,
    })
}

/// Verifies a password against a stored hash and salt
///
/// Returns `Ok(true)` if the password matches, `Ok(false)` if it doesn't.
///
/// # Errors
///
/// Returns `PasswordError::InvalidMaterial` if the stored salt is empty, which
/// means the record was never given a password.
pub fn verify_password(password: &str, hash: &[u8], salt: &[u8]) -> Result<bool, PasswordError> {
    if salt.is_empty() {
        return Err(PasswordError::InvalidMaterial("empty salt".to_string()));
    }

    let mut mac = HmacSha512::new_from_slice(salt)
        .map_err(|e| PasswordError::InvalidMaterial(format!("Invalid key: {}", e)))?;
    mac.update(password.as_bytes());

    Ok(mac.verify_slice(hash).is_ok())
}

/// Validates password strength
///
/// Checks that password:
/// - Is at least 8 characters long
/// - Contains at least one uppercase letter
/// - Contains at least one lowercase letter
/// - Contains at least one digit
///
/// # Example
///
/// ```
/// use contacthub_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("Passw0rd").is_ok());
/// assert!(validate_password_strength("short").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_lengths() {
        let digest = hash_password("test_password_123").expect("Hash should succeed");

        assert_eq!(digest.hash.len(), HASH_LENGTH);
        assert_eq!(digest.salt.len(), SALT_LENGTH);
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let first = hash_password("same_password").unwrap();
        let second = hash_password("same_password").unwrap();

        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn test_verify_password_correct() {
        let digest = hash_password("correct_password").unwrap();

        let result = verify_password("correct_password", &digest.hash, &digest.salt).unwrap();
        assert!(result, "Correct password should verify");
    }

    #[test]
    fn test_verify_password_incorrect() {
        let digest = hash_password("correct_password").unwrap();

        for candidate in ["wrong_password", "", "Correct_password", "correct_password "] {
            let result = verify_password(candidate, &digest.hash, &digest.salt).unwrap();
            assert!(!result, "'{}' should not verify", candidate);
        }
    }

    #[test]
    fn test_verify_password_with_other_salt_fails() {
        let digest = hash_password("password").unwrap();
        let other = hash_password("password").unwrap();

        assert!(!verify_password("password", &digest.hash, &other.salt).unwrap());
    }

    #[test]
    fn test_verify_password_truncated_hash_fails() {
        let digest = hash_password("password").unwrap();

        assert!(!verify_password("password", &digest.hash[..32], &digest.salt).unwrap());
    }

    #[test]
    fn test_verify_password_empty_salt_is_error() {
        let result = verify_password("password", &[0u8; HASH_LENGTH], &[]);
        assert!(matches!(result, Err(PasswordError::InvalidMaterial(_))));
    }

    #[test]
    fn test_unicode_password_verifies() {
        let digest = hash_password("unicode-密码-パスワード").unwrap();
        assert!(verify_password("unicode-密码-パスワード", &digest.hash, &digest.salt).unwrap());
    }

    #[test]
    fn test_validate_password_strength() {
        assert!(validate_password_strength("MyPassw0rd").is_ok());
        assert!(validate_password_strength("Sh0rt").unwrap_err().contains("8 characters"));
        assert!(validate_password_strength("lowercase1").unwrap_err().contains("uppercase"));
        assert!(validate_password_strength("UPPERCASE1").unwrap_err().contains("lowercase"));
        assert!(validate_password_strength("NoDigitsHere").unwrap_err().contains("digit"));
    }
}
