/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: HMAC-SHA512 password hashing with per-user keys
/// - [`jwt`]: Access token generation and validation
/// - [`refresh`]: Opaque refresh token generation and status checks
/// - [`confirmation`]: 6-digit email confirmation codes
/// - [`middleware`]: Bearer token authentication context
///
/// # Example
///
/// ```
/// use contacthub_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let digest = hash_password("user_Passw0rd")?;
/// assert!(verify_password("user_Passw0rd", &digest.hash, &digest.salt)?);
/// # Ok(())
/// # }
/// ```

pub mod confirmation;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh;
