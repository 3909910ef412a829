/// JWT access token generation and validation
///
/// Access tokens are short-lived HS256 tokens that carry the identity of the
/// signed-in user. They are paired with opaque refresh tokens (see
/// [`super::refresh`]) that are exchanged for new access tokens.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: 15 minutes by default
/// - **Validation**: Signature, expiration, not-before and issuer checks
/// - **Secret Management**: Secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use contacthub_shared::auth::jwt::{create_token, validate_token, Claims, Identity};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let identity = Identity {
///     user_id: Uuid::new_v4(),
///     name: "Ada Lovelace".to_string(),
///     email: "ada@example.com".to_string(),
///     username: "ada".to_string(),
/// };
///
/// let token = create_token(&Claims::new(identity.clone()), "your-secret-key")?;
/// let claims = validate_token(&token, "your-secret-key")?;
/// assert_eq!(claims.sub, identity.user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim written into and required from every token
pub const ISSUER: &str = "contacthub";

/// Default access token lifetime
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 15;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer")]
    InvalidIssuer,
}

/// Identity asserted by an access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// User ID
    pub user_id: Uuid,

    /// Full display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Username
    pub username: String,
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "contacthub")
/// - `iat` / `nbf` / `exp`: Issued at, not before, expiration (Unix seconds)
///
/// # Custom Claims
///
/// - `name`, `email`, `username`: profile of the signed-in user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "contacthub"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Full name of the user
    pub name: String,

    /// Email of the user
    pub email: String,

    /// Username of the user
    pub username: String,
}

impl Claims {
    /// Creates claims with the default 15 minute expiration
    pub fn new(identity: Identity) -> Self {
        Self::with_expiration(identity, Duration::minutes(DEFAULT_ACCESS_TOKEN_TTL_MINUTES))
    }

    /// Creates claims with custom expiration
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{Duration, Utc};
    /// use contacthub_shared::auth::jwt::{Claims, Identity};
    /// use uuid::Uuid;
    ///
    /// let identity = Identity {
    ///     user_id: Uuid::new_v4(),
    ///     name: "Grace Hopper".to_string(),
    ///     email: "grace@example.com".to_string(),
    ///     username: "grace".to_string(),
    /// };
    /// let claims = Claims::with_expiration(identity, Duration::minutes(5));
    /// assert!(claims.exp > Utc::now().timestamp());
    /// ```
    pub fn with_expiration(identity: Identity, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: identity.user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            name: identity.name,
            email: identity.email,
            username: identity.username,
        }
    }
}

/// Creates a JWT token from claims
///
/// Signs the token using HS256 with the provided secret.
///
/// # Errors
///
/// Returns `JwtError::CreateError` if token creation fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// Verifies:
/// - Signature is valid
/// - Token hasn't expired (no leeway)
/// - Issuer is "contacthub"
/// - Token is not used before nbf time
///
/// # Errors
///
/// Returns `JwtError::Expired` for expired tokens, `JwtError::InvalidIssuer`
/// for foreign tokens and `JwtError::ValidationError` for everything else.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
