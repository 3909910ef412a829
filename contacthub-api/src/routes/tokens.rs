/// Token endpoints
///
/// - `POST /api/tokens/acquire` - Exchange credentials for a token pair
/// - `POST /api/tokens/renew` - Exchange a refresh token for a new pair
/// - `POST /api/tokens/revoke` - Revoke a refresh token (logout)
///
/// Access tokens are short-lived JWTs. Refresh tokens are opaque random
/// strings; only their SHA-256 hash is stored, and each one is single use:
/// renewing revokes the presented token and issues a new one.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Duration, Utc};
use contacthub_shared::{
    auth::{
        jwt::{self, Claims},
        password,
        refresh::{self, RefreshTokenStatus},
    },
    models::{refresh_token::CreateRefreshToken, user::User},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

/// Credentials, accepted by both `/tokens/acquire` and `/users/login`
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    /// Username or email address
    #[validate(length(min = 1, message = "Username or email is required"))]
    pub login: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Access + refresh token pair
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    /// JWT for the `Authorization: Bearer` header
    pub access_token: String,

    /// Always `Bearer`
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Opaque token for `/api/tokens/renew`
    pub refresh_token: String,

    pub refresh_token_expires_at: DateTime<Utc>,
}

/// Issues a fresh access token and a stored refresh token for `user`
pub async fn issue_token_pair(state: &AppState, user: &User) -> ApiResult<TokenPair> {
    let access_ttl = Duration::minutes(state.config.jwt.access_token_ttl_minutes);
    let claims = Claims::with_expiration(user.identity(), access_ttl);
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    let (refresh_token, token_hash) = refresh::generate_refresh_token();
    let expires_at = refresh::expires_at(
        Utc::now(),
        Duration::days(state.config.jwt.refresh_token_ttl_days),
    );

    state
        .store
        .store_refresh_token(CreateRefreshToken {
            user_id: user.id,
            token_hash,
            expires_at,
        })
        .await?;

    Ok(TokenPair {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: access_ttl.num_seconds(),
        refresh_token,
        refresh_token_expires_at: expires_at,
    })
}

/// Looks up a user by username or email and checks the password
///
/// Unknown users and wrong passwords produce the same 401.
pub async fn verify_credentials(state: &AppState, req: &CredentialsRequest) -> ApiResult<User> {
    let invalid = || ApiError::Unauthorized("Invalid username or password".to_string());

    let user = state
        .store
        .find_user_by_login(req.login.trim())
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash, &user.password_salt)? {
        warn!(user_id = %user.id, "Failed login attempt");
        return Err(invalid());
    }

    Ok(user)
}

/// Exchanges credentials for a token pair
///
/// # Endpoint
///
/// ```text
/// POST /api/tokens/acquire
/// Content-Type: application/json
///
/// {
///   "login": "ada",
///   "password": "Passw0rd"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
pub async fn acquire(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<TokenPair>> {
    req.validate()?;

    let user = verify_credentials(&state, &req).await?;
    let tokens = issue_token_pair(&state, &user).await?;

    info!(user_id = %user.id, "Tokens acquired");
    Ok(Json(tokens))
}

/// Exchanges a refresh token for a new token pair
///
/// The presented token is revoked, so replaying it fails.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown, revoked or expired refresh token
pub async fn renew(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    req.validate()?;

    let token_hash = refresh::hash_refresh_token(req.refresh_token.trim());
    let record = state.store.find_refresh_token(&token_hash).await?;

    let record = match (refresh::check_refresh_token(record.as_ref(), Utc::now()), record) {
        (RefreshTokenStatus::Valid, Some(record)) => record,
        (RefreshTokenStatus::Expired, _) => {
            return Err(ApiError::Unauthorized("Refresh token expired".to_string()));
        }
        _ => return Err(ApiError::Unauthorized("Invalid refresh token".to_string())),
    };

    // Lost a race with a concurrent renewal of the same token
    if !state.store.revoke_refresh_token(record.id).await? {
        warn!(user_id = %record.user_id, "Refresh token reused");
        return Err(ApiError::Unauthorized("Invalid refresh token".to_string()));
    }

    let user = state
        .store
        .find_user(record.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    let tokens = issue_token_pair(&state, &user).await?;

    info!(user_id = %user.id, "Tokens renewed");
    Ok(Json(tokens))
}

/// Revokes a refresh token
///
/// Answers 204 whether or not the token was known.
pub async fn revoke(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;

    let token_hash = refresh::hash_refresh_token(req.refresh_token.trim());
    if let Some(record) = state.store.find_refresh_token(&token_hash).await? {
        if state.store.revoke_refresh_token(record.id).await? {
            info!(user_id = %record.user_id, "Refresh token revoked");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
