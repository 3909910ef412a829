/// User endpoints
///
/// - `POST /api/users/signup` - Create an account
/// - `POST /api/users/login` - Sign in, returning the user and a token pair
/// - `GET /api/users/:id` - Fetch own profile
/// - `PUT /api/users/:id` - Replace own profile
/// - `DELETE /api/users/:id` - Delete own account with all its contacts
///
/// Users can only read and modify their own record; any other id yields
/// `401 Unauthorized`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{
        tokens::{issue_token_pair, verify_credentials, CredentialsRequest, TokenPair},
        validate_not_blank,
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use contacthub_shared::{
    auth::{middleware::AuthContext, password},
    models::user::{CreateUser, UpdateUser, User},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 100, message = "First name must be at most 100 characters")
    )]
    pub first_name: String,

    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 100, message = "Last name must be at most 100 characters")
    )]
    pub last_name: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    #[validate(custom(function = "validate_username"))]
    pub username: String,

    /// Checked for strength separately
    pub password: String,
}

/// Full replacement of a user profile
///
/// The password is only changed when one is supplied.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 100, message = "First name must be at most 100 characters")
    )]
    pub first_name: String,

    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 100, message = "Last name must be at most 100 characters")
    )]
    pub last_name: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    #[validate(custom(function = "validate_username"))]
    pub username: String,

    pub password: Option<String>,
}

/// User as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name(),
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            username: user.username,
            email_verified: user.email_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

/// 3-50 characters: letters, digits, `.`, `_` and `-`
fn validate_username(username: &str) -> Result<(), validator::ValidationError> {
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if (3..=50).contains(&username.len()) && valid_chars {
        return Ok(());
    }

    let mut error = validator::ValidationError::new("username");
    error.message =
        Some("Username must be 3-50 characters of letters, digits, '.', '_' or '-'".into());
    Err(error)
}

fn check_password_strength(candidate: &str) -> ApiResult<()> {
    password::validate_password_strength(candidate)
        .map_err(|message| ApiError::invalid_field("password", message))
}

fn ensure_self(auth: &AuthContext, id: Uuid) -> ApiResult<()> {
    if auth.owns(id) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized(
            "Not authorized to access this user".to_string(),
        ))
    }
}

/// Creates an account
///
/// # Endpoint
///
/// ```text
/// POST /api/users/signup
/// Content-Type: application/json
///
/// {
///   "first_name": "Ada",
///   "last_name": "Lovelace",
///   "email": "ada@example.com",
///   "username": "ada",
///   "password": "Passw0rd"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or weak password
/// - `409 Conflict`: Email or username already taken
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    req.validate()?;
    check_password_strength(&req.password)?;

    let digest = password::hash_password(&req.password)?;

    let user = state
        .store
        .create_user(CreateUser {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            email: req.email.trim().to_string(),
            username: req.username,
            password: digest,
        })
        .await?;

    info!(user_id = %user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Signs in with username or email
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = verify_credentials(&state, &req).await?;
    let tokens = issue_token_pair(&state, &user).await?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        user: user.into(),
        tokens,
    }))
}

/// Fetches the caller's own profile
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    ensure_self(&auth, id)?;

    let user = state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Replaces the caller's own profile
///
/// Changing the email clears `email_verified`.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Not the caller's record
/// - `404 Not Found`: User no longer exists
/// - `409 Conflict`: Email or username taken by another user
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    ensure_self(&auth, id)?;
    req.validate()?;

    let password = match req.password.as_deref() {
        Some(candidate) => {
            check_password_strength(candidate)?;
            Some(password::hash_password(candidate)?)
        }
        None => None,
    };

    let user = state
        .store
        .update_user(
            id,
            UpdateUser {
                first_name: req.first_name.trim().to_string(),
                last_name: req.last_name.trim().to_string(),
                email: req.email.trim().to_string(),
                username: req.username,
                password,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id = %user.id, "User updated");
    Ok(Json(user.into()))
}

/// Deletes the caller's account, contacts, addresses and refresh tokens
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ensure_self(&auth, id)?;

    if !state.store.delete_user(id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!(user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
