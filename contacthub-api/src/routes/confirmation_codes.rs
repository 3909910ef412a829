/// Confirmation code endpoints
///
/// - `POST /api/confirmation-codes/send` - Mail a 6-digit code to an address
/// - `POST /api/confirmation-codes/verify` - Check a code
///
/// Each address has at most one outstanding code. Sending a new one
/// invalidates the previous one; a code is consumed on successful
/// verification and stops being accepted after too many guesses.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Duration, Utc};
use contacthub_shared::{
    auth::confirmation::{self, CodeStatus},
    mail::confirmation_email,
    models::confirmation_code::CreateConfirmationCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

/// Send request
#[derive(Debug, Deserialize, Validate)]
pub struct SendCodeRequest {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,
}

/// Send response
#[derive(Debug, Serialize, Deserialize)]
pub struct SendCodeResponse {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Verify request
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    pub code: String,
}

/// Verify response
#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    pub status: CodeStatus,

    /// Whether an account with this email is now marked verified
    pub email_verified: bool,
}

/// Generates, stores and mails a confirmation code
///
/// # Endpoint
///
/// ```text
/// POST /api/confirmation-codes/send
/// Content-Type: application/json
///
/// { "email": "ada@example.com" }
/// ```
///
/// # Response
///
/// `202 Accepted`
///
/// ```json
/// { "email": "ada@example.com", "expires_at": "2025-01-01T12:10:00Z" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid email
/// - `500 Internal Server Error`: Mail delivery failed
pub async fn send_code(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> ApiResult<(StatusCode, Json<SendCodeResponse>)> {
    req.validate()?;
    let email = req.email.trim().to_string();

    let code = confirmation::generate_code();
    let ttl_minutes = state.config.confirmation.code_ttl_minutes;
    let expires_at = Utc::now() + Duration::minutes(ttl_minutes);

    // Mail first: issuing supersedes the previous code, which must stay
    // usable if delivery fails
    state
        .mailer
        .send(confirmation_email(&email, &code, ttl_minutes))
        .await?;

    state
        .store
        .issue_confirmation_code(CreateConfirmationCode {
            email: email.clone(),
            code_hash: confirmation::hash_code(&code),
            expires_at,
        })
        .await?;

    info!(email = %email, "Confirmation code sent");
    Ok((StatusCode::ACCEPTED, Json(SendCodeResponse { email, expires_at })))
}

/// Verifies a confirmation code
///
/// # Errors
///
/// - `400 Bad Request`: Code is wrong, already used, superseded or expired
pub async fn verify_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> ApiResult<Json<VerifyCodeResponse>> {
    req.validate()?;
    let email = req.email.trim();

    if !confirmation::is_well_formed(&req.code) {
        return Err(ApiError::invalid_field("code", "Code must be 6 digits"));
    }

    let invalid = || ApiError::BadRequest("Invalid confirmation code".to_string());

    let record = state.store.find_outstanding_code(email).await?;
    let record = match (confirmation::check_record(record.as_ref(), Utc::now()), record) {
        (CodeStatus::Valid, Some(record)) => record,
        (CodeStatus::Expired, _) => {
            return Err(ApiError::BadRequest("Confirmation code expired".to_string()));
        }
        _ => return Err(invalid()),
    };

    // Take one of the limited attempts before comparing
    let Some(record) = state.store.claim_code_attempt(record.id).await? else {
        warn!(email = %email, "Confirmation code out of attempts");
        return Err(invalid());
    };

    if !confirmation::code_matches(&record, &req.code) {
        warn!(email = %email, attempts = record.failed_attempts, "Wrong confirmation code");
        return Err(invalid());
    }

    if !state.store.consume_confirmation_code(record.id).await? {
        return Err(invalid());
    }

    let email_verified = state.store.mark_email_verified(email).await?;

    info!(email = %email, email_verified, "Confirmation code verified");
    Ok(Json(VerifyCodeResponse {
        status: CodeStatus::Valid,
        email_verified,
    }))
}
