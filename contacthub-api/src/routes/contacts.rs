/// Contact endpoints
///
/// - `POST /api/contacts` - Create a contact for the caller
/// - `GET /api/contacts` - List the caller's contacts
/// - `GET /api/contacts/:id` - Fetch a contact
/// - `PUT /api/contacts/:id` - Replace a contact
/// - `DELETE /api/contacts/:id` - Delete a contact and its addresses
///
/// All routes require authentication. A contact owned by another user
/// yields `401 Unauthorized`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::validate_not_blank,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use contacthub_shared::{
    auth::middleware::AuthContext,
    models::contact::{Contact, ContactFields},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Contact fields for create and full replacement
#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
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

    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,
}

impl ContactRequest {
    fn into_fields(self) -> ContactFields {
        ContactFields {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            email: self
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
        }
    }
}

/// Contact as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Contact> for ContactResponse {
    fn from(contact: Contact) -> Self {
        Self {
            id: contact.id,
            user_id: contact.user_id,
            first_name: contact.first_name,
            last_name: contact.last_name,
            phone_number: contact.phone_number,
            email: contact.email,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        }
    }
}

/// Column width of `contacts.phone_number`
const MAX_PHONE_LENGTH: usize = 32;

/// 7 to 15 digits, optionally with `+`, spaces, dots, dashes and parentheses,
/// at most 32 characters after trimming
fn validate_phone_number(phone: &str) -> Result<(), validator::ValidationError> {
    let phone = phone.trim();
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '.' | '-' | '(' | ')'));

    if allowed && phone.len() <= MAX_PHONE_LENGTH && (7..=15).contains(&digits) {
        return Ok(());
    }

    let mut error = validator::ValidationError::new("phone_number");
    error.message = Some("Invalid phone number".into());
    Err(error)
}

/// Loads a contact the caller owns
///
/// 404 when it doesn't exist, 401 when it belongs to someone else.
pub async fn owned_contact(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<Contact> {
    let contact = state
        .store
        .find_contact(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Contact not found".to_string()))?;

    if !auth.owns(contact.user_id) {
        return Err(ApiError::Unauthorized(
            "Not authorized to access this contact".to_string(),
        ));
    }

    Ok(contact)
}

/// Creates a contact owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /api/contacts
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// {
///   "first_name": "Charles",
///   "last_name": "Babbage",
///   "phone_number": "+44 20 7946 0000",
///   "email": "charles@example.com"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Missing or invalid token
pub async fn create_contact(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ContactRequest>,
) -> ApiResult<(StatusCode, Json<ContactResponse>)> {
    req.validate()?;

    let contact = state
        .store
        .create_contact(auth.user_id, req.into_fields())
        .await?;

    info!(user_id = %auth.user_id, contact_id = %contact.id, "Contact created");
    Ok((StatusCode::CREATED, Json(contact.into())))
}

/// Lists the caller's contacts, ordered by last then first name
pub async fn list_contacts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ContactResponse>>> {
    let contacts = state.store.list_contacts(auth.user_id).await?;

    Ok(Json(contacts.into_iter().map(Into::into).collect()))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ContactResponse>> {
    let contact = owned_contact(&state, &auth, id).await?;

    Ok(Json(contact.into()))
}

/// Replaces every field of a contact
pub async fn update_contact(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<ContactRequest>,
) -> ApiResult<Json<ContactResponse>> {
    req.validate()?;
    owned_contact(&state, &auth, id).await?;

    let contact = state
        .store
        .update_contact(id, req.into_fields())
        .await?
        .ok_or_else(|| ApiError::NotFound("Contact not found".to_string()))?;

    Ok(Json(contact.into()))
}

/// Deletes a contact together with its addresses
pub async fn delete_contact(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    owned_contact(&state, &auth, id).await?;

    if !state.store.delete_contact(id).await? {
        return Err(ApiError::NotFound("Contact not found".to_string()));
    }

    info!(user_id = %auth.user_id, contact_id = %id, "Contact deleted");
    Ok(StatusCode::NO_CONTENT)
}
