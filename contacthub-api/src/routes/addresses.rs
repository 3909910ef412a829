/// Address endpoints
///
/// - `POST /api/addresses` - Add an address to one of the caller's contacts
/// - `GET /api/addresses/:id` - Fetch an address
/// - `PUT /api/addresses/:id` - Replace an address
/// - `DELETE /api/addresses/:id` - Delete an address
/// - `GET /api/contacts/:id/addresses` - List a contact's addresses
///
/// An address belongs to a user through its contact.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{contacts::owned_contact, validate_not_blank},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use contacthub_shared::{
    auth::middleware::AuthContext,
    models::address::{Address, AddressFields, AddressType},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Address fields for create and full replacement
///
/// `contact_id` is required on create. On update it may be omitted, but must
/// match the current contact when given.
#[derive(Debug, Deserialize, Validate)]
pub struct AddressRequest {
    pub contact_id: Option<Uuid>,

    /// One of home, work, billing, shipping, other
    pub address_type: String,

    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 255, message = "Street must be at most 255 characters")
    )]
    pub street: String,

    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 100, message = "City must be at most 100 characters")
    )]
    pub city: String,

    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 100, message = "State must be at most 100 characters")
    )]
    pub state: String,

    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 20, message = "Postal code must be at most 20 characters")
    )]
    pub postal_code: String,
}

impl AddressRequest {
    /// Validates the request, including the address type
    fn into_fields(self) -> ApiResult<AddressFields> {
        self.validate()?;

        let address_type: AddressType = self
            .address_type
            .parse()
            .map_err(|message: String| ApiError::invalid_field("address_type", message))?;

        Ok(AddressFields {
            address_type,
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
        })
    }
}

/// Address as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct AddressResponse {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub address_type: AddressType,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Address> for AddressResponse {
    fn from(address: Address) -> Self {
        Self {
            id: address.id,
            contact_id: address.contact_id,
            address_type: address.address_type,
            street: address.street,
            city: address.city,
            state: address.state,
            postal_code: address.postal_code,
            created_at: address.created_at,
            updated_at: address.updated_at,
        }
    }
}

/// Loads an address whose contact the caller owns
async fn owned_address(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<Address> {
    let address = state
        .store
        .find_address(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Address not found".to_string()))?;

    owned_contact(state, auth, address.contact_id).await?;

    Ok(address)
}

/// Adds an address to a contact
///
/// # Endpoint
///
/// ```text
/// POST /api/addresses
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// {
///   "contact_id": "uuid",
///   "address_type": "home",
///   "street": "1 Dorset Street",
///   "city": "London",
///   "state": "Greater London",
///   "postal_code": "W1U 6QE"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or `contact_id` missing
/// - `401 Unauthorized`: Contact belongs to another user
/// - `404 Not Found`: Contact doesn't exist
pub async fn create_address(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<AddressRequest>,
) -> ApiResult<(StatusCode, Json<AddressResponse>)> {
    let contact_id = req
        .contact_id
        .ok_or_else(|| ApiError::invalid_field("contact_id", "Contact ID is required"))?;
    let fields = req.into_fields()?;

    owned_contact(&state, &auth, contact_id).await?;

    let address = state.store.create_address(contact_id, fields).await?;

    info!(contact_id = %contact_id, address_id = %address.id, "Address created");
    Ok((StatusCode::CREATED, Json(address.into())))
}

pub async fn get_address(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AddressResponse>> {
    let address = owned_address(&state, &auth, id).await?;

    Ok(Json(address.into()))
}

/// Replaces every field of an address
pub async fn update_address(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddressRequest>,
) -> ApiResult<Json<AddressResponse>> {
    let target_contact = req.contact_id;
    let fields = req.into_fields()?;

    let existing = owned_address(&state, &auth, id).await?;

    if target_contact.is_some_and(|contact_id| contact_id != existing.contact_id) {
        return Err(ApiError::invalid_field(
            "contact_id",
            "Addresses cannot be moved to another contact",
        ));
    }

    let address = state
        .store
        .update_address(id, fields)
        .await?
        .ok_or_else(|| ApiError::NotFound("Address not found".to_string()))?;

    Ok(Json(address.into()))
}

pub async fn delete_address(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    owned_address(&state, &auth, id).await?;

    if !state.store.delete_address(id).await? {
        return Err(ApiError::NotFound("Address not found".to_string()));
    }

    info!(address_id = %id, "Address deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Lists the addresses of one of the caller's contacts
pub async fn list_contact_addresses(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(contact_id): Path<Uuid>,
) -> ApiResult<Json<Vec<AddressResponse>>> {
    owned_contact(&state, &auth, contact_id).await?;

    let addresses = state.store.list_addresses(contact_id).await?;

    Ok(Json(addresses.into_iter().map(Into::into).collect()))
}
