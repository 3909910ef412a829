/// Persistence abstraction
///
/// Route handlers talk to a [`Store`] trait object instead of a concrete
/// pool, so the same handlers run against PostgreSQL in production
/// ([`postgres::PgStore`]) and against an in-memory backend in tests
/// (`memory::MemoryStore`, behind the `test-support` feature).
///
/// # Example
///
/// ```no_run
/// use contacthub_shared::store::{postgres::PgStore, Store};
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    address::{Address, AddressFields},
    confirmation_code::{ConfirmationCode, CreateConfirmationCode},
    contact::{Contact, ContactFields},
    refresh_token::{CreateRefreshToken, RefreshToken},
    user::{CreateUser, UpdateUser, User},
};

#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod postgres;

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique value (email, username, token hash) is already taken
    #[error("{0}")]
    Conflict(String),

    /// A referenced parent record doesn't exist
    #[error("Referenced record does not exist: {0}")]
    MissingReference(String),

    /// Anything else the backend reports
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().map(str::to_string);

                if db_err.is_unique_violation() {
                    return match constraint.as_deref() {
                        Some(c) if c.contains("email") => {
                            StoreError::Conflict("Email already exists".to_string())
                        }
                        Some(c) if c.contains("username") => {
                            StoreError::Conflict("Username already exists".to_string())
                        }
                        Some(c) => StoreError::Conflict(format!("Constraint violation: {}", c)),
                        None => StoreError::Conflict("Duplicate value".to_string()),
                    };
                }

                if db_err.is_foreign_key_violation() {
                    return StoreError::MissingReference(
                        constraint.unwrap_or_else(|| "foreign key".to_string()),
                    );
                }

                StoreError::Database(db_err.to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Persistence operations used by the API
///
/// Lookups return `Ok(None)`/`Ok(false)` for missing records; errors are
/// reserved for conflicts and backend failures.
#[async_trait]
pub trait Store: Send + Sync {
    /// Checks backend connectivity
    async fn ping(&self) -> StoreResult<()>;

    // Users

    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Looks a user up by username or email, case-insensitively
    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>>;

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>>;

    /// Deletes a user with their contacts, addresses and refresh tokens
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    async fn mark_email_verified(&self, email: &str) -> StoreResult<bool>;

    // Contacts

    async fn create_contact(&self, user_id: Uuid, data: ContactFields) -> StoreResult<Contact>;

    async fn find_contact(&self, id: Uuid) -> StoreResult<Option<Contact>>;

    async fn list_contacts(&self, user_id: Uuid) -> StoreResult<Vec<Contact>>;

    async fn update_contact(&self, id: Uuid, data: ContactFields) -> StoreResult<Option<Contact>>;

    /// Deletes a contact with its addresses
    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool>;

    // Addresses

    async fn create_address(&self, contact_id: Uuid, data: AddressFields) -> StoreResult<Address>;

    async fn find_address(&self, id: Uuid) -> StoreResult<Option<Address>>;

    async fn list_addresses(&self, contact_id: Uuid) -> StoreResult<Vec<Address>>;

    async fn update_address(&self, id: Uuid, data: AddressFields) -> StoreResult<Option<Address>>;

    async fn delete_address(&self, id: Uuid) -> StoreResult<bool>;

    // Refresh tokens

    async fn store_refresh_token(&self, data: CreateRefreshToken) -> StoreResult<RefreshToken>;

    async fn find_refresh_token(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>>;

    /// Revokes a live token; false if it was unknown or already revoked
    async fn revoke_refresh_token(&self, id: Uuid) -> StoreResult<bool>;

    async fn purge_expired_refresh_tokens(&self, before: DateTime<Utc>) -> StoreResult<u64>;

    // Confirmation codes

    /// Stores a code, consuming any outstanding code for the same email
    async fn issue_confirmation_code(
        &self,
        data: CreateConfirmationCode,
    ) -> StoreResult<ConfirmationCode>;

    async fn find_outstanding_code(&self, email: &str) -> StoreResult<Option<ConfirmationCode>>;

    /// Marks a code used; false if it was already consumed
    async fn consume_confirmation_code(&self, id: Uuid) -> StoreResult<bool>;

    /// Claims one verification attempt, atomically with the attempt limit
    ///
    /// Returns the updated record, or `None` if the code is consumed or has
    /// no attempts left.
    async fn claim_code_attempt(&self, id: Uuid) -> StoreResult<Option<ConfirmationCode>>;

    /// Deletes codes that expired or were consumed before `before`
    async fn purge_expired_confirmation_codes(&self, before: DateTime<Utc>) -> StoreResult<u64>;
}
