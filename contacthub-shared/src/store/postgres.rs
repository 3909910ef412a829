/// PostgreSQL-backed [`Store`]
///
/// A thin adapter over the model methods; the pool is cheap to clone.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreResult};
use crate::auth::confirmation::MAX_FAILED_ATTEMPTS;
use crate::db::pool::health_check;
use crate::models::{
    address::{Address, AddressFields},
    confirmation_code::{ConfirmationCode, CreateConfirmationCode},
    contact::{Contact, ContactFields},
    refresh_token::{CreateRefreshToken, RefreshToken},
    user::{CreateUser, UpdateUser, User},
};

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_login(&self.pool, login).await?)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        Ok(User::update(&self.pool, id, data).await?)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        Ok(User::delete(&self.pool, id).await?)
    }

    async fn mark_email_verified(&self, email: &str) -> StoreResult<bool> {
        Ok(User::mark_email_verified(&self.pool, email).await?)
    }

    async fn create_contact(&self, user_id: Uuid, data: ContactFields) -> StoreResult<Contact> {
        Ok(Contact::create(&self.pool, user_id, data).await?)
    }

    async fn find_contact(&self, id: Uuid) -> StoreResult<Option<Contact>> {
        Ok(Contact::find_by_id(&self.pool, id).await?)
    }

    async fn list_contacts(&self, user_id: Uuid) -> StoreResult<Vec<Contact>> {
        Ok(Contact::list_by_user(&self.pool, user_id).await?)
    }

    async fn update_contact(&self, id: Uuid, data: ContactFields) -> StoreResult<Option<Contact>> {
        Ok(Contact::update(&self.pool, id, data).await?)
    }

    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Contact::delete(&self.pool, id).await?)
    }

    async fn create_address(&self, contact_id: Uuid, data: AddressFields) -> StoreResult<Address> {
        Ok(Address::create(&self.pool, contact_id, data).await?)
    }

    async fn find_address(&self, id: Uuid) -> StoreResult<Option<Address>> {
        Ok(Address::find_by_id(&self.pool, id).await?)
    }

    async fn list_addresses(&self, contact_id: Uuid) -> StoreResult<Vec<Address>> {
        Ok(Address::list_by_contact(&self.pool, contact_id).await?)
    }

    async fn update_address(&self, id: Uuid, data: AddressFields) -> StoreResult<Option<Address>> {
        Ok(Address::update(&self.pool, id, data).await?)
    }

    async fn delete_address(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Address::delete(&self.pool, id).await?)
    }

    async fn store_refresh_token(&self, data: CreateRefreshToken) -> StoreResult<RefreshToken> {
        Ok(RefreshToken::create(&self.pool, data).await?)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>> {
        Ok(RefreshToken::find_by_hash(&self.pool, token_hash).await?)
    }

    async fn revoke_refresh_token(&self, id: Uuid) -> StoreResult<bool> {
        Ok(RefreshToken::revoke(&self.pool, id).await?)
    }

    async fn purge_expired_refresh_tokens(&self, before: DateTime<Utc>) -> StoreResult<u64> {
        Ok(RefreshToken::delete_expired(&self.pool, before).await?)
    }

    async fn issue_confirmation_code(
        &self,
        data: CreateConfirmationCode,
    ) -> StoreResult<ConfirmationCode> {
        Ok(ConfirmationCode::issue(&self.pool, data).await?)
    }

    async fn find_outstanding_code(&self, email: &str) -> StoreResult<Option<ConfirmationCode>> {
        Ok(ConfirmationCode::find_outstanding(&self.pool, email).await?)
    }

    async fn consume_confirmation_code(&self, id: Uuid) -> StoreResult<bool> {
        Ok(ConfirmationCode::consume(&self.pool, id).await?)
    }

    async fn claim_code_attempt(&self, id: Uuid) -> StoreResult<Option<ConfirmationCode>> {
        Ok(ConfirmationCode::claim_attempt(&self.pool, id, MAX_FAILED_ATTEMPTS).await?)
    }

    async fn purge_expired_confirmation_codes(&self, before: DateTime<Utc>) -> StoreResult<u64> {
        Ok(ConfirmationCode::delete_expired(&self.pool, before).await?)
    }
}
