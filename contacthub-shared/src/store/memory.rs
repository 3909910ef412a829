/// In-memory [`Store`] for tests
///
/// Mirrors the PostgreSQL schema's behavior: case-insensitive unique emails
/// and usernames, foreign keys, and delete cascades.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::auth::confirmation::MAX_FAILED_ATTEMPTS;
use crate::models::{
    address::{Address, AddressFields},
    confirmation_code::{ConfirmationCode, CreateConfirmationCode},
    contact::{Contact, ContactFields},
    refresh_token::{CreateRefreshToken, RefreshToken},
    user::{CreateUser, UpdateUser, User},
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    contacts: Vec<Contact>,
    addresses: Vec<Address>,
    refresh_tokens: Vec<RefreshToken>,
    codes: Vec<ConfirmationCode>,
}

impl Tables {
    fn check_unique_user(&self, email: &str, username: &str, except: Option<Uuid>) -> StoreResult<()> {
        let others = self.users.iter().filter(|u| Some(u.id) != except);

        for user in others {
            if user.email.eq_ignore_ascii_case(email) {
                return Err(StoreError::Conflict("Email already exists".to_string()));
            }
            if user.username.eq_ignore_ascii_case(username) {
                return Err(StoreError::Conflict("Username already exists".to_string()));
            }
        }

        Ok(())
    }

    fn remove_contact_cascade(&mut self, contact_id: Uuid) {
        self.contacts.retain(|c| c.id != contact_id);
        self.addresses.retain(|a| a.contact_id != contact_id);
    }
}

/// Store keeping every table in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites a stored refresh token, e.g. to backdate its expiry
    pub async fn put_refresh_token(&self, token: RefreshToken) {
        let mut tables = self.tables.write().await;
        tables.refresh_tokens.retain(|t| t.id != token.id);
        tables.refresh_tokens.push(token);
    }

    /// Overwrites a stored confirmation code
    pub async fn put_confirmation_code(&self, code: ConfirmationCode) {
        let mut tables = self.tables.write().await;
        tables.codes.retain(|c| c.id != code.id);
        tables.codes.push(code);
    }

    /// Number of stored addresses across all contacts
    pub async fn address_count(&self) -> usize {
        self.tables.read().await.addresses.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        tables.check_unique_user(&data.email, &data.username, None)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            username: data.username,
            password_hash: data.password.hash,
            password_salt: data.password.salt,
            email_verified: false,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(login) || u.email.eq_ignore_ascii_case(login))
            .cloned())
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        tables.check_unique_user(&data.email, &data.username, Some(id))?;

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        user.email_verified = user.email_verified && user.email.eq_ignore_ascii_case(&data.email);
        user.first_name = data.first_name;
        user.last_name = data.last_name;
        user.email = data.email;
        user.username = data.username;
        if let Some(digest) = data.password {
            user.password_hash = digest.hash;
            user.password_salt = digest.salt;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }

        let owned: Vec<Uuid> = tables
            .contacts
            .iter()
            .filter(|c| c.user_id == id)
            .map(|c| c.id)
            .collect();
        for contact_id in owned {
            tables.remove_contact_cascade(contact_id);
        }
        tables.refresh_tokens.retain(|t| t.user_id != id);

        Ok(true)
    }

    async fn mark_email_verified(&self, email: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let mut updated = false;

        for user in tables.users.iter_mut().filter(|u| u.email.eq_ignore_ascii_case(email)) {
            user.email_verified = true;
            user.updated_at = Utc::now();
            updated = true;
        }

        Ok(updated)
    }

    async fn create_contact(&self, user_id: Uuid, data: ContactFields) -> StoreResult<Contact> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == user_id) {
            return Err(StoreError::MissingReference("contacts_user_id_fkey".to_string()));
        }

        let now = Utc::now();
        let contact = Contact {
            id: Uuid::new_v4(),
            user_id,
            first_name: data.first_name,
            last_name: data.last_name,
            phone_number: data.phone_number,
            email: data.email,
            created_at: now,
            updated_at: now,
        };
        tables.contacts.push(contact.clone());

        Ok(contact)
    }

    async fn find_contact(&self, id: Uuid) -> StoreResult<Option<Contact>> {
        let tables = self.tables.read().await;
        Ok(tables.contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn list_contacts(&self, user_id: Uuid) -> StoreResult<Vec<Contact>> {
        let tables = self.tables.read().await;
        let mut contacts: Vec<Contact> = tables
            .contacts
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        contacts.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.created_at).cmp(&(&b.last_name, &b.first_name, b.created_at))
        });

        Ok(contacts)
    }

    async fn update_contact(&self, id: Uuid, data: ContactFields) -> StoreResult<Option<Contact>> {
        let mut tables = self.tables.write().await;
        let Some(contact) = tables.contacts.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        contact.first_name = data.first_name;
        contact.last_name = data.last_name;
        contact.phone_number = data.phone_number;
        contact.email = data.email;
        contact.updated_at = Utc::now();

        Ok(Some(contact.clone()))
    }

    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.contacts.iter().any(|c| c.id == id) {
            return Ok(false);
        }
        tables.remove_contact_cascade(id);

        Ok(true)
    }

    async fn create_address(&self, contact_id: Uuid, data: AddressFields) -> StoreResult<Address> {
        let mut tables = self.tables.write().await;
        if !tables.contacts.iter().any(|c| c.id == contact_id) {
            return Err(StoreError::MissingReference("addresses_contact_id_fkey".to_string()));
        }

        let now = Utc::now();
        let address = Address {
            id: Uuid::new_v4(),
            contact_id,
            address_type: data.address_type,
            street: data.street,
            city: data.city,
            state: data.state,
            postal_code: data.postal_code,
            created_at: now,
            updated_at: now,
        };
        tables.addresses.push(address.clone());

        Ok(address)
    }

    async fn find_address(&self, id: Uuid) -> StoreResult<Option<Address>> {
        let tables = self.tables.read().await;
        Ok(tables.addresses.iter().find(|a| a.id == id).cloned())
    }

    async fn list_addresses(&self, contact_id: Uuid) -> StoreResult<Vec<Address>> {
        let tables = self.tables.read().await;
        Ok(tables
            .addresses
            .iter()
            .filter(|a| a.contact_id == contact_id)
            .cloned()
            .collect())
    }

    async fn update_address(&self, id: Uuid, data: AddressFields) -> StoreResult<Option<Address>> {
        let mut tables = self.tables.write().await;
        let Some(address) = tables.addresses.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };

        address.address_type = data.address_type;
        address.street = data.street;
        address.city = data.city;
        address.state = data.state;
        address.postal_code = data.postal_code;
        address.updated_at = Utc::now();

        Ok(Some(address.clone()))
    }

    async fn delete_address(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.addresses.len();
        tables.addresses.retain(|a| a.id != id);

        Ok(tables.addresses.len() < before)
    }

    async fn store_refresh_token(&self, data: CreateRefreshToken) -> StoreResult<RefreshToken> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == data.user_id) {
            return Err(StoreError::MissingReference("refresh_tokens_user_id_fkey".to_string()));
        }
        if tables.refresh_tokens.iter().any(|t| t.token_hash == data.token_hash) {
            return Err(StoreError::Conflict("Constraint violation: refresh_tokens_token_hash_key".to_string()));
        }

        let token = RefreshToken {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            token_hash: data.token_hash,
            created_at: Utc::now(),
            expires_at: data.expires_at,
            revoked_at: None,
        };
        tables.refresh_tokens.push(token.clone());

        Ok(token)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>> {
        let tables = self.tables.read().await;
        Ok(tables
            .refresh_tokens
            .iter()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn revoke_refresh_token(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .refresh_tokens
            .iter_mut()
            .find(|t| t.id == id && t.revoked_at.is_none())
        {
            Some(token) => {
                token.revoked_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn purge_expired_refresh_tokens(&self, before: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let count = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|t| t.expires_at >= before);

        Ok((count - tables.refresh_tokens.len()) as u64)
    }

    async fn issue_confirmation_code(
        &self,
        data: CreateConfirmationCode,
    ) -> StoreResult<ConfirmationCode> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        for code in tables
            .codes
            .iter_mut()
            .filter(|c| c.email.eq_ignore_ascii_case(&data.email) && c.consumed_at.is_none())
        {
            code.consumed_at = Some(now);
        }

        let code = ConfirmationCode {
            id: Uuid::new_v4(),
            email: data.email,
            code_hash: data.code_hash,
            created_at: now,
            expires_at: data.expires_at,
            consumed_at: None,
            failed_attempts: 0,
        };
        tables.codes.push(code.clone());

        Ok(code)
    }

    async fn find_outstanding_code(&self, email: &str) -> StoreResult<Option<ConfirmationCode>> {
        let tables = self.tables.read().await;
        Ok(tables
            .codes
            .iter()
            .rev()
            .find(|c| c.email.eq_ignore_ascii_case(email) && c.consumed_at.is_none())
            .cloned())
    }

    async fn consume_confirmation_code(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .codes
            .iter_mut()
            .find(|c| c.id == id && c.consumed_at.is_none())
        {
            Some(code) => {
                code.consumed_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn claim_code_attempt(&self, id: Uuid) -> StoreResult<Option<ConfirmationCode>> {
        let mut tables = self.tables.write().await;
        let claimed = tables
            .codes
            .iter_mut()
            .find(|c| {
                c.id == id && c.consumed_at.is_none() && c.failed_attempts < MAX_FAILED_ATTEMPTS
            })
            .map(|code| {
                code.failed_attempts += 1;
                code.clone()
            });

        Ok(claimed)
    }

    async fn purge_expired_confirmation_codes(&self, before: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let count = tables.codes.len();
        tables
            .codes
            .retain(|c| c.expires_at >= before && c.consumed_at.map_or(true, |at| at >= before));

        Ok((count - tables.codes.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::models::address::AddressType;
    use chrono::Duration;

    fn new_user(email: &str, username: &str) -> CreateUser {
        CreateUser {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            username: username.to_string(),
            password: hash_password("Passw0rd").unwrap(),
        }
    }

    fn contact_fields(first_name: &str) -> ContactFields {
        ContactFields {
            first_name: first_name.to_string(),
            last_name: "Babbage".to_string(),
            phone_number: "+44 20 7946 0000".to_string(),
            email: None,
        }
    }

    fn address_fields() -> AddressFields {
        AddressFields {
            address_type: AddressType::Home,
            street: "1 Dorset Street".to_string(),
            city: "London".to_string(),
            state: "Greater London".to_string(),
            postal_code: "W1U 6QE".to_string(),
        }
    }

    #[tokio::test]
    async fn test_user_uniqueness_is_case_insensitive() {
        let store = MemoryStore::new();
        store.create_user(new_user("ada@example.com", "ada")).await.unwrap();

        let email_clash = store.create_user(new_user("ADA@example.com", "other")).await;
        assert!(matches!(email_clash, Err(StoreError::Conflict(msg)) if msg.contains("Email")));

        let name_clash = store.create_user(new_user("other@example.com", "ADA")).await;
        assert!(matches!(name_clash, Err(StoreError::Conflict(msg)) if msg.contains("Username")));
    }

    #[tokio::test]
    async fn test_find_user_by_login() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("ada@example.com", "ada")).await.unwrap();

        let by_name = store.find_user_by_login("Ada").await.unwrap().unwrap();
        let by_email = store.find_user_by_login("ada@EXAMPLE.com").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_email.id, user.id);
        assert!(store.find_user_by_login("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_contact_cascades_to_addresses() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("ada@example.com", "ada")).await.unwrap();
        let contact = store.create_contact(user.id, contact_fields("Charles")).await.unwrap();
        store.create_address(contact.id, address_fields()).await.unwrap();
        store.create_address(contact.id, address_fields()).await.unwrap();

        assert_eq!(store.address_count().await, 2);
        assert!(store.delete_contact(contact.id).await.unwrap());
        assert_eq!(store.address_count().await, 0);
        assert!(!store.delete_contact(contact.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("ada@example.com", "ada")).await.unwrap();
        let contact = store.create_contact(user.id, contact_fields("Charles")).await.unwrap();
        store.create_address(contact.id, address_fields()).await.unwrap();

        assert!(store.delete_user(user.id).await.unwrap());
        assert!(store.find_contact(contact.id).await.unwrap().is_none());
        assert_eq!(store.address_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_parent_is_rejected() {
        let store = MemoryStore::new();

        let contact = store.create_contact(Uuid::new_v4(), contact_fields("Charles")).await;
        assert!(matches!(contact, Err(StoreError::MissingReference(_))));

        let address = store.create_address(Uuid::new_v4(), address_fields()).await;
        assert!(matches!(address, Err(StoreError::MissingReference(_))));
    }

    #[tokio::test]
    async fn test_issue_code_supersedes_previous() {
        let store = MemoryStore::new();
        let expires_at = Utc::now() + Duration::minutes(10);

        let first = store
            .issue_confirmation_code(CreateConfirmationCode {
                email: "ada@example.com".to_string(),
                code_hash: "a".to_string(),
                expires_at,
            })
            .await
            .unwrap();
        let second = store
            .issue_confirmation_code(CreateConfirmationCode {
                email: "ADA@example.com".to_string(),
                code_hash: "b".to_string(),
                expires_at,
            })
            .await
            .unwrap();

        let outstanding = store.find_outstanding_code("ada@example.com").await.unwrap().unwrap();
        assert_eq!(outstanding.id, second.id);
        assert!(!store.consume_confirmation_code(first.id).await.unwrap());
        assert!(store.consume_confirmation_code(second.id).await.unwrap());
        assert!(store.find_outstanding_code("ada@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_refresh_token_once() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("ada@example.com", "ada")).await.unwrap();
        let token = store
            .store_refresh_token(CreateRefreshToken {
                user_id: user.id,
                token_hash: "hash".to_string(),
                expires_at: Utc::now() + Duration::days(7),
            })
            .await
            .unwrap();

        assert!(store.revoke_refresh_token(token.id).await.unwrap());
        assert!(!store.revoke_refresh_token(token.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_expired_refresh_tokens() {
        let store = MemoryStore::new();
        let user_id = store.create_user(new_user("ada@example.com", "ada")).await.unwrap().id;
        for (hash, offset) in [("old", -1), ("new", 1)] {
            store
                .store_refresh_token(CreateRefreshToken {
                    user_id,
                    token_hash: hash.to_string(),
                    expires_at: Utc::now() + Duration::days(offset),
                })
                .await
                .unwrap();
        }

        assert_eq!(store.purge_expired_refresh_tokens(Utc::now()).await.unwrap(), 1);
        assert!(store.find_refresh_token("old").await.unwrap().is_none());
        assert!(store.find_refresh_token("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_refresh_token_requires_user() {
        let store = MemoryStore::new();

        let result = store
            .store_refresh_token(CreateRefreshToken {
                user_id: Uuid::new_v4(),
                token_hash: "hash".to_string(),
                expires_at: Utc::now() + Duration::days(7),
            })
            .await;

        assert!(matches!(result, Err(StoreError::MissingReference(_))));
    }

    #[tokio::test]
    async fn test_concurrent_claims_capped() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let code = store
            .issue_confirmation_code(CreateConfirmationCode {
                email: "ada@example.com".to_string(),
                code_hash: "a".to_string(),
                expires_at: Utc::now() + Duration::minutes(10),
            })
            .await
            .unwrap();

        let id = code.id;
        let handles: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.claim_code_attempt(id).await.unwrap() })
            })
            .collect();

        let mut claimed = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                claimed += 1;
            }
        }

        assert_eq!(claimed, MAX_FAILED_ATTEMPTS);
        let record = store.find_outstanding_code("ada@example.com").await.unwrap().unwrap();
        assert_eq!(record.failed_attempts, MAX_FAILED_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_claim_skips_consumed_code() {
        let store = MemoryStore::new();
        let code = store
            .issue_confirmation_code(CreateConfirmationCode {
                email: "ada@example.com".to_string(),
                code_hash: "a".to_string(),
                expires_at: Utc::now() + Duration::minutes(10),
            })
            .await
            .unwrap();

        let claimed = store.claim_code_attempt(code.id).await.unwrap().unwrap();
        assert_eq!(claimed.failed_attempts, 1);

        store.consume_confirmation_code(code.id).await.unwrap();
        assert!(store.claim_code_attempt(code.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired_confirmation_codes() {
        let store = MemoryStore::new();
        for (email, offset) in [("old@example.com", -1), ("new@example.com", 10)] {
            store
                .issue_confirmation_code(CreateConfirmationCode {
                    email: email.to_string(),
                    code_hash: "a".to_string(),
                    expires_at: Utc::now() + Duration::minutes(offset),
                })
                .await
                .unwrap();
        }

        // Superseded, so consumed
        store
            .issue_confirmation_code(CreateConfirmationCode {
                email: "new@example.com".to_string(),
                code_hash: "b".to_string(),
                expires_at: Utc::now() + Duration::minutes(10),
            })
            .await
            .unwrap();

        let purged = store
            .purge_expired_confirmation_codes(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();

        assert_eq!(purged, 2);
        assert!(store.find_outstanding_code("old@example.com").await.unwrap().is_none());
        let live = store.find_outstanding_code("new@example.com").await.unwrap().unwrap();
        assert_eq!(live.code_hash, "b");
    }
}
