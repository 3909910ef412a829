/// Contact model and database operations
///
/// Contacts belong to exactly one user. Deleting a contact deletes its
/// addresses through the foreign key cascade.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE contacts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     phone_number VARCHAR(32) NOT NULL,
///     email VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE INDEX contacts_user_id_idx ON contacts (user_id);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A contact record owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    /// Unique contact ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    pub first_name: String,

    pub last_name: String,

    pub phone_number: String,

    pub email: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Contact fields supplied on create and on full replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFields {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: Option<String>,
}

impl Contact {
    /// Creates a contact for `user_id`
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if the user doesn't exist.
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        data: ContactFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (user_id, first_name, last_name, phone_number, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, first_name, last_name, phone_number, email,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.phone_number)
        .bind(data.email)
        .fetch_one(pool)
        .await
    }

    /// Finds a contact by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, user_id, first_name, last_name, phone_number, email,
                   created_at, updated_at
            FROM contacts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a user's contacts ordered by name
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, user_id, first_name, last_name, phone_number, email,
                   created_at, updated_at
            FROM contacts
            WHERE user_id = $1
            ORDER BY last_name, first_name, created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Replaces a contact's fields
    ///
    /// Returns `None` if the contact doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: ContactFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts
            SET first_name = $2, last_name = $3, phone_number = $4, email = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, first_name, last_name, phone_number, email,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.phone_number)
        .bind(data.email)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a contact and its addresses
    ///
    /// Returns true if the contact existed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
