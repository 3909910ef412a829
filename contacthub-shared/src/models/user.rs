/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     username VARCHAR(50) NOT NULL,
///     password_hash BYTEA NOT NULL,
///     password_salt BYTEA NOT NULL,
///     email_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX users_email_lower_idx ON users (LOWER(email));
/// CREATE UNIQUE INDEX users_username_lower_idx ON users (LOWER(username));
/// ```
///
/// # Example
///
/// ```no_run
/// use contacthub_shared::auth::password::hash_password;
/// use contacthub_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create(&pool, CreateUser {
///     first_name: "Ada".to_string(),
///     last_name: "Lovelace".to_string(),
///     email: "ada@example.com".to_string(),
///     username: "ada".to_string(),
///     password: hash_password("Analytical1")?,
/// }).await?;
///
/// let found = User::find_by_login(&pool, "ADA@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::jwt::Identity;
use crate::auth::password::PasswordDigest;

const USER_COLUMNS: &str = "id, first_name, last_name, email, username, password_hash, \
                            password_salt, email_verified, created_at, updated_at";

/// User account
///
/// Password material is an HMAC-SHA512 digest and the key it was computed
/// with. Neither is ever serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Email address, unique case-insensitively
    pub email: String,

    /// Login name, unique case-insensitively
    pub username: String,

    /// HMAC-SHA512 digest of the password
    #[serde(skip_serializing, default)]
    pub password_hash: Vec<u8>,

    /// HMAC key used for `password_hash`
    #[serde(skip_serializing, default)]
    pub password_salt: Vec<u8>,

    /// Set once a confirmation code sent to `email` has been verified
    pub email_verified: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: PasswordDigest,
}

/// Full replacement of a user's profile
///
/// `password` is only replaced when present.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: Option<PasswordDigest>,
}

impl User {
    /// "First Last", as carried in the access token `name` claim
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Identity to embed in an access token
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            name: self.full_name(),
            email: self.email.clone(),
            username: self.username.clone(),
        }
    }

    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns a database error carrying the violated index name when the email
    /// or username is already taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (first_name, last_name, email, username, password_hash, password_salt) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.email)
            .bind(data.username)
            .bind(data.password.hash)
            .bind(data.password.salt)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by username or email (case-insensitive)
    pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1) \
             LIMIT 1"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(login)
            .fetch_optional(pool)
            .await
    }

    /// Replaces a user's profile
    ///
    /// Returns `None` if the user doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let (hash, salt) = match data.password {
            Some(digest) => (Some(digest.hash), Some(digest.salt)),
            None => (None, None),
        };

        let query = format!(
            "UPDATE users SET \
                 first_name = $2, last_name = $3, email = $4, username = $5, \
                 password_hash = COALESCE($6, password_hash), \
                 password_salt = COALESCE($7, password_salt), \
                 email_verified = email_verified AND LOWER(email) = LOWER($4), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.email)
            .bind(data.username)
            .bind(hash)
            .bind(salt)
            .fetch_optional(pool)
            .await
    }

    /// Marks every account registered with `email` as verified
    ///
    /// Returns true if an account was updated.
    pub async fn mark_email_verified(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email_verified = TRUE, updated_at = NOW()
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user, cascading to contacts, addresses and refresh tokens
    ///
    /// Returns true if the user existed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
