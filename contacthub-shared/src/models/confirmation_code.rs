/// Confirmation code model and database operations
///
/// At most one outstanding code exists per email address: issuing a new code
/// consumes any earlier one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE confirmation_codes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL,
///     code_hash VARCHAR(64) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     expires_at TIMESTAMPTZ NOT NULL,
///     consumed_at TIMESTAMPTZ,
///     failed_attempts INTEGER NOT NULL DEFAULT 0
/// );
/// CREATE INDEX confirmation_codes_email_idx ON confirmation_codes (LOWER(email));
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Stored confirmation code
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConfirmationCode {
    pub id: Uuid,

    /// Address the code was mailed to
    pub email: String,

    /// SHA-256 hash of the 6-digit code
    pub code_hash: String,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    /// Set once verified or superseded
    pub consumed_at: Option<DateTime<Utc>>,

    /// Wrong guesses against this code
    pub failed_attempts: i32,
}

/// Input for issuing a code
#[derive(Debug, Clone)]
pub struct CreateConfirmationCode {
    pub email: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl ConfirmationCode {
    /// Issues a code, consuming any outstanding code for the same email
    pub async fn issue(pool: &PgPool, data: CreateConfirmationCode) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE confirmation_codes
            SET consumed_at = NOW()
            WHERE LOWER(email) = LOWER($1) AND consumed_at IS NULL
            "#,
        )
        .bind(&data.email)
        .execute(&mut *tx)
        .await?;

        let code = sqlx::query_as::<_, ConfirmationCode>(
            r#"
            INSERT INTO confirmation_codes (email, code_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, email, code_hash, created_at, expires_at, consumed_at, failed_attempts
            "#,
        )
        .bind(data.email)
        .bind(data.code_hash)
        .bind(data.expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(code)
    }

    /// Finds the outstanding (unconsumed) code for an email
    pub async fn find_outstanding(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ConfirmationCode>(
            r#"
            SELECT id, email, code_hash, created_at, expires_at, consumed_at, failed_attempts
            FROM confirmation_codes
            WHERE LOWER(email) = LOWER($1) AND consumed_at IS NULL
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Marks a code as used
    ///
    /// Returns false if it was already consumed.
    pub async fn consume(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE confirmation_codes
            SET consumed_at = NOW()
            WHERE id = $1 AND consumed_at IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Claims one verification attempt
    ///
    /// The increment and the limit check happen in one statement, so
    /// concurrent guesses can't exceed `max_attempts` between them. Returns
    /// `None` when the code is consumed or out of attempts.
    pub async fn claim_attempt(
        pool: &PgPool,
        id: Uuid,
        max_attempts: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ConfirmationCode>(
            r#"
            UPDATE confirmation_codes
            SET failed_attempts = failed_attempts + 1
            WHERE id = $1 AND consumed_at IS NULL AND failed_attempts < $2
            RETURNING id, email, code_hash, created_at, expires_at, consumed_at, failed_attempts
            "#,
        )
        .bind(id)
        .bind(max_attempts)
        .fetch_optional(pool)
        .await
    }

    /// Deletes codes that expired or were consumed before `before`
    pub async fn delete_expired(pool: &PgPool, before: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM confirmation_codes WHERE expires_at < $1 OR consumed_at < $1",
        )
        .bind(before)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
