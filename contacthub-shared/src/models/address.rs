/// Address model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE address_type AS ENUM ('home', 'work', 'billing', 'shipping', 'other');
///
/// CREATE TABLE addresses (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     contact_id UUID NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
///     address_type address_type NOT NULL,
///     street VARCHAR(255) NOT NULL,
///     city VARCHAR(100) NOT NULL,
///     state VARCHAR(100) NOT NULL,
///     postal_code VARCHAR(20) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE INDEX addresses_contact_id_idx ON addresses (contact_id);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "address_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    Home,
    Work,
    Billing,
    Shipping,
    Other,
}

impl AddressType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressType::Home => "home",
            AddressType::Work => "work",
            AddressType::Billing => "billing",
            AddressType::Shipping => "shipping",
            AddressType::Other => "other",
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(AddressType::Home),
            "work" => Ok(AddressType::Work),
            "billing" => Ok(AddressType::Billing),
            "shipping" => Ok(AddressType::Shipping),
            "other" => Ok(AddressType::Other),
            other => Err(format!("Unknown address type: {}", other)),
        }
    }
}

/// A postal address attached to a contact
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    /// Unique address ID
    pub id: Uuid,

    /// Owning contact
    pub contact_id: Uuid,

    pub address_type: AddressType,

    pub street: String,

    pub city: String,

    pub state: String,

    pub postal_code: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Address fields supplied on create and on full replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFields {
    pub address_type: AddressType,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl Address {
    /// Creates an address for `contact_id`
    pub async fn create(
        pool: &PgPool,
        contact_id: Uuid,
        data: AddressFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Address>(
            r#"
            INSERT INTO addresses (contact_id, address_type, street, city, state, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, contact_id, address_type, street, city, state, postal_code,
                      created_at, updated_at
            "#,
        )
        .bind(contact_id)
        .bind(data.address_type)
        .bind(data.street)
        .bind(data.city)
        .bind(data.state)
        .bind(data.postal_code)
        .fetch_one(pool)
        .await
    }

    /// Finds an address by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Address>(
            r#"
            SELECT id, contact_id, address_type, street, city, state, postal_code,
                   created_at, updated_at
            FROM addresses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists the addresses of a contact, oldest first
    pub async fn list_by_contact(
        pool: &PgPool,
        contact_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Address>(
            r#"
            SELECT id, contact_id, address_type, street, city, state, postal_code,
                   created_at, updated_at
            FROM addresses
            WHERE contact_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(contact_id)
        .fetch_all(pool)
        .await
    }

    /// Replaces an address's fields
    ///
    /// Returns `None` if the address doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: AddressFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Address>(
            r#"
            UPDATE addresses
            SET address_type = $2, street = $3, city = $4, state = $5, postal_code = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, contact_id, address_type, street, city, state, postal_code,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.address_type)
        .bind(data.street)
        .bind(data.city)
        .bind(data.state)
        .bind(data.postal_code)
        .fetch_optional(pool)
        .await
    }

    /// Deletes an address
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_type_parse() {
        assert_eq!("home".parse::<AddressType>(), Ok(AddressType::Home));
        assert_eq!(" Work ".parse::<AddressType>(), Ok(AddressType::Work));
        assert!("castle".parse::<AddressType>().is_err());
    }

    #[test]
    fn test_address_type_display_matches_serde() {
        for kind in [
            AddressType::Home,
            AddressType::Work,
            AddressType::Billing,
            AddressType::Shipping,
            AddressType::Other,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.to_string());
        }
    }
}
