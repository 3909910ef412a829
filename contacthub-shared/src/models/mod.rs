/// Database models for Contact Hub
///
/// Each model owns its SQL. Route handlers reach them through the
/// [`crate::store::Store`] trait rather than calling these methods directly.
///
/// # Models
///
/// - `user`: User accounts and password material
/// - `contact`: Contacts owned by a user
/// - `address`: Addresses owned by a contact
/// - `refresh_token`: Issued refresh tokens (hashed)
/// - `confirmation_code`: Emailed confirmation codes (hashed)

pub mod address;
pub mod confirmation_code;
pub mod contact;
pub mod refresh_token;
pub mod user;
