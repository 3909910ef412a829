//! # Contact Hub Shared Library
//!
//! Domain types, persistence and authentication primitives used by the
//! Contact Hub API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their SQL
//! - `store`: Persistence trait with PostgreSQL and in-memory backends
//! - `auth`: Password hashing, JWTs, refresh tokens, confirmation codes
//! - `db`: Connection pool and migrations
//! - `mail`: Outgoing email

pub mod auth;
pub mod db;
pub mod mail;
pub mod models;
pub mod store;

/// Current version of the Contact Hub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
