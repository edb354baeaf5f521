//! # Tasklist Shared Library
//!
//! This crate contains the domain types, persistence layer and authentication
//! logic used by the Tasklist API server.
//!
//! ## Module Organization
//!
//! - `models`: Users and tasks, plus their PostgreSQL queries
//! - `db`: Connection pool, migrations and the store abstraction
//! - `auth`: Password hashing, tokens, the authorization gate and task ownership

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Tasklist shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
