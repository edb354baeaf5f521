/// Database models for Tasklist
///
/// # Models
///
/// - `user`: User accounts and credentials
/// - `task`: Tasks owned by a user
///
/// Each model carries its PostgreSQL queries as associated functions taking a
/// `&PgPool`. Request handlers never call these directly; they go through the
/// store traits in [`crate::db::store`], which pick a backend at startup.

pub mod task;
pub mod user;
