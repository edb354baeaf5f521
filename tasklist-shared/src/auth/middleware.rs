/// Authorization gate
///
/// Turns the `Authorization` header of a request into an authenticated
/// [`User`], or refuses it. The expected header is
///
/// ```text
/// Authorization: Token <jwt>
/// ```
///
/// # Checks, in order
///
/// 1. The header is present and valid UTF-8
/// 2. It splits on the first space into a non-empty prefix and token
/// 3. The prefix is exactly [`JWT_TOKEN_PREFIX`]
/// 4. The token verifies (see [`super::jwt::parse_token`])
/// 5. The username in the token still exists in the credential store
///
/// Callers must not tell clients which step failed. Only
/// [`AuthError::Store`] is not a rejection: it means the credential store
/// could not be queried.
///
/// # Example
///
/// ```no_run
/// use axum::{http::HeaderMap, Extension};
/// use chrono::Utc;
/// use tasklist_shared::auth::middleware::{authenticate, CurrentUser};
/// use tasklist_shared::db::store::UserStore;
///
/// async fn check(headers: &HeaderMap, users: &dyn UserStore) {
///     match authenticate(headers, "secret", users, Utc::now()).await {
///         Ok(user) => println!("hello {}", user.username),
///         Err(e) => println!("rejected: {}", e),
///     }
/// }
///
/// async fn handler(Extension(CurrentUser(user)): Extension<CurrentUser>) -> String {
///     format!("User: {}", user.username)
/// }
/// ```

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};

use super::jwt::{parse_token, TokenError};
use crate::db::store::{StoreError, UserStore};
use crate::models::user::User;

/// Scheme word expected before the token in the `Authorization` header
pub const JWT_TOKEN_PREFIX: &str = "Token";

/// Why a request was not authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header, or it isn't valid UTF-8
    #[error("Missing authorization header")]
    MissingHeader,

    /// Header is not `<prefix> <token>`
    #[error("Invalid authorization header format")]
    InvalidFormat,

    /// Prefix is not "Token"
    #[error("Unsupported authorization type '{0}'")]
    WrongPrefix(String),

    /// Token failed verification
    #[error(transparent)]
    InvalidToken(#[from] TokenError),

    /// Token names a user that no longer exists
    #[error("User '{0}' does not exist")]
    UnknownUser(String),

    /// Credential store could not be queried
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Authenticated caller, added to request extensions by the gate
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Splits an `Authorization` value into its prefix and token
fn split_header(value: &str) -> Result<(&str, &str), AuthError> {
    match value.split_once(' ') {
        Some((prefix, token)) if !prefix.is_empty() && !token.is_empty() => Ok((prefix, token)),
        _ => Err(AuthError::InvalidFormat),
    }
}

/// Authenticates a request from its headers
///
/// # Errors
///
/// Returns the [`AuthError`] for the first check that fails
pub async fn authenticate(
    headers: &HeaderMap,
    secret: &str,
    users: &dyn UserStore,
    now: DateTime<Utc>,
) -> Result<User, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingHeader)?;

    let (prefix, token) = split_header(value)?;

    if prefix != JWT_TOKEN_PREFIX {
        return Err(AuthError::WrongPrefix(prefix.to_string()));
    }

    let username = parse_token(token, secret, now)?;

    users
        .find_by_username(&username)
        .await?
        .ok_or(AuthError::UnknownUser(username))
}
