/// JWT access token issuance and validation
///
/// Tokens are HS256-signed and carry the username they were issued for.
/// They are stateless: nothing is stored server-side, so a token stays valid
/// until it expires even if the user changes their password.
///
/// # Claims
///
/// - `sub`: always [`JWT_SUBJECT`]
/// - `username`: the authenticated user
/// - `exp`: issue time + [`ACCESS_TOKEN_EXPIRE_MINUTES`] (Unix timestamp)
///
/// Both functions take the current time as an argument. Expiry is checked
/// against that clock rather than the system clock.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use tasklist_shared::auth::jwt::{issue_token, parse_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "your-secret-key-at-least-32-bytes";
/// let now = Utc::now();
///
/// let token = issue_token("alice", secret, now)?;
/// assert_eq!(parse_token(&token, secret, now)?, "alice");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Subject claim of every access token
pub const JWT_SUBJECT: &str = "access";

/// Signing algorithm
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// Lifetime of an access token
///
/// Counted in whole seconds from the second the token was issued in, since
/// `exp` is a Unix timestamp. A token issued at `12:00:00.9` stops working at
/// `12:30:00.0`.
pub const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Bad signature, bad structure, wrong subject, or expired
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Token verified but has no usable username claim
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

/// Claims written into issued tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    /// Subject, always "access"
    pub sub: String,

    /// Authenticated username
    pub username: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Claims for `username`, expiring 30 minutes after `now`
    pub fn new(username: &str, now: DateTime<Utc>) -> Self {
        Self {
            sub: JWT_SUBJECT.to_string(),
            username: username.to_string(),
            exp: now.timestamp() + Duration::minutes(ACCESS_TOKEN_EXPIRE_MINUTES).num_seconds(),
        }
    }
}

/// Claims as read back from a token; nothing but `exp` is trusted yet
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    username: Option<serde_json::Value>,
    exp: i64,
}

/// Issues an access token for `username`
///
/// # Errors
///
/// Returns `TokenError::CreateError` if encoding fails
pub fn issue_token(username: &str, secret: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
    let header = Header::new(ALGORITHM);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, &Claims::new(username, now), &key)
        .map_err(|e| TokenError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token and returns the username it was issued for
///
/// # Errors
///
/// - `TokenError::MalformedToken` if the signature or structure is invalid,
///   the subject is not "access", or `now` is at or past the expiry
/// - `TokenError::MalformedPayload` if the `username` claim is missing, not
///   a string, or empty
pub fn parse_token(token: &str, secret: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    // Expiry is checked below against `now`
    let mut validation = Validation::new(ALGORITHM);
    validation.validate_exp = false;

    let claims = decode::<RawClaims>(token, &key, &validation)
        .map_err(|e| TokenError::MalformedToken(format!("Token validation failed: {}", e)))?
        .claims;

    if claims.sub.as_deref() != Some(JWT_SUBJECT) {
        return Err(TokenError::MalformedToken("unexpected subject".to_string()));
    }

    if now.timestamp() >= claims.exp {
        return Err(TokenError::MalformedToken("token has expired".to_string()));
    }

    match claims.username {
        Some(serde_json::Value::String(username)) if !username.is_empty() => Ok(username),
        _ => Err(TokenError::MalformedPayload(
            "missing username claim".to_string(),
        )),
    }
}
