/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: per-user salts and Argon2id password hashing
/// - [`jwt`]: access token issuance and validation
/// - [`middleware`]: the gate turning an `Authorization` header into a user
/// - [`authorization`]: task ownership checks
///
/// # Example
///
/// ```no_run
/// use chrono::Utc;
/// use tasklist_shared::auth::jwt::{issue_token, parse_token};
/// use tasklist_shared::auth::password::{generate_salt, hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Password authentication
/// let salt = generate_salt();
/// let hash = hash_password(&salt, "user_password")?;
/// assert!(verify_password(&salt, "user_password", &hash)?);
///
/// // Token issuance
/// let secret = "secret-key-at-least-32-bytes-long!";
/// let token = issue_token("alice", secret, Utc::now())?;
/// assert_eq!(parse_token(&token, secret, Utc::now())?, "alice");
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
