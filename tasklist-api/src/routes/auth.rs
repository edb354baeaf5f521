/// Authentication endpoints
///
/// This module provides the public account endpoints:
/// - Registration
/// - Login
///
/// Both answer with the user and a fresh access token:
///
/// ```json
/// { "user": { "username": "alice", "email": "alice@example.com", "token": "eyJ..." } }
/// ```
///
/// # Endpoints
///
/// - `POST /register` - Register new user
/// - `POST /login` - Exchange username and password for a token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tasklist_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User},
};
use tracing::info;
use validator::Validate;

/// Message for any failed login; does not say which part was wrong
const INVALID_CREDENTIALS: &str = "Incorrect username or password";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Unique username
    #[validate(length(min = 1, max = 64, message = "Username must be 1 to 64 characters"))]
    pub username: String,

    /// Email address
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    /// Plaintext password
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username must not be empty"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

/// User with an access token
#[derive(Debug, Serialize, Deserialize)]
pub struct UserWithToken {
    pub username: String,
    pub email: String,
    pub token: String,
}

/// Body of every account response
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: UserWithToken,
}

impl UserResponse {
    /// Wraps `user` together with a token issued now
    pub fn issue(user: User, secret: &str) -> ApiResult<Self> {
        let token = jwt::issue_token(&user.username, secret, Utc::now())?;

        Ok(Self {
            user: UserWithToken {
                username: user.username,
                email: user.email,
                token,
            },
        })
    }
}

/// Generates a new salt and hashes `plaintext` with it
///
/// Argon2 is CPU- and memory-heavy, so it runs on the blocking pool.
pub(crate) async fn new_credentials(plaintext: String) -> ApiResult<(String, String)> {
    let result = tokio::task::spawn_blocking(move || {
        let salt = password::generate_salt();
        password::hash_password(&salt, &plaintext).map(|hash| (salt, hash))
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("Password hashing task failed: {}", e)))?;

    Ok(result?)
}

async fn check_password(user: &User, plaintext: String) -> ApiResult<bool> {
    let salt = user.salt.clone();
    let hash = user.hashed_password.clone();

    let result = tokio::task::spawn_blocking(move || {
        password::verify_password(&salt, &plaintext, &hash)
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("Password check task failed: {}", e)))?;

    Ok(result?)
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "hunter2"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Username or email already taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let users = state.stores.users.as_ref();

    if users.find_by_username(&req.username).await?.is_some() {
        return Err(ApiError::BadRequest(
            "User with this username already exists".to_string(),
        ));
    }
    if users.find_by_email(&req.email).await?.is_some() {
        return Err(ApiError::BadRequest(
            "User with this email already exists".to_string(),
        ));
    }

    let (salt, hashed_password) = new_credentials(req.password).await?;

    // Still fails with a duplicate if another registration won the race
    let user = users
        .create(CreateUser {
            username: req.username,
            email: req.email,
            salt,
            hashed_password,
        })
        .await?;

    info!(username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::issue(user, state.jwt_secret())?),
    ))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "hunter2"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Unknown username or wrong password
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .stores
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::BadRequest(INVALID_CREDENTIALS.to_string()))?;

    if !check_password(&user, req.password).await? {
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    info!(username = %user.username, "User logged in");

    Ok(Json(UserResponse::issue(user, state.jwt_secret())?))
}
