/// Profile endpoints for the authenticated user
///
/// # Endpoints
///
/// - `GET /user` - Current user with a fresh token
/// - `PUT /user` - Change username, email and/or password
/// - `DELETE /user` - Withdraw; the user's tasks are deleted with them

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
    routes::auth::{new_credentials, UserResponse},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use tasklist_shared::{auth::middleware::CurrentUser, models::user::UpdateUser};
use tracing::info;
use validator::Validate;

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 64, message = "Username must be 1 to 64 characters"))]
    pub username: Option<String>,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,

    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: Option<String>,
}

/// Get the current user
///
/// The response carries a newly issued token.
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(UserResponse::issue(user, state.jwt_secret())?))
}

/// Update the current user
///
/// A new password gets a new salt. After a rename, tokens issued for the
/// old username stop working; use the token in the response.
///
/// # Errors
///
/// - `400 Bad Request`: Username or email taken by another user
/// - `403 Forbidden`: Not authenticated
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_current_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let users = state.stores.users.as_ref();

    // Unchanged values are dropped so they don't collide with the caller
    let username = req.username.filter(|u| *u != user.username);
    let email = req.email.filter(|e| *e != user.email);

    if let Some(username) = &username {
        if users.find_by_username(username).await?.is_some() {
            return Err(ApiError::BadRequest(
                "User with this username already exists".to_string(),
            ));
        }
    }
    if let Some(email) = &email {
        if users.find_by_email(email).await?.is_some() {
            return Err(ApiError::BadRequest(
                "User with this email already exists".to_string(),
            ));
        }
    }

    let (salt, hashed_password) = match req.password {
        Some(password) => {
            let (salt, hash) = new_credentials(password).await?;
            (Some(salt), Some(hash))
        }
        None => (None, None),
    };

    let changes = UpdateUser {
        username,
        email,
        salt,
        hashed_password,
    };
    let changed_fields = !changes.is_empty();

    let updated = users
        .update(&user.username, changes)
        .await?
        .ok_or_else(ApiError::credentials_rejected)?;

    if changed_fields {
        info!(username = %user.username, new_username = %updated.username, "User updated");
    }

    Ok(Json(UserResponse::issue(updated, state.jwt_secret())?))
}

/// Withdraw the current user
///
/// Deletes the account and every task it owns.
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<StatusCode> {
    if !state.stores.users.delete(&user.username).await? {
        return Err(ApiError::credentials_rejected());
    }

    info!(username = %user.username, "User withdrew");
    Ok(StatusCode::NO_CONTENT)
}
