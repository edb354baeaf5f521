/// Authentication layer for protected routes
///
/// Runs the authorization gate before the handler (and before its body is
/// parsed). On success the caller is inserted into request extensions as
/// [`CurrentUser`]; on any rejection the request ends with the same 403 body
/// no matter which check failed.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tasklist_shared::auth::middleware::{authenticate, AuthError, CurrentUser};
use tracing::debug;

use crate::{app::AppState, error::ApiError};

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(err) => err.into(),
            rejection => {
                debug!(reason = %rejection, "Rejected credentials");
                ApiError::credentials_rejected()
            }
        }
    }
}

/// Middleware requiring a valid `Authorization: Token <jwt>` header
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(
        req.headers(),
        state.jwt_secret(),
        state.stores.users.as_ref(),
        Utc::now(),
    )
    .await?;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
