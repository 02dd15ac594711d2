use crate::{error::AppError, web_server::AppState};
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session key under which the logged-in user is stored.
pub const SESSION_USER_KEY: &str = "user";

/// The user attached to the caller's session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // The session layer puts the Session in extensions. If it cannot be
        // extracted the layer is missing, which is a server bug.
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::InternalServerError(msg.into()))?;

        session
            .get::<AuthUser>(SESSION_USER_KEY)
            .await?
            .ok_or(AppError::Unauthenticated)
    }
}
