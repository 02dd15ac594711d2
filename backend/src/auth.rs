use axum::{extract::rejection::JsonRejection, extract::State, Json};
use common::{utils::is_valid_email, Credentials, MeResponse, MessageResponse};
use tokio::task::spawn_blocking;
use tower_sessions::Session;

use crate::db::DbPool;
use crate::error::AppError;
use crate::extractors::{AuthUser, SESSION_USER_KEY};
use crate::web_server::AppState;

// --- User Struct ---

#[derive(sqlx::FromRow, Debug)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

// --- Password Hashing ---
// bcrypt is CPU-bound, so it runs on the blocking pool.

async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Password hashing task failed: {e}")))?
        .map_err(AppError::from)
}

async fn verify_password(password: String, password_hash: String) -> Result<bool, AppError> {
    spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Password check task failed: {e}")))?
        .map_err(AppError::from)
}

// --- Seeding ---

/// Hashes `password` and inserts a new user, returning its id.
///
/// Users are provisioned out of band (see the `seed-user` binary); no HTTP
/// route calls this.
pub async fn create_user(
    db_pool: &DbPool,
    email: &str,
    password: &str,
    cost: u32,
) -> Result<i64, AppError> {
    if !is_valid_email(email) {
        return Err(AppError::InvalidInput(format!("Invalid email address: {email}")));
    }
    if password.is_empty() {
        return Err(AppError::InvalidInput("Password must not be empty".to_string()));
    }

    let password_hash = hash_password(password.to_string(), cost).await?;

    let result = sqlx::query(r#"INSERT INTO "user" (email, password_hash) VALUES (?, ?)"#)
        .bind(email)
        .bind(&password_hash)
        .execute(db_pool)
        .await;

    match result {
        Ok(done) => {
            tracing::info!("Created user with email: {}", email);
            Ok(done.last_insert_rowid())
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
            "User with this email already exists".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

// --- API Handlers ---

/// ## Login an existing user
/// Verifies email and password and attaches the user to the caller's session.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Login successful", body = MessageResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    // An unreadable body is treated like missing fields.
    let Ok(Json(payload)) = payload else {
        tracing::warn!("Rejected login with an unreadable body");
        return Err(AppError::Unauthorized);
    };
    if payload.email.is_empty() || payload.password.is_empty() {
        tracing::warn!("Rejected login with missing credentials");
        return Err(AppError::Unauthorized);
    }

    tracing::debug!(email = %payload.email, "Login attempt");
    let user: Option<User> = sqlx::query_as::<_, User>(
        r#"SELECT id, email, password_hash FROM "user" WHERE email = ?"#,
    )
    .bind(&payload.email)
    .fetch_optional(&state.db_pool)
    .await?;

    let Some(user) = user else {
        let _ = verify_password(payload.password, state.dummy_hash().to_string()).await;
        tracing::warn!("Login failed");
        return Err(AppError::Unauthorized);
    };

    if !verify_password(payload.password, user.password_hash).await? {
        tracing::warn!("Login failed");
        return Err(AppError::Unauthorized);
    }

    tracing::debug!(user_id = user.id, "Login succeeded");
    // New id on privilege change so a planted cookie cannot ride the login.
    session.cycle_id().await?;
    session
        .insert(
            SESSION_USER_KEY,
            AuthUser {
                id: user.id,
                email: user.email,
            },
        )
        .await?;

    Ok(Json(MessageResponse::new("Logged in")))
}

/// ## Current user
/// Reports the email attached to the caller's session.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Caller is logged in", body = MeResponse),
        (status = 401, description = "No active session")
    )
)]
pub async fn me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        logged_in: true,
        email: user.email,
    })
}

// --- Logout Handler ---
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse)
    )
)]
pub async fn logout(session: Session) -> Result<Json<MessageResponse>, AppError> {
    // Flushing an empty session is a no-op, so logout is idempotent.
    session.flush().await?;

    Ok(Json(MessageResponse::new("Logged out")))
}
