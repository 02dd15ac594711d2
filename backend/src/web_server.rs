use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use common::{
    Coordinates, CoordinatesPayload, CoordinatesResponse, Credentials, MeResponse,
    MessageResponse,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tower_sessions::{
    cookie::{Key, SameSite},
    ExpiredDeletion, Expiry, SessionManagerLayer,
};
use tower_sessions_sqlx_store::SqliteStore;
use utoipa::OpenApi;

use crate::config::{AppConfig, ConfigError};
use crate::db::DbPool;
use crate::{auth, coordinates};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub app_config: AppConfig,
    session_key: Key,
    cors_origin: HeaderValue,
    dummy_hash: Arc<str>,
}

impl AppState {
    pub fn new(db_pool: DbPool, app_config: AppConfig) -> Result<Self, ConfigError> {
        app_config.validate()?;
        let session_key = app_config.session.signing_key()?;
        let cors_origin = app_config.web.cors_origin_header()?;

        let cost = app_config.auth.bcrypt_cost;
        let dummy_hash = bcrypt::hash("mnemo-timing-equalizer", cost)
            .map_err(|_| ConfigError::InvalidBcryptCost(cost))?;

        Ok(Self {
            db_pool,
            app_config,
            session_key,
            cors_origin,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Verified against when the email is unknown, so a miss costs the same
    /// bcrypt round as a wrong password. Hashed at the configured cost.
    pub fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        auth::me,
        auth::logout,
        coordinates::submit_coordinates,
    ),
    components(schemas(
        Credentials,
        MessageResponse,
        MeResponse,
        Coordinates,
        CoordinatesPayload,
        CoordinatesResponse,
    )),
    tags(
        (name = "mnemo", description = "Session login and coordinate intake")
    )
)]
pub struct ApiDoc;

pub async fn run_server(app_state: AppState) -> std::io::Result<()> {
    spawn_session_cleanup(&app_state);

    let web = &app_state.app_config.web;
    let listener = tokio::net::TcpListener::bind((web.addr.as_str(), web.port)).await?;
    tracing::info!("Serving API at http://{}", listener.local_addr()?);

    let app = create_router(app_state);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

pub fn create_router(app_state: AppState) -> Router {
    let session_config = &app_state.app_config.session;
    let mut session_layer = SessionManagerLayer::new(SqliteStore::new(app_state.db_pool.clone()))
        .with_signed(app_state.session_key.clone())
        .with_name(session_config.cookie_name.clone())
        .with_secure(session_config.secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax);
    if let Some(minutes) = session_config.expiry_minutes {
        session_layer =
            session_layer.with_expiry(Expiry::OnInactivity(time::Duration::minutes(minutes)));
    }

    // Credentialed CORS needs an exact origin.
    let cors = CorsLayer::new()
        .allow_origin(app_state.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout));

    let api_routes = Router::new().route("/coordinates", post(coordinates::submit_coordinates));

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/api", api_routes)
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(app_state) // Provide state to all nested routes
        .layer(session_layer)
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Periodically removes expired sessions from the store.
fn spawn_session_cleanup(app_state: &AppState) {
    let store = SqliteStore::new(app_state.db_pool.clone());
    let period = Duration::from_secs(app_state.app_config.session.cleanup_interval_secs.max(1));

    tokio::task::spawn(async move {
        if let Err(e) = store.continuously_delete_expired(period).await {
            tracing::error!("Session cleanup task stopped: {}", e);
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
