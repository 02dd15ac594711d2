// backend/tests/helpers.rs
#![allow(dead_code)]

use mnemo_backend::{
    auth::create_user,
    config::{AppConfig, AuthConfig, DatabaseConfig, SessionConfig, WebConfig},
    db,
    web_server::AppState,
};
use once_cell::sync::Lazy;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use tokio::net::TcpListener;

pub const TEST_EMAIL: &str = "test@example.com";
pub const TEST_PASSWORD: &str = "password123";
pub const TEST_ORIGIN: &str = "http://localhost:5173";

// Cheapest bcrypt work factor, tests only.
pub const TEST_BCRYPT_COST: u32 = 4;

static TRACING: Lazy<()> = Lazy::new(|| {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer();
    subscriber.init();
});

pub fn test_config(port: u16) -> AppConfig {
    let mut session = SessionConfig::new("test-secret-".repeat(8));
    // The test client talks plain http.
    session.secure = false;

    AppConfig {
        web: WebConfig {
            addr: "127.0.0.1".to_string(),
            port,
            cors_origin: TEST_ORIGIN.to_string(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        session,
        auth: AuthConfig {
            bcrypt_cost: TEST_BCRYPT_COST,
        },
    }
}

/// An in-memory database with the schema applied. A single connection
/// keeps every query on the same in-memory database.
pub async fn test_pool() -> SqlitePool {
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await
        .expect("Failed to create in-memory database pool.");

    db::migrate(&db_pool)
        .await
        .expect("Failed to run migrations on test database.");

    db_pool
}

/// Router state over a fresh in-memory database.
pub async fn test_state() -> AppState {
    Lazy::force(&TRACING);
    AppState::new(test_pool().await, test_config(0)).expect("test config is valid")
}

/// Spawn a test server and return the address, a cookie-keeping client and the pool.
pub async fn spawn_app() -> (SocketAddr, reqwest::Client, SqlitePool) {
    spawn_app_with_cost(TEST_BCRYPT_COST).await
}

/// Like [`spawn_app`], with the server's bcrypt cost set to `bcrypt_cost`.
pub async fn spawn_app_with_cost(bcrypt_cost: u32) -> (SocketAddr, reqwest::Client, SqlitePool) {
    Lazy::force(&TRACING);

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let db_pool = test_pool().await;
    let mut config = test_config(addr.port());
    config.auth.bcrypt_cost = bcrypt_cost;
    let app_state = AppState::new(db_pool.clone(), config).expect("test config is valid");
    let app = mnemo_backend::web_server::create_router(app_state);

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .unwrap();
    });

    (addr, cookie_client(), db_pool)
}

/// A fresh client with its own cookie jar, i.e. a separate browser.
pub fn cookie_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Seeds the default test user and returns its id.
pub async fn seed_user(db_pool: &SqlitePool) -> i64 {
    create_user(db_pool, TEST_EMAIL, TEST_PASSWORD, TEST_BCRYPT_COST)
        .await
        .expect("Failed to seed test user")
}

pub async fn location_count(db_pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM location")
        .fetch_one(db_pool)
        .await
        .expect("Failed to count locations")
}

pub async fn locations(db_pool: &SqlitePool) -> Vec<common::Location> {
    sqlx::query_as::<_, common::Location>(
        "SELECT id, latitude, longitude, suburban_area, council_area FROM location",
    )
    .fetch_all(db_pool)
    .await
    .expect("Failed to read locations")
}
