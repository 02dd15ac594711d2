use anyhow::Context;
use mnemo_backend::{
    config::AppConfig,
    db,
    web_server::{run_server, AppState},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- Setup ---
    // 1. Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mnemo_backend=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Load configuration (Config.toml + APP_* environment)
    let app_config = AppConfig::from_env().context("failed to load configuration")?;

    // 3. Open the database and bootstrap the schema
    let db_pool = db::connect(&app_config.database)
        .await
        .with_context(|| format!("failed to open database at {}", app_config.database.url))?;
    db::migrate(&db_pool).await.context("failed to run migrations")?;

    let app_state = AppState::new(db_pool, app_config)?;

    // --- Run Server ---
    tracing::info!("Initializing server...");
    run_server(app_state).await.context("server error")?;

    Ok(())
}
