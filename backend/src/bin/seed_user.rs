//! Provisions a login for the API. There is no registration endpoint, so
//! this is the only way users get into the `user` table.

use anyhow::Context;
use clap::Parser;
use mnemo_backend::{
    auth::create_user,
    config::{AuthConfig, DatabaseConfig},
    db,
};

#[derive(Debug, Parser)]
#[command(about = "Insert a user with a bcrypt-hashed password")]
struct Args {
    #[arg(long)]
    email: String,

    /// Read from the environment when not given on the command line.
    #[arg(long, env = "SEED_USER_PASSWORD", hide_env_values = true)]
    password: String,

    #[arg(long, env = "APP_DATABASE__URL", default_value = "sqlite://coordinates.db")]
    database_url: String,

    /// bcrypt work factor. Defaults to `auth.bcrypt_cost` from Config.toml / APP_ env,
    /// so seeded hashes match what the server verifies against.
    #[arg(long)]
    cost: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let cost = match args.cost {
        Some(cost) => cost,
        None => {
            AuthConfig::from_env()
                .context("failed to load auth config")?
                .bcrypt_cost
        }
    };

    let config = DatabaseConfig {
        url: args.database_url,
        max_connections: 1,
    };
    let db_pool = db::connect(&config)
        .await
        .with_context(|| format!("failed to open database at {}", config.url))?;
    db::migrate(&db_pool).await.context("failed to run migrations")?;

    let id = create_user(&db_pool, &args.email, &args.password, cost)
        .await
        .map_err(|e| anyhow::anyhow!("failed to create user: {e}"))?;

    println!("Created user {} with id {}", args.email, id);
    Ok(())
}
