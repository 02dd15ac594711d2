use axum::http::HeaderValue;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use thiserror::Error;
use tower_sessions::cookie::Key;

use dotenvy::dotenv;

/// Minimum secret length accepted for signing session cookies.
pub const MIN_SECRET_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Session secret must be at least 64 bytes, got {0}")]
    SecretTooShort(usize),

    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),

    #[error("Session expiry must be at least 1 minute, got {0}")]
    InvalidSessionExpiry(i64),

    #[error("bcrypt cost must be between 4 and 31, got {0}")]
    InvalidBcryptCost(u32),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Figment(Box::new(e))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl WebConfig {
    pub fn cors_origin_header(&self) -> Result<HeaderValue, ConfigError> {
        HeaderValue::from_str(&self.cors_origin)
            .map_err(|_| ConfigError::InvalidCorsOrigin(self.cors_origin.clone()))
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct SessionConfig {
    pub secret: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_secure")]
    pub secure: bool,
    /// Inactivity timeout. When unset the cookie lives for the browser
    /// session and the store applies its own default lifetime.
    #[serde(default)]
    pub expiry_minutes: Option<i64>,
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl SessionConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            cookie_name: default_cookie_name(),
            secure: default_secure(),
            expiry_minutes: None,
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }

    /// Derives the cookie signing key from the configured secret.
    pub fn signing_key(&self) -> Result<Key, ConfigError> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort(self.secret.len()));
        }
        Key::try_from(self.secret.as_bytes())
            .map_err(|_| ConfigError::SecretTooShort(self.secret.len()))
    }

    pub fn check_expiry(&self) -> Result<(), ConfigError> {
        match self.expiry_minutes {
            Some(minutes) if minutes < 1 => Err(ConfigError::InvalidSessionExpiry(minutes)),
            _ => Ok(()),
        }
    }
}

// The secret never ends up in logs.
impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("cookie_name", &self.cookie_name)
            .field("secure", &self.secure)
            .field("expiry_minutes", &self.expiry_minutes)
            .field("cleanup_interval_secs", &self.cleanup_interval_secs)
            .finish()
    }
}

// The range bcrypt accepts.
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    /// Loads only the `[auth]` section, for tools that do not need a
    /// session secret.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let config = match AppConfig::figment().extract_inner::<AuthConfig>("auth") {
            Ok(config) => config,
            Err(e) if e.missing() => AuthConfig::default(),
            Err(e) => return Err(e.into()),
        };
        config.check_cost()?;
        Ok(config)
    }

    pub fn check_cost(&self) -> Result<(), ConfigError> {
        if (MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            Ok(())
        } else {
            Err(ConfigError::InvalidBcryptCost(self.bcrypt_cost))
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let config = Self::from_figment(Self::figment())?;

        tracing::info!("Configuration loaded successfully, full config: {:?}", config);

        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks everything extraction alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.signing_key()?;
        self.session.check_expiry()?;
        self.web.cors_origin_header()?;
        self.auth.check_cost()
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file("Config.toml")) // For non-sensitive defaults
            .merge(Env::prefixed("APP_").split("__")) // e.g., APP_DATABASE__URL
    }
}

fn default_database_url() -> String {
    "sqlite://coordinates.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_cookie_name() -> String {
    "mnemo_session".to_string()
}

fn default_secure() -> bool {
    true
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}
