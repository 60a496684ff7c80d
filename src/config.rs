use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Authentication mode for the application.
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// No authentication required; every visitor gets an admin session.
    Unauthenticated,
    /// Shared admin secret, stored as an Argon2 hash.
    Password(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub migrations_path: PathBuf,
    pub static_path: PathBuf,
    pub auth_mode: AuthMode,
    pub currency: String,
    pub locale: String,
    pub session_ttl_hours: i64,
}

/// The magic value that disables authentication.
pub const UNAUTHENTICATED_MAGIC: &str = "DANGEROUSLY_ALLOW_UNAUTHENTICATED_USERS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "DISHDASH_PASSWORD_HASH is not set. Set a valid Argon2 hash \
         (see `dish-dash hash-password`) or '{magic}' to explicitly allow unauthenticated access.",
        magic = UNAUTHENTICATED_MAGIC
    )]
    MissingPasswordHash,

    #[error(
        "Invalid DISHDASH_PASSWORD_HASH: must start with '$argon2id$' or be '{magic}'. Got: {0}...",
        magic = UNAUTHENTICATED_MAGIC
    )]
    InvalidPasswordHash(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let auth_mode = match env::var("DISHDASH_PASSWORD_HASH") {
            Ok(hash) if hash == UNAUTHENTICATED_MAGIC => AuthMode::Unauthenticated,
            Ok(hash) if hash.starts_with("$argon2id$") => AuthMode::Password(hash),
            Ok(hash) if hash.trim().is_empty() => return Err(ConfigError::MissingPasswordHash),
            Ok(hash) => {
                return Err(ConfigError::InvalidPasswordHash(
                    hash.chars().take(20).collect(),
                ))
            }
            Err(_) => return Err(ConfigError::MissingPasswordHash),
        };

        Ok(Self {
            host: env::var("DISHDASH_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("DISHDASH_PORT", 7070)?,
            database_path: env::var("DISHDASH_DATABASE_URL")
                .map(|v| {
                    PathBuf::from(
                        v.strip_prefix("sqlite://")
                            .or_else(|| v.strip_prefix("sqlite:"))
                            .unwrap_or(&v),
                    )
                })
                .unwrap_or_else(|_| PathBuf::from("data/dishdash.db")),
            migrations_path: env::var("DISHDASH_MIGRATIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("migrations")),
            static_path: env::var("DISHDASH_STATIC_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
            auth_mode,
            currency: env::var("DISHDASH_CURRENCY").unwrap_or_else(|_| "INR".into()),
            locale: env::var("DISHDASH_LOCALE").unwrap_or_else(|_| "en-IN".into()),
            session_ttl_hours: parse_var("DISHDASH_SESSION_TTL_HOURS", 12)?,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Defaults suitable for tests and local development.
    pub fn local(auth_mode: AuthMode) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 7070,
            database_path: PathBuf::from(":memory:"),
            migrations_path: PathBuf::from("migrations"),
            static_path: PathBuf::from("static"),
            auth_mode,
            currency: "INR".into(),
            locale: "en-IN".into(),
            session_ttl_hours: 12,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}
