use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Database
    pub db_path: PathBuf,

    // Sessions
    pub jwt_secret: String,
    pub access_token_expire_secs: i64,

    // Build info
    pub version: String,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            // Server
            host: env::var("GATEPASS_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("GATEPASS_API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            // Database
            db_path: PathBuf::from(
                env::var("GATEPASS_DB_PATH").unwrap_or_else(|_| "/data/gatepass.db".to_string()),
            ),

            // Sessions
            jwt_secret: env::var("GATEPASS_JWT_SECRET")
                .unwrap_or_else(|_| "insecure-dev-secret".to_string()),
            access_token_expire_secs: env::var("GATEPASS_TOKEN_EXPIRE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),

            // Build info
            version: env!("CARGO_PKG_VERSION").to_string(),

            // Logging
            log_level: env::var("GATEPASS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn db_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.db_path.display())
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
