//! Application configuration management.
//!
//! All values come from environment variables and are read once at startup.
//! Handlers never read [`APP_CONFIG`] directly: whatever a request needs is
//! copied into [`crate::endpoints::AppState`] when the server is built.
//!
//! # Security Notes
//! - Sensitive fields are marked and must never be logged
//! - An absent `WEBHOOK_SECRET` keeps the service running but not ready

use anyhow::Context;
use envconfig::Envconfig;
use std::sync::OnceLock;

/// Service configuration read from the environment.
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// SQLite connection string (NON-SENSITIVE)
    /// Example: "sqlite:/data/app.db"
    #[envconfig(default = "sqlite:/data/app.db")]
    pub database_url: String,

    /// 🔒 SENSITIVE: SQLCipher key, applied only in production
    pub db_pass_encrypt: Option<String>,

    /// 🔒 SENSITIVE: shared secret used to sign inbound webhook bodies
    pub webhook_secret: Option<String>,

    /// Host address for web server binding (NON-SENSITIVE)
    #[envconfig(default = "0.0.0.0")]
    pub server_host: String,

    /// Port for web server binding (NON-SENSITIVE)
    #[envconfig(default = "8000")]
    pub server_port: u16,

    /// Path to SSL private key file (SENSITIVE PATH)
    #[envconfig(default = "server.key")]
    pub private_key_path: String,

    /// Path to SSL certificate file (NON-SENSITIVE)
    #[envconfig(default = "server.crt")]
    pub certificate_path: String,

    /// 🔒 SENSITIVE: write token for exporting traces and metrics to Logfire
    pub logfire_token: Option<String>,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    /// Webhook secret, treating an empty value as not configured
    pub fn webhook_secret(&self) -> Option<String> {
        non_empty(self.webhook_secret.as_deref())
    }

    /// Logfire token, treating an empty value as not configured
    pub fn logfire_token(&self) -> Option<String> {
        non_empty(self.logfire_token.as_deref())
    }

    /// SQLCipher key, only honoured in production
    pub fn db_encryption_key(&self) -> Option<String> {
        if !self.is_prod() {
            return None;
        }
        non_empty(self.db_pass_encrypt.as_deref())
    }
}

/// Blank values count as unset; anything else is kept byte-for-byte
fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(ToString::to_string)
}

/// Global application configuration, set once by [`init_config`]
pub static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Loads [`AppConfig`] from the environment into [`APP_CONFIG`].
pub fn init_config() -> anyhow::Result<()> {
    let app_config = AppConfig::init_from_env()
        .context("failed to load configuration from environment variables")?;

    APP_CONFIG
        .set(app_config)
        .map_err(|_| anyhow::anyhow!("app config already initialized"))
}
