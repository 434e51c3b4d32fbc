use std::path::PathBuf;

use clap::Parser;

use shotlog::config::{load_settings, validate_settings, Settings};
use shotlog::secrets::{resolve_secret, SecretError};

use crate::error::ServerError;
use crate::logging::LogFormat;

#[derive(Parser, Debug)]
#[command(
    name = "shotlog-server",
    version,
    about = "Serves the latest production and status CSV rows and records them in SQLite"
)]
pub struct Cli {
    /// Optional JSON settings file; flags and environment override it
    #[arg(long, env = "SHOTLOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root directory holding <YYYY>/<MM>/ dataset folders
    #[arg(long, env = "DATA_ROOT")]
    pub data_root: Option<PathBuf>,

    /// Database connection string (sqlite://path, sqlite::memory: or a file path)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Operator username required at startup
    #[arg(long, env = "APP_USER")]
    pub user: Option<String>,

    /// bcrypt hash of the operator password
    #[arg(long, env = "APP_PASS_HASH", hide_env_values = true)]
    pub pass_hash: Option<String>,

    /// File containing the bcrypt hash, used when APP_PASS_HASH is unset
    #[arg(long, env = "APP_PASS_HASH_FILE")]
    pub pass_hash_file: Option<String>,

    #[arg(long, env = "LOGIN_MAX_ATTEMPTS")]
    pub login_max_attempts: Option<u32>,

    /// Linear backoff unit between failed logins, in seconds
    #[arg(long, env = "LOGIN_BACKOFF_SECS")]
    pub login_backoff_secs: Option<u64>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Cli {
    /// Layers flags and environment over the settings file (or defaults)
    /// and validates the result.
    pub fn settings(&self) -> Result<Settings, ServerError> {
        let mut settings = match &self.config {
            Some(path) => load_settings(path)?,
            None => Settings::default(),
        };

        if let Some(data_root) = &self.data_root {
            settings.data_root = data_root.clone();
        }
        if let Some(url) = &self.database_url {
            settings.database_url = url.clone();
        }
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(user) = &self.user {
            settings.login.username = user.clone();
        }
        if let Some(max_attempts) = self.login_max_attempts {
            settings.login.max_attempts = max_attempts;
        }
        if let Some(backoff) = self.login_backoff_secs {
            settings.login.backoff_secs = backoff;
        }

        settings.login.password_hash =
            match resolve_secret(self.pass_hash.as_deref(), self.pass_hash_file.as_deref()) {
                Ok(hash) => Some(hash),
                // Reported by validation as a missing APP_PASS_HASH.
                Err(SecretError::NoSourceProvided) => None,
                Err(e) => return Err(e.into()),
            };

        validate_settings(&settings)?;
        Ok(settings)
    }
}

/// Reads `.env` from the working directory or one of its parents into the
/// process environment. Variables already set are left alone.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}
