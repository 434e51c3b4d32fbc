use std::path::Path;

use secrecy::ExposeSecret;

use crate::config::schema::Settings;
use crate::error::ConfigError;
use crate::secrets::looks_like_bcrypt;

/// Reads a JSON settings file. Missing keys take their defaults.
///
/// The result is not validated yet: the password hash is only known once
/// the environment has been applied.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_settings_from_str(&content)
}

pub fn load_settings_from_str(content: &str) -> Result<Settings, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    if settings.data_root.as_os_str().is_empty() {
        return Err(invalid("data root must not be empty"));
    }

    if settings.database_url.trim().is_empty() {
        return Err(invalid("database URL must not be empty"));
    }

    if settings.port == 0 {
        return Err(invalid("port must be between 1 and 65535"));
    }

    let login = &settings.login;
    if login.username.trim().is_empty() {
        return Err(invalid("APP_USER is not set"));
    }

    match &login.password_hash {
        None => return Err(invalid("APP_PASS_HASH is not set")),
        Some(hash) if !looks_like_bcrypt(hash.expose_secret()) => {
            return Err(invalid("APP_PASS_HASH is not a bcrypt hash"));
        }
        Some(_) => {}
    }

    if login.max_attempts == 0 {
        return Err(invalid("login max attempts must be at least 1"));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation {
        message: message.to_string(),
    }
}
