use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::login::{Credentials, ThrottlePolicy, DEFAULT_MAX_ATTEMPTS};

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub login: LoginSettings,
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_database_url() -> String {
    "sqlite://shotlog.db".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            database_url: default_database_url(),
            host: default_host(),
            port: default_port(),
            login: LoginSettings::default(),
        }
    }
}

impl Settings {
    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Operator account and retry policy for the startup login.
///
/// The hash never comes from a config file; it is resolved from
/// `APP_PASS_HASH` or `APP_PASS_HASH_FILE` at startup.
#[derive(Debug, Deserialize)]
pub struct LoginSettings {
    #[serde(default)]
    pub username: String,
    #[serde(skip)]
    pub password_hash: Option<SecretString>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_backoff_secs() -> u64 {
    2
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self {
            username: String::new(),
            password_hash: None,
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

impl LoginSettings {
    pub fn policy(&self) -> ThrottlePolicy {
        ThrottlePolicy {
            max_attempts: self.max_attempts,
            backoff_unit: Duration::from_secs(self.backoff_secs),
        }
    }

    /// Builds the credential checker; `None` until a hash has been resolved.
    pub fn credentials(&self) -> Option<Credentials> {
        self.password_hash.as_ref().map(|hash| {
            Credentials::new(
                self.username.clone(),
                SecretString::from(hash.expose_secret()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.data_root, PathBuf::from("data"));
        assert_eq!(settings.database_url, "sqlite://shotlog.db");
        assert_eq!(settings.bind_address(), "0.0.0.0:3000");
        assert_eq!(settings.login.max_attempts, 3);
        assert_eq!(settings.login.policy().backoff_unit, Duration::from_secs(2));
        assert!(settings.login.credentials().is_none());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{ "port": 8080, "login": { "username": "operator", "backoff_secs": 1 } }"#,
        )
        .unwrap();

        assert_eq!(settings.port, 8080);
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.login.username, "operator");
        assert_eq!(settings.login.max_attempts, 3);
        assert_eq!(settings.login.policy().backoff_unit, Duration::from_secs(1));
    }

    #[test]
    fn test_hash_is_not_read_from_json() {
        let settings: Settings =
            serde_json::from_str(r#"{ "login": { "password_hash": "$2b$10$abc" } }"#).unwrap();
        assert!(settings.login.password_hash.is_none());
    }
}
