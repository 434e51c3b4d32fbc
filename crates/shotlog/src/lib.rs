pub mod config;
pub mod dataset;
pub mod db;
pub mod error;
pub mod http;
pub mod ingest;
pub mod login;
pub mod mapping;
pub mod reader;
pub mod sanitize;
pub mod secrets;

pub use config::{load_settings, validate_settings, LoginSettings, Settings};
pub use dataset::{DatasetKind, FileReference};
pub use db::{Database, DatabaseError, UpsertOutcome};
pub use error::{ConfigError, Result, ShotlogError};
pub use ingest::{IngestError, IngestService};
pub use login::{run_gate, Credentials, LoginError, LoginThrottle, TerminalPrompt};
pub use mapping::{IngestedRecord, ProductionRecord, StatusRecord};
pub use secrets::{resolve_secret, SecretError};
