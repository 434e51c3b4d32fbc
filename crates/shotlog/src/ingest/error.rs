use std::path::PathBuf;
use thiserror::Error;

use crate::dataset::DatasetKind;
use crate::db::DatabaseError;
use crate::mapping::MapError;
use crate::reader::ReadError;
use crate::sanitize::redact_path;

#[derive(Error, Debug)]
pub enum IngestError {
    /// The producer has not created the file yet. An expected outcome.
    #[error("File not found: expected '{expected_file}'")]
    NotFound { expected_file: String, path: PathBuf },

    #[error("CSV empty: '{}'", redact_path(.path))]
    EmptyFile { path: PathBuf },

    #[error("Malformed row in '{}': {reason}", redact_path(.path))]
    MalformedRow { path: PathBuf, reason: String },

    #[error("Field '{field}' has invalid value '{value}'")]
    FieldParse { field: &'static str, value: String },

    #[error("Failed to read '{}': {source}", redact_path(.path))]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage failed: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Background {kind} task failed: {message}")]
    Task { kind: DatasetKind, message: String },
}

impl IngestError {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::NotFound { .. } => "file_not_found",
            IngestError::EmptyFile { .. } => "empty_file",
            IngestError::MalformedRow { .. } => "malformed_row",
            IngestError::FieldParse { .. } => "field_parse",
            IngestError::FileAccess { .. } => "file_access",
            IngestError::Storage(_) => "storage",
            IngestError::Task { .. } => "task",
        }
    }

    pub(crate) fn from_read(err: ReadError, expected_file: &str) -> Self {
        match err {
            ReadError::NotFound { path } => IngestError::NotFound {
                expected_file: expected_file.to_string(),
                path,
            },
            ReadError::Empty { path } => IngestError::EmptyFile { path },
            ReadError::Access { path, source } => IngestError::FileAccess { path, source },
            ReadError::Parse {
                path,
                line,
                message,
            } => IngestError::MalformedRow {
                path,
                reason: format!("line {}: {}", line, message),
            },
        }
    }

    pub(crate) fn from_map(err: MapError, path: PathBuf) -> Self {
        match err {
            MapError::MalformedRow { .. } => IngestError::MalformedRow {
                path,
                reason: err.to_string(),
            },
            MapError::FieldParse { field, value } => IngestError::FieldParse { field, value },
        }
    }
}
