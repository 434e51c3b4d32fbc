use thiserror::Error;

use crate::dataset::DatasetKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("Malformed {kind} row: need at least {required} fields, got {actual}")]
    MalformedRow {
        kind: DatasetKind,
        required: usize,
        actual: usize,
    },

    #[error("Field '{field}' has invalid value '{value}'")]
    FieldParse { field: &'static str, value: String },
}
