use serde::Serialize;

use crate::dataset::DatasetKind;

/// Latest counters from the daily production log.
///
/// `shot_ok + shot_ng <= shot_total` is not checked; values are passed
/// through as the machine wrote them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionRecord {
    pub file_used: String,
    pub partnumber: String,
    pub shot_current_part: i64,
    pub shot_ok: i64,
    pub shot_ng: i64,
    pub shot_total: i64,
    pub ct: f64,
    pub timestamp: String,
}

/// Latest machine status from the monthly status log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    pub timestamp: String,
    pub status: i64,
    pub partnumber: String,
    pub file_used: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IngestedRecord {
    Production(ProductionRecord),
    Status(StatusRecord),
}

impl IngestedRecord {
    pub fn kind(&self) -> DatasetKind {
        match self {
            IngestedRecord::Production(_) => DatasetKind::Daily,
            IngestedRecord::Status(_) => DatasetKind::Monthly,
        }
    }

    /// The idempotency key.
    pub fn timestamp(&self) -> &str {
        match self {
            IngestedRecord::Production(r) => &r.timestamp,
            IngestedRecord::Status(r) => &r.timestamp,
        }
    }

    pub fn file_used(&self) -> &str {
        match self {
            IngestedRecord::Production(r) => &r.file_used,
            IngestedRecord::Status(r) => &r.file_used,
        }
    }
}
