use crate::mapping::IngestedRecord;

use super::{production_repo, status_repo, Database, DatabaseError};

/// Result of an idempotent insert keyed by timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// A row with this timestamp already existed; nothing was written.
    SkippedDuplicate,
}

impl UpsertOutcome {
    pub(crate) fn from_rows_changed(changed: usize) -> Self {
        if changed == 0 {
            UpsertOutcome::SkippedDuplicate
        } else {
            UpsertOutcome::Inserted
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Inserted => "inserted",
            UpsertOutcome::SkippedDuplicate => "skipped_duplicate",
        }
    }
}

/// Writes a record into the table for its dataset kind.
pub fn upsert(db: &Database, record: &IngestedRecord) -> Result<UpsertOutcome, DatabaseError> {
    match record {
        IngestedRecord::Production(r) => production_repo::upsert(db, r),
        IngestedRecord::Status(r) => status_repo::upsert(db, r),
    }
}
