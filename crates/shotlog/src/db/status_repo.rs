//! Status repository: idempotent writes to the `sts_status` table.

use rusqlite::params;

use crate::mapping::StatusRecord;

use super::writer::UpsertOutcome;
use super::{Database, DatabaseError};

/// Inserts the record unless a row with the same timestamp exists.
pub fn upsert(db: &Database, record: &StatusRecord) -> Result<UpsertOutcome, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "INSERT INTO sts_status (timestamp, status, partnumber, file_used)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(timestamp) DO NOTHING",
            params![
                record.timestamp,
                record.status,
                record.partnumber,
                record.file_used,
            ],
        )?;
        Ok(UpsertOutcome::from_rows_changed(changed))
    })
}

/// Finds the stored record for a timestamp.
pub fn find_by_timestamp(
    db: &Database,
    timestamp: &str,
) -> Result<Option<StatusRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT timestamp, status, partnumber, file_used FROM sts_status WHERE timestamp = ?1",
        )?;
        let mut rows = stmt.query_map(params![timestamp], |row| {
            Ok(StatusRecord {
                timestamp: row.get(0)?,
                status: row.get(1)?,
                partnumber: row.get(2)?,
                file_used: row.get(3)?,
            })
        })?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Counts stored status rows.
pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM sts_status", [], |r| r.get(0))?;
        Ok(count)
    })
}
