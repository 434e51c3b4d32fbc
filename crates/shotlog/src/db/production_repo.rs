//! Production repository: idempotent writes to the `trd_production` table.

use rusqlite::{params, Row};

use crate::mapping::ProductionRecord;

use super::writer::UpsertOutcome;
use super::{Database, DatabaseError};

/// Inserts the record unless a row with the same timestamp exists.
///
/// On conflict nothing is updated; the first write for a timestamp wins.
pub fn upsert(db: &Database, record: &ProductionRecord) -> Result<UpsertOutcome, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "INSERT INTO trd_production
             (partnumber, shot_current_part, shot_ok, shot_ng, shot_total, ct, timestamp, file_used)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(timestamp) DO NOTHING",
            params![
                record.partnumber,
                record.shot_current_part,
                record.shot_ok,
                record.shot_ng,
                record.shot_total,
                record.ct,
                record.timestamp,
                record.file_used,
            ],
        )?;
        Ok(UpsertOutcome::from_rows_changed(changed))
    })
}

fn from_row(row: &Row<'_>) -> Result<ProductionRecord, rusqlite::Error> {
    Ok(ProductionRecord {
        file_used: row.get("file_used")?,
        partnumber: row.get("partnumber")?,
        shot_current_part: row.get("shot_current_part")?,
        shot_ok: row.get("shot_ok")?,
        shot_ng: row.get("shot_ng")?,
        shot_total: row.get("shot_total")?,
        ct: row.get("ct")?,
        timestamp: row.get("timestamp")?,
    })
}

/// Finds the stored record for a timestamp.
pub fn find_by_timestamp(
    db: &Database,
    timestamp: &str,
) -> Result<Option<ProductionRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM trd_production WHERE timestamp = ?1")?;
        let mut rows = stmt.query_map(params![timestamp], from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Counts stored production rows.
pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM trd_production", [], |r| r.get(0))?;
        Ok(count)
    })
}
