use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, info_span, Instrument};

use crate::dataset::{resolve, Clock, DatasetKind, FileReference, SystemClock};
use crate::db::{self, Database, UpsertOutcome};
use crate::mapping::{map_row, IngestedRecord};
use crate::reader::read_last_row;
use crate::sanitize;

use super::error::IngestError;

/// Resolves today's file for a dataset, takes its last row and stores it.
///
/// Stateless between calls apart from the shared database handle; cloning
/// is cheap.
#[derive(Clone)]
pub struct IngestService {
    data_root: Arc<PathBuf>,
    db: Database,
    clock: Arc<dyn Clock>,
}

impl IngestService {
    /// Uses the local wall-clock date.
    pub fn new(data_root: impl Into<PathBuf>, db: Database) -> Self {
        Self::with_clock(data_root, db, Arc::new(SystemClock))
    }

    pub fn with_clock(data_root: impl Into<PathBuf>, db: Database, clock: Arc<dyn Clock>) -> Self {
        Self {
            data_root: Arc::new(data_root.into()),
            db,
            clock,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The file a request for `kind` would read right now.
    pub fn current_reference(&self, kind: DatasetKind) -> FileReference {
        resolve(&self.data_root, kind, self.clock.today())
    }

    /// Runs the pipeline once for `kind`.
    ///
    /// A duplicate timestamp is not an error: the freshly read record is
    /// returned whether or not a new row was stored.
    pub async fn handle(&self, kind: DatasetKind) -> Result<IngestedRecord, IngestError> {
        let reference = self.current_reference(kind);
        let span = info_span!("ingest", kind = %kind, file = %reference.filename);
        self.run(reference).instrument(span).await
    }

    async fn run(&self, reference: FileReference) -> Result<IngestedRecord, IngestError> {
        // Step 1: Existence check
        if !self.file_exists(&reference).await? {
            return Err(not_found(&reference));
        }

        // Step 2: Read last row and map it
        let record = self.read_and_map(&reference).await?;

        // Step 3: Idempotent write
        let outcome = self.store(record.clone(), reference.kind).await?;
        let timestamp = record.timestamp();
        match outcome {
            UpsertOutcome::Inserted => {
                info!(timestamp, outcome = outcome.as_str(), "Upserted record")
            }
            UpsertOutcome::SkippedDuplicate => {
                debug!(timestamp, outcome = outcome.as_str(), "Upserted record")
            }
        }

        Ok(record)
    }

    async fn file_exists(&self, reference: &FileReference) -> Result<bool, IngestError> {
        tokio::fs::try_exists(&reference.path)
            .await
            .map_err(|source| IngestError::FileAccess {
                path: reference.path.clone(),
                source,
            })
    }

    async fn read_and_map(&self, reference: &FileReference) -> Result<IngestedRecord, IngestError> {
        let kind = reference.kind;
        let path = reference.path.clone();
        let filename = reference.filename.clone();

        let span = info_span!("read_last_row", path = %sanitize::redact_path(&path));
        let joined = tokio::task::spawn_blocking(move || {
            let _step = span.entered();
            let row = read_last_row(&path).map_err(|e| IngestError::from_read(e, &filename))?;
            map_row(kind, &row, &filename).map_err(|e| IngestError::from_map(e, path.clone()))
        })
        .await;

        joined.map_err(|e| IngestError::Task {
            kind,
            message: e.to_string(),
        })?
    }

    async fn store(
        &self,
        record: IngestedRecord,
        kind: DatasetKind,
    ) -> Result<UpsertOutcome, IngestError> {
        let db = self.db.clone();
        let span = info_span!("upsert", table = table_name(kind));
        let joined = tokio::task::spawn_blocking(move || {
            let _step = span.entered();
            db::upsert(&db, &record)
        })
        .await;

        let outcome = joined.map_err(|e| IngestError::Task {
            kind,
            message: e.to_string(),
        })??;
        Ok(outcome)
    }
}

fn not_found(reference: &FileReference) -> IngestError {
    IngestError::NotFound {
        expected_file: reference.filename.clone(),
        path: reference.path.clone(),
    }
}

fn table_name(kind: DatasetKind) -> &'static str {
    match kind {
        DatasetKind::Daily => "trd_production",
        DatasetKind::Monthly => "sts_status",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::dataset::FixedClock;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn service(root: &Path) -> IngestService {
        let db = Database::open_in_memory().unwrap();
        let clock = FixedClock(NaiveDate::from_ymd_opt(2026, 1, 13).unwrap());
        IngestService::with_clock(root, db, Arc::new(clock))
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let svc = service(dir.path());

        let err = svc.handle(DatasetKind::Monthly).await.unwrap_err();
        match err {
            IngestError::NotFound {
                expected_file,
                path,
            } => {
                assert_eq!(expected_file, "Sts202601.csv");
                assert_eq!(path, dir.path().join("2026/01/Sts202601.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_status_file_is_stored_once() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "2026/01/Sts202601.csv",
            "0,2026-01-13 07:00:00,1,PN-1\n0,2026-01-13 08:00:00,2,PN-2\n",
        );
        let svc = service(dir.path());

        let first = svc.handle(DatasetKind::Monthly).await.unwrap();
        let second = svc.handle(DatasetKind::Monthly).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.timestamp(), "2026-01-13 08:00:00");
        assert_eq!(crate::db::status_repo::count(svc.database()).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_file_is_reported() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "2026/01/Sts202601.csv", "");
        let svc = service(dir.path());

        let err = svc.handle(DatasetKind::Monthly).await.unwrap_err();
        assert_eq!(err.kind(), "empty_file");
    }

    #[tokio::test]
    async fn test_bad_number_is_not_stored() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "2026/01/Sts202601.csv", "0,2026-01-13,running,PN\n");
        let svc = service(dir.path());

        let err = svc.handle(DatasetKind::Monthly).await.unwrap_err();
        assert!(matches!(err, IngestError::FieldParse { field: "status", .. }));
        assert_eq!(crate::db::status_repo::count(svc.database()).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_short_row_is_malformed() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "2026/01/Trd20260113.csv", "a,b,c\n");
        let svc = service(dir.path());

        let err = svc.handle(DatasetKind::Daily).await.unwrap_err();
        assert_eq!(err.kind(), "malformed_row");
    }

    #[tokio::test]
    async fn test_line_still_being_written_is_not_stored() {
        let dir = TempDir::new().unwrap();
        let rel = "2026/01/Sts202601.csv";
        write(dir.path(), rel, "0,t1,1,PN-100\n0,t2,2,PN-1");
        let svc = service(dir.path());

        let first = svc.handle(DatasetKind::Monthly).await.unwrap();
        assert_eq!(first.timestamp(), "t1");

        // The producer finishes the line.
        write(dir.path(), rel, "0,t1,1,PN-100\n0,t2,2,PN-100\n");
        let second = svc.handle(DatasetKind::Monthly).await.unwrap();
        assert_eq!(second.timestamp(), "t2");

        let stored = crate::db::status_repo::find_by_timestamp(svc.database(), "t2")
            .unwrap()
            .unwrap();
        assert_eq!(stored.partnumber, "PN-100");
        assert_eq!(crate::db::status_repo::count(svc.database()).unwrap(), 2);
    }
}
