#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use shotlog::dataset::{resolve, DatasetKind, FixedClock};
use shotlog::db::{production_repo, status_repo, Database};
use shotlog::IngestService;

/// Width of a daily production row; the timestamp sits in the last column.
pub const TRD_WIDTH: usize = 39;

/// Isolated data root and database for one test.
pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub today: NaiveDate,
}

impl TestHarness {
    /// Harness whose clock reads 2026-01-13.
    pub fn new() -> Self {
        Self::on(2026, 1, 13)
    }

    pub fn on(year: i32, month: u32, day: u32) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let today = NaiveDate::from_ymd_opt(year, month, day).expect("Invalid harness date");
        Self {
            temp_dir,
            db,
            today,
        }
    }

    pub fn data_root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A service sharing this harness's database and clock.
    pub fn service(&self) -> IngestService {
        IngestService::with_clock(
            self.data_root(),
            self.db.clone(),
            Arc::new(FixedClock(self.today)),
        )
    }

    /// Where today's file for `kind` is expected.
    pub fn path_for(&self, kind: DatasetKind) -> PathBuf {
        resolve(self.data_root(), kind, self.today).path
    }

    /// Writes today's file for `kind` verbatim.
    pub fn write_raw(&self, kind: DatasetKind, content: &str) -> PathBuf {
        let path = self.path_for(kind);
        std::fs::create_dir_all(path.parent().expect("dataset path has a parent"))
            .expect("Failed to create dataset directory");
        std::fs::write(&path, content).expect("Failed to write dataset file");
        path
    }

    /// Writes today's daily file, one newline-terminated line per row.
    pub fn write_trd(&self, rows: &[Vec<String>]) -> PathBuf {
        self.write_raw(DatasetKind::Daily, &join_rows(rows))
    }

    /// Writes today's monthly file, one newline-terminated line per row.
    pub fn write_sts(&self, rows: &[Vec<String>]) -> PathBuf {
        self.write_raw(DatasetKind::Monthly, &join_rows(rows))
    }

    pub fn production_count(&self) -> u64 {
        production_repo::count(&self.db).expect("Failed to count production rows")
    }

    pub fn status_count(&self) -> u64 {
        status_repo::count(&self.db).expect("Failed to count status rows")
    }
}

/// A daily row with the mapped columns filled and filler elsewhere.
pub fn trd_row(
    partnumber: &str,
    counters: [&str; 4],
    ct: &str,
    timestamp: &str,
) -> Vec<String> {
    let mut row: Vec<String> = (0..TRD_WIDTH).map(|i| format!("x{}", i)).collect();
    row[1] = partnumber.to_string();
    row[6] = counters[0].to_string();
    row[7] = counters[1].to_string();
    row[8] = counters[2].to_string();
    row[9] = counters[3].to_string();
    row[10] = ct.to_string();
    row[38] = timestamp.to_string();
    row
}

pub fn sts_row(timestamp: &str, status: &str, partnumber: &str) -> Vec<String> {
    vec![
        "1".to_string(),
        timestamp.to_string(),
        status.to_string(),
        partnumber.to_string(),
    ]
}

fn join_rows(rows: &[Vec<String>]) -> String {
    rows.iter().map(|r| format!("{}\n", r.join(","))).collect()
}
