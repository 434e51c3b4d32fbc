//! Maps a dataset kind and a reference date to the file the producer writes.
//!
//! The producer lays files out as `<root>/<YYYY>/<MM>/<name>`, where the name
//! carries the date: `TrdYYYYMMDD.csv` for the daily production log and
//! `StsYYYYMM.csv` for the monthly status log.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// Per-day production counters (`Trd` files).
    Daily,
    /// Per-month machine status (`Sts` files).
    Monthly,
}

impl DatasetKind {
    /// Short name used in routes and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Daily => "trd",
            DatasetKind::Monthly => "sts",
        }
    }

    fn filename_prefix(&self) -> &'static str {
        match self {
            DatasetKind::Daily => "Trd",
            DatasetKind::Monthly => "Sts",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The file a request expects to read. Recomputed per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub kind: DatasetKind,
    pub year: String,
    pub month: String,
    /// Only present for daily files.
    pub day: Option<String>,
    pub filename: String,
    pub path: PathBuf,
}

/// Derives the expected file for `kind` on `date` below `data_root`.
pub fn resolve(data_root: &Path, kind: DatasetKind, date: NaiveDate) -> FileReference {
    let year = format!("{:04}", date.year());
    let month = format!("{:02}", date.month());

    let (day, filename) = match kind {
        DatasetKind::Daily => {
            let day = format!("{:02}", date.day());
            let filename = format!("{}{}{}{}.csv", kind.filename_prefix(), year, month, day);
            (Some(day), filename)
        }
        DatasetKind::Monthly => {
            let filename = format!("{}{}{}.csv", kind.filename_prefix(), year, month);
            (None, filename)
        }
    };

    let path = data_root.join(&year).join(&month).join(&filename);

    FileReference {
        kind,
        year,
        month,
        day,
        filename,
        path,
    }
}
