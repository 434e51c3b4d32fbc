//! Streaming "last row" extraction for files that are still being appended to.
//!
//! The file is read once, front to back. Only the last terminated row and
//! the current candidate are kept, so memory does not grow with the file.
//! If the producer is mid-write, the file ends in an unterminated line;
//! that line is never returned, the row before it is.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use tracing::debug;

use super::error::ReadError;

/// One parsed CSV line. Fields are 0-indexed; no header row is assumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow(Vec<String>);

impl RawRow {
    pub fn new(fields: Vec<String>) -> Self {
        Self(fields)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    fn from_record(record: &ByteRecord) -> Self {
        Self(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        )
    }
}

impl From<Vec<String>> for RawRow {
    fn from(fields: Vec<String>) -> Self {
        Self(fields)
    }
}

/// Remembers the final byte handed to the CSV parser.
struct TerminatorTracking<R> {
    inner: R,
    last_byte: Option<u8>,
}

impl<R: Read> TerminatorTracking<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            last_byte: None,
        }
    }

    fn ends_with_terminator(&self) -> bool {
        matches!(self.last_byte, Some(b'\n') | Some(b'\r'))
    }
}

impl<R: Read> Read for TerminatorTracking<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.last_byte = Some(buf[n - 1]);
        }
        Ok(n)
    }
}

/// Reads `path` to the end and returns its last complete row.
pub fn read_last_row(path: &Path) -> Result<RawRow, ReadError> {
    let file = File::open(path).map_err(|e| ReadError::from_io(path.to_path_buf(), e))?;
    last_row_from_reader(file, path)
}

fn last_row_from_reader<R: Read>(source: R, path: &Path) -> Result<RawRow, ReadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(TerminatorTracking::new(source));

    let mut buf = ByteRecord::new();
    let mut previous: Option<ByteRecord> = None;
    let mut last: Option<ByteRecord> = None;
    let mut rows_seen: u64 = 0;

    loop {
        match reader.read_byte_record(&mut buf) {
            Ok(true) => {
                rows_seen += 1;
                previous = last.replace(std::mem::take(&mut buf));
            }
            Ok(false) => break,
            Err(e) => return Err(csv_error(path, e)),
        }
    }

    let terminated = reader.get_ref().ends_with_terminator();
    debug!(rows_seen, terminated, "Scanned CSV");

    // An unterminated final line may still be mid-write, even when it
    // already has every field: its last field can be cut short.
    let chosen = if terminated {
        last
    } else {
        if let Some(tail) = &last {
            debug!(tail_fields = tail.len(), "Discarding unterminated trailing line");
        }
        previous
    };
    let chosen = chosen.ok_or_else(|| ReadError::Empty {
        path: path.to_path_buf(),
    })?;

    Ok(RawRow::from_record(&chosen))
}

fn csv_error(path: &Path, err: csv::Error) -> ReadError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    match err.into_kind() {
        csv::ErrorKind::Io(source) => ReadError::from_io(path.to_path_buf(), source),
        other => ReadError::Parse {
            path: path.to_path_buf(),
            line,
            message: format!("{:?}", other),
        },
    }
}
