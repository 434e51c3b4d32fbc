//! Column layout of the producer's files and the numeric coercion rules.
//!
//! Indices are 0-based and fixed by the file naming convention; a format
//! change on the producer side needs a new filename prefix, not an edit here.

use crate::dataset::DatasetKind;
use crate::reader::RawRow;

use super::error::MapError;
use super::record::{IngestedRecord, ProductionRecord, StatusRecord};

mod trd {
    pub const PARTNUMBER: usize = 1;
    pub const SHOT_CURRENT_PART: usize = 6;
    pub const SHOT_OK: usize = 7;
    pub const SHOT_NG: usize = 8;
    pub const SHOT_TOTAL: usize = 9;
    pub const CT: usize = 10;
    pub const TIMESTAMP: usize = 38;
    pub const WIDTH: usize = TIMESTAMP + 1;
}

mod sts {
    pub const TIMESTAMP: usize = 1;
    pub const STATUS: usize = 2;
    pub const PARTNUMBER: usize = 3;
    pub const WIDTH: usize = PARTNUMBER + 1;
}

fn required_width(kind: DatasetKind) -> usize {
    match kind {
        DatasetKind::Daily => trd::WIDTH,
        DatasetKind::Monthly => sts::WIDTH,
    }
}

/// Maps a raw row into the typed record for `kind`.
///
/// Any numeric field that does not parse fails the whole row.
pub fn map_row(kind: DatasetKind, row: &RawRow, file_used: &str) -> Result<IngestedRecord, MapError> {
    let required = required_width(kind);
    if row.len() < required {
        return Err(MapError::MalformedRow {
            kind,
            required,
            actual: row.len(),
        });
    }

    // Width checked above, so indexing cannot miss.
    let field = |i: usize| row.get(i).unwrap_or_default();

    let record = match kind {
        DatasetKind::Daily => IngestedRecord::Production(ProductionRecord {
            file_used: file_used.to_string(),
            partnumber: field(trd::PARTNUMBER).to_string(),
            shot_current_part: parse_integer("shot_current_part", field(trd::SHOT_CURRENT_PART))?,
            shot_ok: parse_integer("shot_ok", field(trd::SHOT_OK))?,
            shot_ng: parse_integer("shot_ng", field(trd::SHOT_NG))?,
            shot_total: parse_integer("shot_total", field(trd::SHOT_TOTAL))?,
            ct: parse_decimal("ct", field(trd::CT))?,
            timestamp: parse_key(field(trd::TIMESTAMP))?,
        }),
        DatasetKind::Monthly => IngestedRecord::Status(StatusRecord {
            timestamp: parse_key(field(sts::TIMESTAMP))?,
            status: parse_integer("status", field(sts::STATUS))?,
            partnumber: field(sts::PARTNUMBER).to_string(),
            file_used: file_used.to_string(),
        }),
    };

    Ok(record)
}

/// Parses a finite decimal, ignoring surrounding ASCII whitespace.
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<f64, MapError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| MapError::FieldParse {
            field,
            value: raw.to_string(),
        })
}

/// Parses an integer. Integral decimals such as `120.0` are accepted.
pub fn parse_integer(field: &'static str, raw: &str) -> Result<i64, MapError> {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(v);
    }

    let invalid = || MapError::FieldParse {
        field,
        value: raw.to_string(),
    };
    let v = parse_decimal(field, trimmed).map_err(|_| invalid())?;
    if v.fract() != 0.0 || v < i64::MIN as f64 || v >= i64::MAX as f64 {
        return Err(invalid());
    }
    Ok(v as i64)
}

fn parse_key(raw: &str) -> Result<String, MapError> {
    if raw.trim().is_empty() {
        return Err(MapError::FieldParse {
            field: "timestamp",
            value: raw.to_string(),
        });
    }
    Ok(raw.to_string())
}
