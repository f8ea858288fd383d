//! Append-only log of completed valuations and its spreadsheet export.
//!
//! The log is a four-column table: company, intrinsic value per share
//! (4 dp), model label and local timestamp. Rows are only ever appended.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::types::{format_iv, Money, ValuationResult};
use crate::IvResult;

/// Sheet name used when the log is exported.
pub const EXPORT_SHEET_NAME: &str = "Valuations";

/// Column headers, in order.
pub const HISTORY_COLUMNS: [&str; 4] = ["Company", "IV per Share", "Model", "Date"];

/// Timestamp format of the `Date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One row of the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "IV per Share", with = "rust_decimal::serde::str")]
    pub intrinsic_value_per_share: Money,
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Date", with = "minute_timestamp")]
    pub timestamp: NaiveDateTime,
}

impl HistoryRecord {
    /// Build a log row from a result. The value is rounded to 4 dp and the
    /// timestamp truncated to the minute, matching what the log stores.
    pub fn from_result(
        company: &str,
        result: &ValuationResult,
        timestamp: NaiveDateTime,
    ) -> Self {
        HistoryRecord {
            company: company.to_string(),
            intrinsic_value_per_share: format_iv(result.intrinsic_value_per_share),
            model: result.model_name.clone(),
            timestamp: truncate_to_minute(timestamp),
        }
    }
}

fn truncate_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

mod minute_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(raw.trim(), DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Narrow interface between the engine's results and wherever they are kept.
pub trait HistoryLog {
    /// Append one record. Earlier records are never touched.
    fn append(&mut self, record: HistoryRecord) -> IvResult<()>;

    /// Every record, in append order.
    fn records(&self) -> IvResult<Vec<HistoryRecord>>;
}

/// History kept in memory; for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryLog {
    records: Vec<HistoryRecord>,
}

impl MemoryHistoryLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryLog for MemoryHistoryLog {
    fn append(&mut self, record: HistoryRecord) -> IvResult<()> {
        self.records.push(record);
        Ok(())
    }

    fn records(&self) -> IvResult<Vec<HistoryRecord>> {
        Ok(self.records.clone())
    }
}

/// History kept in a CSV file. The header is written when the file is new
/// or empty; rows are appended.
#[derive(Debug, Clone)]
pub struct CsvHistoryLog {
    path: PathBuf,
}

impl CsvHistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvHistoryLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryLog for CsvHistoryLog {
    fn append(&mut self, record: HistoryRecord) -> IvResult<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(&record)?;
        writer.flush()?;

        tracing::debug!(path = %self.path.display(), company = %record.company, "history record appended");
        Ok(())
    }

    fn records(&self) -> IvResult<Vec<HistoryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }
}

/// Render the full log as the "Valuations" sheet. The header row is always
/// written, even for an empty log.
pub fn export_valuations<W: Write>(records: &[HistoryRecord], writer: W) -> IvResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(HISTORY_COLUMNS)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Export the log to `<dir>/Valuations.csv` or an explicit file path.
pub fn export_to_path(records: &[HistoryRecord], path: &Path) -> IvResult<PathBuf> {
    let target = if path.is_dir() {
        path.join(format!("{EXPORT_SHEET_NAME}.csv"))
    } else {
        path.to_path_buf()
    };
    let file = File::create(&target)?;
    export_valuations(records, file)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn record(company: &str, iv: Money) -> HistoryRecord {
        HistoryRecord {
            company: company.into(),
            intrinsic_value_per_share: iv,
            model: "Financials - Gordon Growth DDM".into(),
            timestamp: ts(9, 30, 0),
        }
    }

    #[test]
    fn test_truncate_to_minute() {
        assert_eq!(truncate_to_minute(ts(9, 30, 45)), ts(9, 30, 0));
    }

    #[test]
    fn test_memory_log_preserves_order() {
        let mut log = MemoryHistoryLog::new();
        log.append(record("A", dec!(1))).unwrap();
        log.append(record("B", dec!(2))).unwrap();
        let companies: Vec<String> = log.records().unwrap().into_iter().map(|r| r.company).collect();
        assert_eq!(companies, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_export_header_and_rows() {
        let mut buf = Vec::new();
        export_valuations(&[record("Acme", dec!(142.8571))], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Company,IV per Share,Model,Date\nAcme,142.8571,Financials - Gordon Growth DDM,2024-03-15 09:30\n"
        );
    }

    #[test]
    fn test_export_empty_log_has_header() {
        let mut buf = Vec::new();
        export_valuations(&[], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Company,IV per Share,Model,Date\n");
    }

    #[test]
    fn test_csv_log_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = CsvHistoryLog::new(dir.path().join("none.csv"));
        assert!(log.records().unwrap().is_empty());
    }
}
