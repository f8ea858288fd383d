pub mod history;
pub mod rates;
pub mod valuation;

use chrono::Local;
use serde_json::Value;
use std::path::PathBuf;

use intrinsic_value_core::history::{CsvHistoryLog, HistoryLog, HistoryRecord};
use intrinsic_value_core::ValuationResult;

/// Settings shared by every subcommand.
pub struct RunContext {
    pub history: PathBuf,
    pub record: bool,
}

impl RunContext {
    /// Append a successful valuation to the history log, unless disabled,
    /// and hand it back for output.
    pub fn record(&self, result: &ValuationResult) -> Result<Value, Box<dyn std::error::Error>> {
        if self.record {
            let mut log = CsvHistoryLog::new(&self.history);
            let record =
                HistoryRecord::from_result(&result.company, result, Local::now().naive_local());
            log.append(record)?;
            tracing::debug!(path = %self.history.display(), "valuation recorded");
        }
        Ok(serde_json::to_value(result)?)
    }

    pub fn history_log(&self) -> CsvHistoryLog {
        CsvHistoryLog::new(&self.history)
    }
}
