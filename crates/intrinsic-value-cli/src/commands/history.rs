use clap::Args;
use serde_json::{json, Value};
use std::path::PathBuf;

use intrinsic_value_core::history::{export_to_path, HistoryLog, EXPORT_SHEET_NAME};

use super::RunContext;

/// Arguments for printing the history log
#[derive(Args)]
pub struct HistoryArgs {
    /// Show only the most recent N records
    #[arg(long)]
    pub last: Option<usize>,
}

/// Arguments for exporting the history log
#[derive(Args)]
pub struct ExportArgs {
    /// Target file, or a directory to write Valuations.csv into
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
}

pub fn run_history(args: HistoryArgs, ctx: &RunContext) -> Result<Value, Box<dyn std::error::Error>> {
    let mut records = ctx.history_log().records()?;
    if let Some(n) = args.last {
        let skip = records.len().saturating_sub(n);
        records.drain(..skip);
    }
    Ok(serde_json::to_value(records)?)
}

pub fn run_export(args: ExportArgs, ctx: &RunContext) -> Result<Value, Box<dyn std::error::Error>> {
    let records = ctx.history_log().records()?;
    let target = export_to_path(&records, &args.path)?;
    tracing::debug!(path = %target.display(), rows = records.len(), "history exported");

    Ok(json!({
        "sheet": EXPORT_SHEET_NAME,
        "path": target.display().to_string(),
        "rows": records.len(),
    }))
}
