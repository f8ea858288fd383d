pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use intrinsic_value_core::format_iv;
use intrinsic_value_core::history::HISTORY_COLUMNS;

use crate::OutputFormat;

/// Fields printed as entered even when they happen to parse as a number.
const TEXT_FIELDS: [&str; 6] = [
    "company",
    "model_name",
    "methodology",
    "label",
    "Company",
    "Model",
];

/// Dispatch output to the appropriate formatter.
pub fn format_output(
    format: &OutputFormat,
    value: &Value,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => json::print_json(value)?,
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value)?,
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
    Ok(())
}

/// Decimal strings rounded to the 4 dp used for display; anything else as
/// plain text.
pub fn format_decimal(value: &Value) -> String {
    match value {
        Value::String(s) => match Decimal::from_str(s) {
            Ok(d) => format_iv(d).to_string(),
            Err(_) => s.clone(),
        },
        _ => format_plain(value),
    }
}

/// Format the value of `key`: text fields verbatim, everything else through
/// [`format_decimal`].
pub fn format_field(key: &str, value: &Value) -> String {
    if TEXT_FIELDS.contains(&key) {
        format_plain(value)
    } else {
        format_decimal(value)
    }
}

/// Column order for a list of rows: the history log's own order for log
/// records, otherwise the keys of the first row.
pub fn columns(first: &Map<String, Value>) -> Vec<&str> {
    if HISTORY_COLUMNS.iter().all(|c| first.contains_key(*c)) {
        HISTORY_COLUMNS.to_vec()
    } else {
        first.keys().map(String::as_str).collect()
    }
}

pub fn format_plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_plain).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}
