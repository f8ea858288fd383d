use serde_json::{Map, Value};
use std::io::{self, Write};

use super::{columns, format_decimal, format_field};

/// Headline fields of a valuation result, in output order.
const VALUATION_FIELDS: [&str; 6] = [
    "company",
    "model_name",
    "intrinsic_value_per_share",
    "margin_of_safety_low",
    "margin_of_safety_high",
    "methodology",
];

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) -> Result<(), csv::Error> {
    write_csv(io::stdout().lock(), value)
}

/// A valuation becomes `field,value` rows followed by its trace, a rate
/// envelope its `result` fields, and the history log one row per record.
pub fn write_csv<W: Write>(out: W, value: &Value) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(out);

    match value {
        Value::Object(map) => match (map.get("result"), map.get("trace")) {
            (Some(Value::Object(result)), _) => {
                write_fields(&mut wtr, result.iter())?;
                write_warnings(&mut wtr, map)?;
            }
            (_, Some(Value::Array(trace))) => write_valuation(&mut wtr, map, trace)?,
            _ => write_fields(&mut wtr, map.iter())?,
        },
        Value::Array(rows) => write_rows(&mut wtr, rows)?,
        other => wtr.write_record([format_decimal(other)])?,
    }

    wtr.flush()?;
    Ok(())
}

fn write_fields<'a, W: Write>(
    wtr: &mut csv::Writer<W>,
    fields: impl Iterator<Item = (&'a String, &'a Value)>,
) -> Result<(), csv::Error> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in fields.filter(|(_, v)| !v.is_array() && !v.is_object()) {
        wtr.write_record([key.as_str(), &format_field(key, val)])?;
    }
    Ok(())
}

fn write_valuation<W: Write>(
    wtr: &mut csv::Writer<W>,
    map: &Map<String, Value>,
    trace: &[Value],
) -> Result<(), csv::Error> {
    let headline = VALUATION_FIELDS
        .iter()
        .filter_map(|key| map.get_key_value(*key));
    write_fields(wtr, headline)?;

    for entry in trace {
        let label = entry.get("label").map(|v| format_field("label", v));
        let value = entry.get("value").map(format_decimal);
        wtr.write_record([label.unwrap_or_default(), value.unwrap_or_default()])?;
    }
    write_warnings(wtr, map)
}

fn write_warnings<W: Write>(
    wtr: &mut csv::Writer<W>,
    map: &Map<String, Value>,
) -> Result<(), csv::Error> {
    if let Some(Value::Array(warnings)) = map.get("warnings") {
        for warning in warnings.iter().filter_map(Value::as_str) {
            wtr.write_record(["warning", warning])?;
        }
    }
    Ok(())
}

fn write_rows<W: Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> Result<(), csv::Error> {
    let Some(Value::Object(first)) = rows.first() else {
        for row in rows {
            wtr.write_record([format_decimal(row)])?;
        }
        return Ok(());
    };

    let headers = columns(first);
    wtr.write_record(&headers)?;
    for row in rows.iter().filter_map(Value::as_object) {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(*h).map(|v| format_field(h, v)).unwrap_or_default())
            .collect();
        wtr.write_record(&record)?;
    }
    Ok(())
}
