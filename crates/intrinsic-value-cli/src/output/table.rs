use serde_json::Value;
use tabled::{Table, builder::Builder};

use super::{columns, format_decimal, format_field, format_plain};

/// Headline fields of a valuation result, in display order.
const VALUATION_FIELDS: [(&str, &str); 5] = [
    ("company", "Company"),
    ("model_name", "Model"),
    ("intrinsic_value_per_share", "IV per share"),
    ("margin_of_safety_low", "Margin of safety (low)"),
    ("margin_of_safety_high", "Margin of safety (high)"),
];

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            // Check if "result" key holds the primary data
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else if let Some(Value::Array(trace)) = map.get("trace") {
                print_valuation_table(map, trace);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    // Print the result section
    if let Value::Object(res_map) = result {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in res_map {
            builder.push_record([key.as_str(), &format_field(key, val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
    }

    print_notes(envelope);
}

fn print_valuation_table(map: &serde_json::Map<String, Value>, trace: &[Value]) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, label) in VALUATION_FIELDS {
        if let Some(val) = map.get(key) {
            builder.push_record([label.to_string(), format_field(key, val)]);
        }
    }
    println!("{}", Table::from(builder));

    let mut steps = Builder::default();
    steps.push_record(["Step", "Value"]);
    for entry in trace {
        let label = entry.get("label").map(format_plain).unwrap_or_default();
        let value = entry.get("value").map(format_decimal).unwrap_or_default();
        steps.push_record([label, value]);
    }
    println!("\n{}", Table::from(steps));

    print_notes(map);
}

fn print_notes(envelope: &serde_json::Map<String, Value>) {
    // Print warnings if any
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    // Print methodology
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_field(key, val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers = columns(first);
        let mut builder = Builder::default();
        builder.push_record(headers.iter().copied());

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(|v| format_field(h, v)).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        // Simple array of values
        for item in arr {
            println!("{}", format_decimal(item));
        }
    }
}
