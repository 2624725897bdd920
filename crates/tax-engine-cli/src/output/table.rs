use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten, format_scalar, result_of};

/// Format output as tables using the tabled crate: one field/value table
/// for the scalars, then one table per row set.
pub fn print_table(value: &Value) {
    let flat = flatten(result_of(value));

    if !flat.fields.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in &flat.fields {
            builder.push_record([key.as_str(), &format_scalar(val)]);
        }
        println!("{}", Table::from(builder));
    }

    for (path, rows) in &flat.row_sets {
        println!("\n{}:", path);
        print_rows(rows);
    }

    if let Some(envelope) = value.as_object() {
        print_envelope_notes(envelope);
    }
}

fn print_rows(rows: &[Map<String, Value>]) {
    let Some(first) = rows.first() else {
        println!("(empty)");
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| row.get(h.as_str()).map(format_scalar).unwrap_or_default())
            .collect();
        builder.push_record(cells);
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
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

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
