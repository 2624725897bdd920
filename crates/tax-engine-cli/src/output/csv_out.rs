use serde_json::{Map, Value};
use std::io;

use super::{flatten, format_scalar, result_of};

/// Write output as CSV to stdout.
///
/// A result with exactly one row set and no other data worth keeping (a
/// simulation) is written as that table. Anything else is written as
/// two-column field,value records, with row-set members addressed as
/// `path[index].column`.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let flat = flatten(result_of(value));

    if let [(_, rows)] = flat.row_sets.as_slice() {
        if flat.fields.len() <= 2 {
            write_rows(&mut wtr, rows);
            let _ = wtr.flush();
            return;
        }
    }

    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in &flat.fields {
        let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
    }
    for (path, rows) in &flat.row_sets {
        for (i, row) in rows.iter().enumerate() {
            for (column, val) in row {
                let _ = wtr.write_record([format!("{path}[{i}].{column}"), format_scalar(val)]);
            }
        }
    }
    let _ = wtr.flush();
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Map<String, Value>]) {
    let Some(first) = rows.first() else {
        return;
    };
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for row in rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(*h).map(format_scalar).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&record);
    }
}
