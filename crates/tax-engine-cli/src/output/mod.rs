pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// A result object split into scalar fields and row sets.
///
/// Nested objects become dotted field names (`tax_breakdown.cess`); arrays of
/// objects (deduction lines, risk signals, simulation points) become row
/// sets keyed by their dotted path.
#[derive(Debug, Default)]
pub struct Flattened {
    pub fields: Vec<(String, Value)>,
    pub row_sets: Vec<(String, Vec<Map<String, Value>>)>,
}

pub fn flatten(value: &Value) -> Flattened {
    let mut out = Flattened::default();
    flatten_into(&mut out, "", value);
    out
}

fn flatten_into(out: &mut Flattened, path: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                flatten_into(out, &child, val);
            }
        }
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            let rows = items.iter().filter_map(|v| v.as_object().cloned()).collect();
            out.row_sets.push((path.to_string(), rows));
        }
        _ => out.fields.push((path.to_string(), value.clone())),
    }
}

/// Scalar rendering shared by the text formatters.
pub fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_scalar).collect::<Vec<_>>().join("; "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// The `result` payload of an envelope, or the value itself.
pub fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_result() {
        let value = json!({
            "tax_calculation": {
                "total_tax": "111800.00",
                "tax_breakdown": {"cess": "4300.00"},
                "deduction_details": [
                    {"section_code": "80C", "allowed": "150000"}
                ]
            },
            "fraud_analysis": {"flags": []}
        });
        let flat = flatten(&value);
        let names: Vec<&str> = flat.fields.iter().map(|(k, _)| k.as_str()).collect();
        assert!(names.contains(&"tax_calculation.total_tax"));
        assert!(names.contains(&"tax_calculation.tax_breakdown.cess"));
        assert!(names.contains(&"fraud_analysis.flags"));
        assert_eq!(flat.row_sets.len(), 1);
        assert_eq!(flat.row_sets[0].0, "tax_calculation.deduction_details");
    }

    #[test]
    fn test_result_of_unwraps_envelope() {
        let value = json!({"result": {"a": 1}, "warnings": []});
        assert_eq!(result_of(&value), &json!({"a": 1}));
        let bare = json!({"a": 1});
        assert_eq!(result_of(&bare), &bare);
    }
}
