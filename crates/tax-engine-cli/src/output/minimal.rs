use serde_json::Value;

use super::{format_scalar, result_of};

/// Headline fields in priority order. A comparison answers with the better
/// regime, an analysis with total tax; a simulation prints its points.
const PRIORITY_KEYS: [&str; 4] = ["better_regime", "total_tax", "simulations", "rule_sets"];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    for key in PRIORITY_KEYS {
        if let Some(found) = find_shallowest(result, key) {
            if !found.is_null() {
                println!("{}", render(found));
                return;
            }
        }
    }

    // Fall back to first field
    if let Value::Object(map) = result {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, render(val));
            return;
        }
    }

    println!("{}", render(result));
}

/// Breadth-first search through nested objects, so a top-level
/// `better_regime` wins over totals buried inside each side.
fn find_shallowest<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let mut level: Vec<&Value> = vec![value];
    while !level.is_empty() {
        let mut next = Vec::new();
        for v in level {
            if let Value::Object(map) = v {
                if let Some(found) = map.get(key) {
                    return Some(found);
                }
                next.extend(map.values().filter(|c| c.is_object()));
            }
        }
        level = next;
    }
    None
}

fn render(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
        _ => format_scalar(value),
    }
}
