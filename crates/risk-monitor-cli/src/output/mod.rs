pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{json, Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// A serialized RiskScore, recognised by its sub-score fields.
pub fn is_score(map: &Map<String, Value>) -> bool {
    map.contains_key("combined_value") && map.contains_key("credit_subscore")
}

/// One-line summary of a serialized RiskScore; other values pass through.
pub fn score_row(value: &Value) -> Value {
    match value {
        Value::Object(map) if is_score(map) => json!({
            "customer_id": map.get("customer_id").cloned().unwrap_or(Value::Null),
            "combined_value": map.get("combined_value").cloned().unwrap_or(Value::Null),
            "tier": map.get("tier").cloned().unwrap_or(Value::Null),
            "credit": value.pointer("/credit_subscore/value").cloned().unwrap_or(Value::Null),
            "aml": value.pointer("/aml_subscore/value").cloned().unwrap_or(Value::Null),
            "osint": value.pointer("/osint_adjustment/value").cloned().unwrap_or(Value::Null),
        }),
        other => other.clone(),
    }
}

/// Flatten the factor trace of a serialized RiskScore into rows of
/// `[source, factor, raw_value, points, weight, contribution]`.
pub fn factor_rows(score: &Value) -> Vec<[String; 6]> {
    let mut rows = Vec::new();
    for (source, key) in [("credit", "credit_subscore"), ("aml", "aml_subscore")] {
        if let Some(Value::Array(factors)) = score.pointer(&format!("/{key}/factors")) {
            for f in factors {
                rows.push([
                    source.to_string(),
                    scalar(&f["name"]),
                    scalar(&f["raw_value"]),
                    scalar(&f["points"]),
                    scalar(&f["weight"]),
                    scalar(&f["contribution"]),
                ]);
            }
        }
    }
    if let Some(Value::Array(contributions)) = score.pointer("/osint_adjustment/contributions") {
        for c in contributions {
            rows.push([
                "osint".to_string(),
                scalar(&c["signal_type"]),
                scalar(&c["confidence"]),
                scalar(&c["max_contribution"]),
                String::new(),
                scalar(&c["contribution"]),
            ]);
        }
    }
    rows
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
