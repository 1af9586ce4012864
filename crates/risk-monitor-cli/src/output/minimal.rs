use serde_json::Value;

/// Key fields in order of priority.
const PRIORITY_KEYS: [&str; 6] = [
    "combined_value",
    "statement",
    "message",
    "action",
    "average_combined",
    "tier",
];

/// Print just the key answer value from the output.
///
/// Lists print one line per entry, prefixed with the customer id when the
/// entry carries one.
pub fn print_minimal(value: &Value) {
    let map = match value {
        Value::Object(map) => map,
        _ => {
            println!("{}", format_minimal(value));
            return;
        }
    };

    if let Some(Value::Array(results)) = map.get("results") {
        for item in results {
            println!("{}", minimal_line(item));
        }
        return;
    }

    let result_obj = map.get("result").unwrap_or(value);
    println!("{}", minimal_line(result_obj));
}

fn minimal_line(value: &Value) -> String {
    let Value::Object(map) = value else {
        return format_minimal(value);
    };

    let key_value = PRIORITY_KEYS
        .iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
        .map(format_minimal);

    match (key_value, map.get("customer_id").and_then(Value::as_str)) {
        (Some(v), Some(id)) => match map.get("tier").and_then(Value::as_str) {
            Some(tier) if map.contains_key("combined_value") => format!("{id} {v} {tier}"),
            _ => format!("{id} {v}"),
        },
        (Some(v), None) => v,
        (None, _) => match map.iter().next() {
            Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
            None => String::new(),
        },
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
