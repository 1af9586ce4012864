use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{factor_rows, is_score, score_row};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) if is_score(map) => print_score(value, map),
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else if let Some(Value::Array(results)) = map.get("results") {
                print_results(results, map);
            } else {
                print_flat_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_score(score: &Value, map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let tier = map.get("tier").and_then(Value::as_str).unwrap_or_default();
    for (label, pointer) in [
        ("customer", "/customer_id"),
        ("combined", "/combined_value"),
        ("credit", "/credit_subscore/value"),
        ("aml", "/aml_subscore/value"),
        ("osint", "/osint_adjustment/value"),
        ("generated_at", "/generated_at"),
    ] {
        let v = score.pointer(pointer).map(format_value).unwrap_or_default();
        builder.push_record([label.to_string(), v]);
    }
    builder.push_record(["tier".to_string(), tier.to_uppercase()]);
    println!("{}", Table::from(builder));

    let rows = factor_rows(score);
    if !rows.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Source", "Factor", "Raw", "Points", "Weight", "Contribution"]);
        for row in rows {
            builder.push_record(row);
        }
        println!("\n{}", Table::from(builder));
    }

    if let Some(Value::Array(lines)) = map.get("explanation") {
        if !lines.is_empty() {
            println!("\nExplanation:");
            for line in lines {
                println!("  - {}", format_value(line));
            }
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_flat_object(res_map),
        _ => print_flat_object(envelope),
    }
    print_notes("Warnings", envelope.get("warnings"));
}

fn print_results(results: &[Value], envelope: &Map<String, Value>) {
    let header: Map<String, Value> = envelope
        .iter()
        .filter(|(_, v)| !v.is_array() && !v.is_object())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if !header.is_empty() {
        print_flat_object(&header);
        println!();
    }

    let rows: Vec<Value> = results.iter().map(score_row).collect();
    print_array_table(&rows);

    if let Some(Value::Array(errors)) = envelope.get("errors") {
        if !errors.is_empty() {
            println!("\nNot scored:");
            print_array_table(errors);
        }
    }
}

fn print_notes(title: &str, notes: Option<&Value>) {
    if let Some(Value::Array(notes)) = notes {
        if !notes.is_empty() {
            println!("\n{}:", title);
            for n in notes {
                println!("  - {}", format_value(n));
            }
        }
    }
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Headers come from the first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
