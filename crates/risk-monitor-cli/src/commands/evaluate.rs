use chrono::{DateTime, Utc};
use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use risk_monitor_core::{CustomerRecord, Dataset, RiskScore, ScoringConfig};

use super::{build_engine, read_input};

/// Arguments for customer evaluation
#[derive(Args)]
pub struct EvaluateArgs {
    /// Path to a dataset or single customer record (JSON)
    #[arg(long)]
    pub input: Option<String>,

    /// Score only this customer
    #[arg(long)]
    pub customer: Option<String>,

    /// Evaluation instant, RFC 3339 (default: now)
    #[arg(long)]
    pub as_of: Option<DateTime<Utc>>,

    /// OSINT lookup timeout in milliseconds (default from config)
    #[arg(long)]
    pub osint_timeout_ms: Option<u64>,

    /// Customers scored concurrently
    #[arg(long, default_value = "8")]
    pub concurrency: usize,
}

/// A dataset file or a single record; both are accepted wherever customers
/// are read.
#[derive(Deserialize)]
#[serde(untagged)]
enum CustomerInput {
    Dataset(Dataset),
    Record(Box<CustomerRecord>),
}

pub fn read_dataset(path: Option<&str>) -> Result<Dataset, Box<dyn std::error::Error>> {
    let dataset = match read_input::<CustomerInput>(path, "a dataset or customer record")? {
        CustomerInput::Dataset(d) => d,
        CustomerInput::Record(r) => Dataset {
            customers: vec![*r],
        },
    };
    if dataset.customers.is_empty() {
        return Err("Input contains no customers".into());
    }
    Ok(dataset)
}

/// Evaluate every customer of `dataset`, keeping successes and failures.
pub async fn evaluate_all(
    dataset: Dataset,
    config: ScoringConfig,
    as_of: DateTime<Utc>,
    concurrency: usize,
) -> Result<(Vec<RiskScore>, Vec<Value>), Box<dyn std::error::Error>> {
    let ids = dataset.customer_ids();
    let engine = build_engine(dataset, config)?;
    let results = engine.evaluate_many_at(&ids, as_of, concurrency).await;

    let mut scores = Vec::new();
    let mut errors = Vec::new();
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(score) => scores.push(score),
            Err(e) => {
                warn!(customer = %id, error = %e, "customer not scored");
                errors.push(json!({ "customer_id": id, "error": e.to_string() }));
            }
        }
    }
    Ok((scores, errors))
}

pub async fn run_evaluate(
    args: EvaluateArgs,
    mut config: ScoringConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(ms) = args.osint_timeout_ms {
        config.osint.timeout_ms = ms;
    }
    let as_of = args.as_of.unwrap_or_else(Utc::now);
    let dataset = read_dataset(args.input.as_deref())?;

    let single = match args.customer {
        Some(id) => Some(id),
        None if dataset.customers.len() == 1 => Some(dataset.customers[0].customer.id.clone()),
        None => None,
    };
    if let Some(id) = single {
        let engine = build_engine(dataset, config)?;
        let score = engine.evaluate_at(&id, as_of).await?;
        return Ok(serde_json::to_value(score)?);
    }

    let (scores, errors) = evaluate_all(dataset, config, as_of, args.concurrency).await?;
    Ok(json!({
        "results": scores,
        "errors": errors,
    }))
}
