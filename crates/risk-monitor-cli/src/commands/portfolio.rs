use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use risk_monitor_core::portfolio::{list_customers, risky_customers, summarize, ListQuery};
use risk_monitor_core::{RiskScore, RiskTier, ScoringConfig};

use super::evaluate::{evaluate_all, read_dataset};

/// Arguments for ranking risky customers
#[derive(Args)]
pub struct RiskyArgs {
    /// Path to a dataset (JSON)
    #[arg(long)]
    pub input: Option<String>,

    /// Minimum combined score (default: the HIGH cut point)
    #[arg(long)]
    pub min_score: Option<Decimal>,

    /// Maximum customers listed
    #[arg(long, default_value = "10")]
    pub limit: usize,

    /// Evaluation instant, RFC 3339 (default: now)
    #[arg(long)]
    pub as_of: Option<DateTime<Utc>>,
}

/// Arguments for portfolio statistics
#[derive(Args)]
pub struct SummaryArgs {
    /// Path to a dataset (JSON)
    #[arg(long)]
    pub input: Option<String>,

    /// Evaluation instant, RFC 3339 (default: now)
    #[arg(long)]
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TierFilter {
    Low,
    Medium,
    High,
    Critical,
}

impl From<TierFilter> for RiskTier {
    fn from(tier: TierFilter) -> Self {
        match tier {
            TierFilter::Low => RiskTier::Low,
            TierFilter::Medium => RiskTier::Medium,
            TierFilter::High => RiskTier::High,
            TierFilter::Critical => RiskTier::Critical,
        }
    }
}

/// Arguments for browsing a dataset's scores
#[derive(Args)]
pub struct ListArgs {
    /// Path to a dataset (JSON)
    #[arg(long)]
    pub input: Option<String>,

    /// Case-insensitive match on customer name or id
    #[arg(long)]
    pub search: Option<String>,

    /// Only customers in this tier
    #[arg(long, value_enum)]
    pub tier: Option<TierFilter>,

    /// Customers skipped before the page starts
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Page size
    #[arg(long, default_value = "100")]
    pub limit: usize,

    /// Evaluation instant, RFC 3339 (default: now)
    #[arg(long)]
    pub as_of: Option<DateTime<Utc>>,
}

const CONCURRENCY: usize = 8;

fn row(s: &RiskScore) -> Value {
    json!({
        "customer_id": s.customer_id,
        "customer_name": s.customer_name,
        "combined_value": s.combined_value.round_dp(2),
        "tier": s.tier,
        "credit": s.credit_subscore.value.round_dp(2),
        "aml": s.aml_subscore.value.round_dp(2),
        "osint": s.osint_adjustment.value.round_dp(2),
        "confidence": s.confidence,
        "top_reason": s.explanation.first().cloned().unwrap_or_default(),
    })
}

pub async fn run_risky(
    args: RiskyArgs,
    config: ScoringConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let min_score = args.min_score.unwrap_or(config.tiers.high);
    let as_of = args.as_of.unwrap_or_else(Utc::now);
    let dataset = read_dataset(args.input.as_deref())?;
    let (scores, errors) = evaluate_all(dataset, config, as_of, CONCURRENCY).await?;

    let rows: Vec<Value> = risky_customers(&scores, min_score, args.limit)
        .into_iter()
        .map(row)
        .collect();

    Ok(json!({
        "min_score": min_score,
        "results": rows,
        "errors": errors,
    }))
}

pub async fn run_list(
    args: ListArgs,
    config: ScoringConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let as_of = args.as_of.unwrap_or_else(Utc::now);
    let query = ListQuery {
        search: args.search,
        tier: args.tier.map(RiskTier::from),
        offset: args.offset,
        limit: args.limit,
    };
    let dataset = read_dataset(args.input.as_deref())?;
    let (scores, errors) = evaluate_all(dataset, config, as_of, CONCURRENCY).await?;

    let rows: Vec<Value> = list_customers(&scores, &query)
        .into_iter()
        .map(row)
        .collect();

    Ok(json!({
        "offset": query.offset,
        "limit": query.limit,
        "results": rows,
        "errors": errors,
    }))
}

pub async fn run_summary(
    args: SummaryArgs,
    config: ScoringConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let as_of = args.as_of.unwrap_or_else(Utc::now);
    let dataset = read_dataset(args.input.as_deref())?;
    let (scores, errors) = evaluate_all(dataset, config, as_of, CONCURRENCY).await?;

    let mut result = serde_json::to_value(summarize(&scores))?;
    if let Value::Object(map) = &mut result {
        map.insert("not_scored".to_string(), json!(errors.len()));
    }
    let warnings: Vec<String> = errors
        .iter()
        .map(|e| {
            format!(
                "{} not scored: {}",
                e["customer_id"].as_str().unwrap_or("?"),
                e["error"].as_str().unwrap_or_default()
            )
        })
        .collect();
    Ok(json!({
        "result": result,
        "warnings": warnings,
    }))
}
