use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use risk_monitor_core::explain::material_factors;
use risk_monitor_core::ScoringConfig;

use super::{read_score, ScoreArgs};

/// Arguments for re-rendering an explanation
#[derive(Args)]
pub struct ExplainArgs {
    /// Path to a RiskScore JSON file
    #[arg(long)]
    pub input: Option<String>,

    /// Minimum impact on the combined score, in points (default from config)
    #[arg(long)]
    pub materiality: Option<Decimal>,
}

pub fn run_explain(
    args: ExplainArgs,
    config: &ScoringConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let score = read_score(&ScoreArgs { input: args.input })?;
    let materiality = args.materiality.unwrap_or(config.explain.materiality);
    if materiality < Decimal::ZERO {
        return Err("--materiality must be non-negative".into());
    }

    let factors = material_factors(&score, materiality);
    let explanation: Vec<&str> = factors.iter().map(|f| f.statement.as_str()).collect();
    Ok(json!({
        "customer_id": score.customer_id,
        "combined_value": score.combined_value,
        "tier": score.tier,
        "explanation": explanation,
        "results": factors,
    }))
}
