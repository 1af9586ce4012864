use serde_json::{json, Value};

use risk_monitor_core::alerts::raise_alerts;
use risk_monitor_core::ScoringConfig;

use super::{read_score, ScoreArgs};

pub fn run_alerts(
    args: ScoreArgs,
    config: &ScoringConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let score = read_score(&args)?;
    let alerts = raise_alerts(&score, &config.alerts, &config.tiers);
    Ok(json!({
        "customer_id": score.customer_id,
        "tier": score.tier,
        "results": alerts,
    }))
}
