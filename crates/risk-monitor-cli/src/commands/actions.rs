use serde_json::{json, Value};

use risk_monitor_core::actions::recommend_actions;

use super::{read_score, ScoreArgs};

pub fn run_actions(args: ScoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let score = read_score(&args)?;
    let actions = recommend_actions(&score);
    Ok(json!({
        "customer_id": score.customer_id,
        "tier": score.tier,
        "combined_value": score.combined_value,
        "results": actions,
    }))
}
