use serde_json::Value;

use risk_monitor_core::ScoringConfig;

pub fn run_config(config: &ScoringConfig) -> Result<Value, Box<dyn std::error::Error>> {
    config.validate()?;
    Ok(serde_json::to_value(config)?)
}
