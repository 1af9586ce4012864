use chrono::{DateTime, Utc};
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use risk_monitor_core::explain::explain;
use risk_monitor_core::portfolio::{self, ListQuery};
use risk_monitor_core::scoring::assess_record;
use risk_monitor_core::{CustomerRecord, RiskScore, ScoringConfig};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_config(config_json: Option<String>) -> NapiResult<ScoringConfig> {
    match config_json {
        Some(json) => ScoringConfig::from_json(&json).map_err(to_napi_error),
        None => Ok(ScoringConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score one customer record as of an RFC 3339 instant.
#[napi]
pub fn assess_customer(
    record_json: String,
    config_json: Option<String>,
    as_of: String,
) -> NapiResult<String> {
    let record: CustomerRecord = serde_json::from_str(&record_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let as_of: DateTime<Utc> = as_of.parse().map_err(to_napi_error)?;
    let score = assess_record(&record, &config, as_of).map_err(to_napi_error)?;
    serde_json::to_string(&score).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[napi]
pub fn explain_score(score_json: String, materiality: Option<String>) -> NapiResult<String> {
    let score: RiskScore = serde_json::from_str(&score_json).map_err(to_napi_error)?;
    let materiality = match materiality {
        Some(m) => m.parse::<Decimal>().map_err(to_napi_error)?,
        None => ScoringConfig::default().explain.materiality,
    };
    serde_json::to_string(&explain(&score, materiality)).map_err(to_napi_error)
}

#[napi]
pub fn recommend_actions(score_json: String) -> NapiResult<String> {
    let score: RiskScore = serde_json::from_str(&score_json).map_err(to_napi_error)?;
    let actions = risk_monitor_core::actions::recommend_actions(&score);
    serde_json::to_string(&actions).map_err(to_napi_error)
}

/// Filter and page an array of stored scores. `query_json` follows
/// `ListQuery`; omitted fields take their defaults.
#[napi]
pub fn list_customers(scores_json: String, query_json: Option<String>) -> NapiResult<String> {
    let scores: Vec<RiskScore> = serde_json::from_str(&scores_json).map_err(to_napi_error)?;
    let query: ListQuery = match query_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error)?,
        None => ListQuery::default(),
    };
    serde_json::to_string(&portfolio::list_customers(&scores, &query)).map_err(to_napi_error)
}
