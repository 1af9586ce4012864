//! Recommended follow-up actions for a scored customer.
//!
//! Base actions follow the tier; specific findings in the trace (a sanctions
//! hit, structuring, PEP exposure, offshore flows) add targeted steps.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{OsintSignalType, RiskScore, RiskTier, SubScore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionUrgency {
    Immediate,
    Urgent,
    Required,
    Review,
    Verify,
    Monitor,
    Consider,
    Schedule,
    Document,
}

impl fmt::Display for ActionUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionUrgency::Immediate => "IMMEDIATE",
            ActionUrgency::Urgent => "URGENT",
            ActionUrgency::Required => "REQUIRED",
            ActionUrgency::Review => "REVIEW",
            ActionUrgency::Verify => "VERIFY",
            ActionUrgency::Monitor => "MONITOR",
            ActionUrgency::Consider => "CONSIDER",
            ActionUrgency::Schedule => "SCHEDULE",
            ActionUrgency::Document => "DOCUMENT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub urgency: ActionUrgency,
    pub action: String,
    /// The finding that triggered this action.
    pub reason: String,
}

impl RecommendedAction {
    fn new(urgency: ActionUrgency, action: &str, reason: impl Into<String>) -> Self {
        Self {
            urgency,
            action: action.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.urgency, self.action)
    }
}

fn factor_points(subscore: &SubScore, name: &str) -> Decimal {
    subscore
        .factors
        .iter()
        .find(|f| f.name == name)
        .map(|f| f.points)
        .unwrap_or(Decimal::ZERO)
}

fn tier_actions(score: &RiskScore) -> Vec<RecommendedAction> {
    use ActionUrgency::*;
    let reason = format!(
        "{} risk tier (combined score {})",
        score.tier,
        score.combined_value.round_dp(2)
    );
    let steps: &[(ActionUrgency, &str)] = match score.tier {
        RiskTier::Critical => &[
            (Immediate, "Freeze account and halt all transactions"),
            (Urgent, "Notify compliance team within 2 hours"),
            (Required, "Enhanced due diligence review"),
            (Schedule, "Risk reassessment every 30 days"),
        ],
        RiskTier::High => &[
            (Urgent, "Escalate to compliance for review"),
            (Required, "Enhanced due diligence review"),
            (Monitor, "Enhanced transaction monitoring for 90 days"),
            (Schedule, "Risk reassessment every 60 days"),
        ],
        RiskTier::Medium => &[
            (Monitor, "Enhanced transaction monitoring"),
            (Schedule, "Account review in 90 days"),
        ],
        RiskTier::Low => &[
            (Monitor, "Standard account monitoring"),
            (Review, "Regular risk assessment"),
        ],
    };
    steps
        .iter()
        .map(|(urgency, action)| RecommendedAction::new(*urgency, action, reason.clone()))
        .collect()
}

fn finding_actions(score: &RiskScore) -> Vec<RecommendedAction> {
    use ActionUrgency::*;
    let mut out = Vec::new();
    let osint = &score.osint_adjustment;
    let aml = &score.aml_subscore;

    if osint.has_signal(OsintSignalType::Sanctions) {
        out.push(RecommendedAction::new(
            Immediate,
            "Freeze account and escalate possible sanctions match",
            "OSINT sanctions signal",
        ));
    }
    if factor_points(aml, "structuring") > Decimal::ZERO {
        out.push(RecommendedAction::new(
            Consider,
            "SAR filing if investigation confirms structuring",
            "Structured transactions below the reporting threshold",
        ));
    }
    if osint.has_signal(OsintSignalType::Pep) {
        out.push(RecommendedAction::new(
            Review,
            "PEP due diligence documentation and senior management approval",
            "Politically exposed person signal",
        ));
    }
    if osint.has_signal(OsintSignalType::AdverseMedia) {
        out.push(RecommendedAction::new(
            Review,
            "Adverse media findings with the investigations team",
            "OSINT adverse media signal",
        ));
    }
    if factor_points(aml, "offshore_counterparties") > Decimal::ZERO {
        out.push(RecommendedAction::new(
            Verify,
            "Source of funds for offshore transfers",
            "Counterparties in offshore jurisdictions",
        ));
    }
    if factor_points(aml, "high_risk_merchants") > Decimal::ZERO {
        out.push(RecommendedAction::new(
            Verify,
            "Business purpose of high-risk merchant activity",
            "Payments to high-risk merchant categories",
        ));
    }
    if factor_points(&score.credit_subscore, "credit_utilization") >= Decimal::from(80) {
        out.push(RecommendedAction::new(
            Review,
            "Credit limit and account terms",
            "Credit utilization at or above 80%",
        ));
    }
    out
}

/// Tier actions followed by finding-specific ones, most urgent first.
/// Stable within an urgency, so the order is deterministic.
pub fn recommend_actions(score: &RiskScore) -> Vec<RecommendedAction> {
    let mut actions = tier_actions(score);
    for action in finding_actions(score) {
        if !actions.iter().any(|a| a.action == action.action) {
            actions.push(action);
        }
    }
    actions.push(RecommendedAction::new(
        ActionUrgency::Document,
        "All findings in the customer risk profile",
        "Audit trail",
    ));
    actions.sort_by_key(|a| a.urgency);
    actions
}
