//! Risk alerts raised from a RiskScore.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{AlertConfig, TierThresholds};
use crate::types::{OsintSignalType, OsintStatus, RiskScore, RiskTier, SubScoreKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Credit,
    Aml,
    Osint,
    Combined,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertType::Credit => "CREDIT",
            AlertType::Aml => "AML",
            AlertType::Osint => "OSINT",
            AlertType::Combined => "COMBINED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    pub customer_id: String,
    pub alert_type: AlertType,
    pub severity: RiskTier,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

fn alert(
    score: &RiskScore,
    alert_type: AlertType,
    severity: RiskTier,
    message: String,
) -> RiskAlert {
    RiskAlert {
        customer_id: score.customer_id.clone(),
        alert_type,
        severity,
        message,
        raised_at: score.generated_at,
    }
}

/// Alerts for every score at or above the floor plus OSINT findings.
///
/// Severity uses the same cut points as the combined tier, so a sub-score of
/// 90 raises a CRITICAL alert even when the combined score is lower.
pub fn raise_alerts(
    score: &RiskScore,
    config: &AlertConfig,
    tiers: &TierThresholds,
) -> Vec<RiskAlert> {
    let mut alerts = Vec::new();

    for kind in [SubScoreKind::Credit, SubScoreKind::Aml] {
        let value = score.subscore(kind).value;
        if value >= config.floor {
            let alert_type = match kind {
                SubScoreKind::Credit => AlertType::Credit,
                SubScoreKind::Aml => AlertType::Aml,
            };
            let top = score
                .subscore(kind)
                .factors
                .iter()
                .max_by(|a, b| {
                    a.contribution
                        .cmp(&b.contribution)
                        .then_with(|| b.name.cmp(&a.name))
                })
                .map(|f| format!(", driven by {}", f.name.replace('_', " ")))
                .unwrap_or_default();
            alerts.push(alert(
                score,
                alert_type,
                tiers.tier_for(value),
                format!("{} sub-score {}{}", alert_type, value.round_dp(2).normalize(), top),
            ));
        }
    }

    let osint = &score.osint_adjustment;
    for c in &osint.contributions {
        let severity = match c.signal_type {
            OsintSignalType::Sanctions => RiskTier::Critical,
            OsintSignalType::AdverseMedia | OsintSignalType::Pep => RiskTier::High,
            _ => continue,
        };
        if c.contribution <= Decimal::ZERO {
            continue;
        }
        alerts.push(alert(
            score,
            AlertType::Osint,
            severity,
            format!(
                "{} reported by {} with confidence {}",
                c.signal_type.label(),
                c.source,
                c.confidence.normalize()
            ),
        ));
    }
    if let OsintStatus::Unavailable { reason } = &osint.status {
        alerts.push(alert(
            score,
            AlertType::Osint,
            RiskTier::Low,
            format!("OSINT enrichment unavailable: {reason}"),
        ));
    }

    if score.combined_value >= config.floor {
        alerts.push(alert(
            score,
            AlertType::Combined,
            score.tier,
            format!(
                "Combined risk score {} ({})",
                score.combined_value.round_dp(2).normalize(),
                score.tier
            ),
        ));
    }

    alerts.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.alert_type.cmp(&b.alert_type))
    });
    alerts
}
