//! Views over many scored customers.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::explain::{material_factors, FactorSource};
use crate::types::{OsintStatus, Points, RiskScore, RiskTier};

/// Factors reported in a portfolio summary.
const SUMMARY_TOP_FACTORS: usize = 5;

fn by_risk(a: &&RiskScore, b: &&RiskScore) -> std::cmp::Ordering {
    b.combined_value
        .cmp(&a.combined_value)
        .then_with(|| a.customer_id.cmp(&b.customer_id))
}

/// Customers at or above `min_score`, highest combined value first (ties by
/// customer id), truncated to `limit`.
pub fn risky_customers(scores: &[RiskScore], min_score: Points, limit: usize) -> Vec<&RiskScore> {
    let mut risky: Vec<&RiskScore> = scores
        .iter()
        .filter(|s| s.combined_value >= min_score)
        .collect();
    risky.sort_by(by_risk);
    risky.truncate(limit);
    risky
}

/// Filter and page for [`list_customers`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    /// Case-insensitive substring of the customer name or id.
    pub search: Option<String>,
    pub tier: Option<RiskTier>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            tier: None,
            offset: 0,
            limit: 100,
        }
    }
}

impl ListQuery {
    fn matches(&self, score: &RiskScore) -> bool {
        if let Some(tier) = self.tier {
            if score.tier != tier {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                score.customer_name.to_lowercase().contains(&needle)
                    || score.customer_id.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

/// One page of scores matching `query`, in the same order as
/// [`risky_customers`].
pub fn list_customers<'a>(scores: &'a [RiskScore], query: &ListQuery) -> Vec<&'a RiskScore> {
    let mut matching: Vec<&RiskScore> = scores.iter().filter(|s| query.matches(s)).collect();
    matching.sort_by(by_risk);
    matching
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect()
}

/// A trace factor aggregated across a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactorTotal {
    pub source: FactorSource,
    pub name: String,
    /// Sum of the points this factor added to combined scores.
    pub total_impact: Points,
    /// Customers where the factor was material.
    pub customers: usize,
}

/// Factors that added the most risk across `scores`, largest total first.
/// Only positive impacts above `materiality` count.
pub fn top_risk_factors(
    scores: &[RiskScore],
    materiality: Points,
    count: usize,
) -> Vec<RiskFactorTotal> {
    let mut totals: BTreeMap<(FactorSource, String), (Points, usize)> = BTreeMap::new();
    for score in scores {
        for factor in material_factors(score, materiality) {
            if factor.impact <= Decimal::ZERO {
                continue;
            }
            let entry = totals
                .entry((factor.source, factor.name))
                .or_insert((Decimal::ZERO, 0));
            entry.0 += factor.impact;
            entry.1 += 1;
        }
    }

    let mut top: Vec<RiskFactorTotal> = totals
        .into_iter()
        .map(|((source, name), (total, customers))| RiskFactorTotal {
            source,
            name,
            total_impact: total.round_dp(4),
            customers,
        })
        .collect();
    top.sort_by(|a, b| {
        b.total_impact
            .cmp(&a.total_impact)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.name.cmp(&b.name))
    });
    top.truncate(count);
    top
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl TierCounts {
    fn add(&mut self, tier: RiskTier) {
        match tier {
            RiskTier::Low => self.low += 1,
            RiskTier::Medium => self.medium += 1,
            RiskTier::High => self.high += 1,
            RiskTier::Critical => self.critical += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_customers: usize,
    pub tier_counts: TierCounts,
    pub average_combined: Points,
    pub max_combined: Points,
    /// Customers whose OSINT adjustment was applied from at least one signal.
    pub with_external_signals: usize,
    /// High and critical customers.
    pub flagged: usize,
    pub top_risk_factors: Vec<RiskFactorTotal>,
}

pub fn summarize(scores: &[RiskScore]) -> PortfolioSummary {
    let mut tier_counts = TierCounts::default();
    let mut total = Decimal::ZERO;
    let mut max_combined = Decimal::ZERO;
    let mut with_external_signals = 0;

    for s in scores {
        tier_counts.add(s.tier);
        total += s.combined_value;
        max_combined = max_combined.max(s.combined_value);
        if s.osint_adjustment.status == OsintStatus::Applied {
            with_external_signals += 1;
        }
    }

    let average_combined = if scores.is_empty() {
        Decimal::ZERO
    } else {
        (total / Decimal::from(scores.len() as u64)).round_dp(2)
    };

    PortfolioSummary {
        total_customers: scores.len(),
        flagged: tier_counts.high + tier_counts.critical,
        tier_counts,
        average_combined,
        max_combined,
        with_external_signals,
        top_risk_factors: top_risk_factors(scores, Decimal::ZERO, SUMMARY_TOP_FACTORS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CombinerWeights, TierThresholds};
    use crate::types::{ContributingFactor, OsintAdjustment, SubScore, SubScoreKind};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn score(id: &str, combined: Decimal) -> RiskScore {
        RiskScore {
            customer_id: id.to_string(),
            customer_name: format!("Customer {}", id.to_uppercase()),
            combined_value: combined,
            tier: TierThresholds::default().tier_for(combined),
            confidence: Decimal::ZERO,
            credit_subscore: SubScore::neutral(SubScoreKind::Credit),
            aml_subscore: SubScore::neutral(SubScoreKind::Aml),
            osint_adjustment: OsintAdjustment::no_external_signal(),
            weights: CombinerWeights::default(),
            explanation: Vec::new(),
            generated_at: Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap(),
        }
    }

    fn book() -> Vec<RiskScore> {
        let mut scores = vec![
            score("c1", dec!(12)),
            score("c2", dec!(72)),
            score("c3", dec!(91)),
            score("c4", dec!(72)),
            score("c5", dec!(40)),
        ];
        scores[2].customer_name = "Maria Garcia".to_string();
        scores
    }

    fn with_aml(mut s: RiskScore, factors: Vec<ContributingFactor>) -> RiskScore {
        s.aml_subscore = SubScore::from_factors(SubScoreKind::Aml, factors);
        s
    }

    fn ids(scores: Vec<&RiskScore>) -> Vec<&str> {
        scores.iter().map(|s| s.customer_id.as_str()).collect()
    }

    #[test]
    fn test_risky_customers_sorted_and_limited() {
        let scores = book();
        assert_eq!(ids(risky_customers(&scores, dec!(40), 3)), vec!["c3", "c2", "c4"]);
    }

    #[test]
    fn test_list_searches_name_and_id_case_insensitively() {
        let scores = book();
        let by_name = ListQuery {
            search: Some("garcia".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(ids(list_customers(&scores, &by_name)), vec!["c3"]);

        let by_id = ListQuery {
            search: Some("C5".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(ids(list_customers(&scores, &by_id)), vec!["c5"]);

        let blank = ListQuery {
            search: Some("  ".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(list_customers(&scores, &blank).len(), 5);
    }

    #[test]
    fn test_list_filters_by_tier_and_pages() {
        let scores = book();
        let high = ListQuery {
            tier: Some(RiskTier::High),
            ..ListQuery::default()
        };
        assert_eq!(ids(list_customers(&scores, &high)), vec!["c2", "c4"]);

        let page = ListQuery {
            offset: 1,
            limit: 2,
            ..ListQuery::default()
        };
        assert_eq!(ids(list_customers(&scores, &page)), vec!["c2", "c4"]);

        let past_end = ListQuery {
            offset: 10,
            ..ListQuery::default()
        };
        assert!(list_customers(&scores, &past_end).is_empty());
    }

    #[test]
    fn test_top_risk_factors_aggregate_positive_impact() {
        let scores = vec![
            with_aml(
                score("c1", dec!(50)),
                vec![
                    ContributingFactor::new("structuring", dec!(0.45), dec!(5), dec!(100)),
                    ContributingFactor::new("unusual_hours", dec!(0.10), dec!(2), dec!(20)),
                ],
            ),
            with_aml(
                score("c2", dec!(40)),
                vec![ContributingFactor::new("structuring", dec!(0.45), dec!(2), dec!(40))],
            ),
        ];
        let top = top_risk_factors(&scores, Decimal::ZERO, 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "structuring");
        assert_eq!(top[0].source, FactorSource::Aml);
        assert_eq!(top[0].customers, 2);
        // 0.6 * (45 + 18)
        assert_eq!(top[0].total_impact, dec!(37.8));

        let all = top_risk_factors(&scores, Decimal::ZERO, 10);
        let names: Vec<&str> = all.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["structuring", "unusual_hours"]);
    }

    #[test]
    fn test_summary_statistics() {
        let mut scores = book();
        scores[1].osint_adjustment.status = OsintStatus::Applied;
        let summary = summarize(&scores);
        assert_eq!(
            summary,
            PortfolioSummary {
                total_customers: 5,
                tier_counts: TierCounts {
                    low: 1,
                    medium: 1,
                    high: 2,
                    critical: 1,
                },
                average_combined: dec!(57.4),
                max_combined: dec!(91),
                with_external_signals: 1,
                flagged: 3,
                top_risk_factors: Vec::new(),
            }
        );
    }

    #[test]
    fn test_empty_portfolio() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_customers, 0);
        assert_eq!(summary.average_combined, Decimal::ZERO);
    }
}
