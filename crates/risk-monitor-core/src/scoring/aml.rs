//! AML sub-score.
//!
//! Independent detectors over the transaction window. Each detector counts
//! the transactions it flags, the count saturates to an intensity in [0, 1],
//! and the weighted intensities are summed. The score is therefore always a
//! sum of named contributions.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, Timelike};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{AmlConfig, StructuringConfig};
use crate::error::RiskMonitorError;
use crate::types::{
    ContributingFactor, Customer, SubScore, SubScoreKind, Transaction, TransactionSet, MAX_POINTS,
};
use crate::RiskMonitorResult;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn normalize_name(j: &str) -> String {
    j.trim().to_lowercase()
}

fn normalize_category(c: &str) -> String {
    c.trim().to_lowercase().replace([' ', '-'], "_")
}

fn is_high_risk_category(category: &str, config: &AmlConfig) -> bool {
    let c = normalize_category(category);
    config
        .high_risk_merchant_categories
        .iter()
        .any(|hr| normalize_category(hr) == c)
}

fn is_offshore(jurisdiction: Option<&str>, config: &AmlConfig) -> bool {
    let Some(j) = jurisdiction else {
        return false;
    };
    let j = normalize_name(j);
    config
        .offshore_jurisdictions
        .iter()
        .any(|o| normalize_name(o) == j)
}

fn is_round_amount(t: &Transaction, unit: Decimal) -> bool {
    t.amount > unit && (t.amount % unit).is_zero()
}

fn is_night(t: &Transaction, start_hour: u32, end_hour: u32) -> bool {
    let hour = t.timestamp.hour();
    if start_hour > end_hour {
        hour >= start_hour || hour < end_hour
    } else {
        hour >= start_hour && hour < end_hour
    }
}

/// min(count / saturation, 1). Saturation is positive in a validated config.
fn intensity(count: usize, saturation: u32) -> Decimal {
    (Decimal::from(count as u64) / Decimal::from(saturation)).min(Decimal::ONE)
}

fn count_factor(name: &str, weight: Decimal, count: usize, saturation: u32) -> ContributingFactor {
    ContributingFactor::new(
        name,
        weight,
        Decimal::from(count as u64),
        intensity(count, saturation) * MAX_POINTS,
    )
}

// ---------------------------------------------------------------------------
// Detectors
// ---------------------------------------------------------------------------

/// Ids of transactions that belong to a structuring cluster.
///
/// A cluster is a run of sub-threshold transactions to the same counterparty
/// that fits inside the rolling window, has at least `min_transactions`
/// members, and sums above the reporting threshold. Members may be exactly
/// `window_hours` apart.
pub fn detect_structuring<'a>(
    transactions: &'a TransactionSet,
    config: &StructuringConfig,
) -> Vec<&'a str> {
    let window = Duration::hours(i64::from(config.window_hours));
    let min_count = config.min_transactions as usize;

    // Set order is by timestamp, so every group is already time-ordered.
    let mut by_counterparty: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.amount < config.reporting_threshold)
    {
        by_counterparty
            .entry(normalize_name(&t.counterparty))
            .or_default()
            .push(t);
    }

    let mut flagged: BTreeSet<&str> = BTreeSet::new();
    for group in by_counterparty.values() {
        let mut left = 0;
        let mut sum = Decimal::ZERO;
        for right in 0..group.len() {
            sum += group[right].amount;
            while group[right].timestamp - group[left].timestamp > window {
                sum -= group[left].amount;
                left += 1;
            }
            if right + 1 - left >= min_count && sum > config.reporting_threshold {
                flagged.extend(group[left..=right].iter().map(|t| t.id.as_str()));
            }
        }
    }

    flagged.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the AML sub-score for a customer over a transaction window.
pub fn score_aml(
    customer: &Customer,
    transactions: &TransactionSet,
    config: &AmlConfig,
) -> RiskMonitorResult<SubScore> {
    config.validate()?;
    if transactions.is_empty() {
        return Err(RiskMonitorError::InsufficientData(format!(
            "no transactions in the scoring window for customer {}",
            customer.id
        )));
    }

    let w = &config.weights;
    let sat = &config.saturation;

    let structured = detect_structuring(transactions, &config.structuring).len();
    let high_risk = transactions
        .iter()
        .filter(|t| is_high_risk_category(&t.merchant_category, config))
        .count();
    let offshore = transactions
        .iter()
        .filter(|t| is_offshore(t.counterparty_jurisdiction.as_deref(), config))
        .count();
    let cash = transactions.iter().filter(|t| t.cash_equivalent).count();
    let round = transactions
        .iter()
        .filter(|t| is_round_amount(t, config.round_amount_unit))
        .count();
    let night = transactions
        .iter()
        .filter(|t| is_night(t, config.night_start_hour, config.night_end_hour))
        .count();

    let factors = vec![
        count_factor("structuring", w.structuring, structured, sat.structuring),
        count_factor(
            "high_risk_merchants",
            w.high_risk_merchants,
            high_risk,
            sat.high_risk_merchants,
        ),
        count_factor(
            "offshore_counterparties",
            w.offshore_counterparties,
            offshore,
            sat.offshore_counterparties,
        ),
        count_factor("cash_equivalents", w.cash_equivalents, cash, sat.cash_equivalents),
        count_factor("round_amounts", w.round_amounts, round, sat.round_amounts),
        count_factor("unusual_hours", w.unusual_hours, night, sat.unusual_hours),
    ];

    let score = SubScore::from_factors(SubScoreKind::Aml, factors);
    debug!(
        customer = %customer.id,
        value = %score.value,
        structured,
        offshore,
        "aml sub-score computed"
    );
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentHistory;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn customer() -> Customer {
        Customer {
            id: "cust_002".to_string(),
            name: "Maria Garcia".to_string(),
            account_age_years: dec!(2),
            credit_utilization: dec!(0.4),
            payment_history: PaymentHistory {
                on_time_payments: 20,
                total_payments: 24,
            },
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn tx(id: &str, amount: Decimal, counterparty: &str, ts: DateTime<Utc>) -> Transaction {
        Transaction {
            id: id.to_string(),
            amount,
            counterparty: counterparty.to_string(),
            timestamp: ts,
            merchant_category: "retail".to_string(),
            counterparty_jurisdiction: None,
            cash_equivalent: false,
        }
    }

    fn factor<'a>(score: &'a SubScore, name: &str) -> &'a ContributingFactor {
        score.factors.iter().find(|f| f.name == name).unwrap()
    }

    fn structuring_burst() -> Vec<Transaction> {
        (0..5)
            .map(|i| tx(&format!("s{i}"), dec!(2900), "Acme Holdings", at(4, 9 + i)))
            .collect()
    }

    #[test]
    fn test_clean_history_scores_zero() {
        let set = TransactionSet::new(vec![
            tx("t1", dec!(45.20), "Grocer", at(1, 10)),
            tx("t2", dec!(120), "Utility Co", at(2, 14)),
        ]);
        let score = score_aml(&customer(), &set, &AmlConfig::default()).unwrap();
        assert_eq!(score.value, Decimal::ZERO);
        assert_eq!(score.factors.len(), 6);
    }

    #[test]
    fn test_structuring_burst_is_flagged() {
        let set = TransactionSet::new(structuring_burst());
        let flagged = detect_structuring(&set, &StructuringConfig::default());
        assert_eq!(flagged, vec!["s0", "s1", "s2", "s3", "s4"]);

        let score = score_aml(&customer(), &set, &AmlConfig::default()).unwrap();
        let structuring = factor(&score, "structuring");
        assert_eq!(structuring.raw_value, dec!(5));
        assert_eq!(structuring.points, dec!(100));
        assert_eq!(structuring.contribution, dec!(45));
        assert_eq!(score.value, dec!(45));
    }

    #[test]
    fn test_spread_out_transactions_are_not_structuring() {
        let set = TransactionSet::new(
            (0..5)
                .map(|i| tx(&format!("s{i}"), dec!(2900), "Acme Holdings", at(1 + 2 * i, 9)))
                .collect(),
        );
        assert!(detect_structuring(&set, &StructuringConfig::default()).is_empty());
    }

    #[test]
    fn test_different_counterparties_are_not_one_cluster() {
        let set = TransactionSet::new(
            (0..5)
                .map(|i| tx(&format!("s{i}"), dec!(2900), &format!("Shop {i}"), at(4, 9 + i)))
                .collect(),
        );
        assert!(detect_structuring(&set, &StructuringConfig::default()).is_empty());
    }

    #[test]
    fn test_sum_must_exceed_reporting_threshold() {
        let set = TransactionSet::new(
            (0..3)
                .map(|i| tx(&format!("s{i}"), dec!(3000), "Acme Holdings", at(4, 9 + i)))
                .collect(),
        );
        // 9,000 stays below the 10,000 threshold
        assert!(detect_structuring(&set, &StructuringConfig::default()).is_empty());
    }

    #[test]
    fn test_over_threshold_transactions_are_ignored() {
        let mut txs = structuring_burst();
        txs.truncate(2);
        txs.push(tx("big", dec!(15_000), "Acme Holdings", at(4, 12)));
        let set = TransactionSet::new(txs);
        assert!(detect_structuring(&set, &StructuringConfig::default()).is_empty());
    }

    #[test]
    fn test_counterparty_match_is_case_insensitive() {
        let mut txs = structuring_burst();
        txs[2].counterparty = "ACME HOLDINGS ".to_string();
        let set = TransactionSet::new(txs);
        assert_eq!(detect_structuring(&set, &StructuringConfig::default()).len(), 5);
    }

    #[test]
    fn test_high_risk_merchant_membership() {
        let mut a = tx("t1", dec!(50), "Casino Royale", at(1, 20));
        a.merchant_category = "Gambling".to_string();
        let mut b = tx("t2", dec!(75), "Coinbase", at(2, 11));
        b.merchant_category = "crypto exchange".to_string();
        let set = TransactionSet::new(vec![a, b, tx("t3", dec!(20), "Grocer", at(3, 9))]);
        let score = score_aml(&customer(), &set, &AmlConfig::default()).unwrap();
        let merchants = factor(&score, "high_risk_merchants");
        assert_eq!(merchants.raw_value, dec!(2));
        assert_eq!(merchants.points, dec!(40));
        assert_eq!(merchants.contribution, dec!(6));
    }

    #[test]
    fn test_offshore_counterparties() {
        let mut txs = Vec::new();
        for (i, j) in ["Cayman Islands", "panama", "United Kingdom"].iter().enumerate() {
            let mut t = tx(&format!("t{i}"), dec!(500), "Wire", at(1 + i as u32, 10));
            t.counterparty_jurisdiction = Some(j.to_string());
            txs.push(t);
        }
        let set = TransactionSet::new(txs);
        let score = score_aml(&customer(), &set, &AmlConfig::default()).unwrap();
        let offshore = factor(&score, "offshore_counterparties");
        assert_eq!(offshore.raw_value, dec!(2));
        // 2 of a saturation of 3
        assert_eq!(offshore.points, dec!(66.6667));
    }

    #[test]
    fn test_round_amounts_and_night_activity() {
        let set = TransactionSet::new(vec![
            tx("t1", dec!(5000), "Broker", at(1, 2)),
            tx("t2", dec!(1000), "Broker", at(2, 23)),
            tx("t3", dec!(2500), "Broker", at(3, 12)),
        ]);
        let score = score_aml(&customer(), &set, &AmlConfig::default()).unwrap();
        // 1,000 is not above the unit, so only 5,000 counts
        assert_eq!(factor(&score, "round_amounts").raw_value, dec!(1));
        assert_eq!(factor(&score, "unusual_hours").raw_value, dec!(2));
    }

    #[test]
    fn test_more_offshore_activity_never_lowers_score() {
        let config = AmlConfig::default();
        let mut previous = Decimal::ZERO;
        let mut txs = vec![tx("base", dec!(80), "Grocer", at(1, 10))];
        for i in 0..6u32 {
            let mut t = tx(&format!("o{i}"), dec!(700), "Wire", at(2 + i, 10));
            t.counterparty_jurisdiction = Some("Seychelles".to_string());
            txs.push(t);
            let value = score_aml(&customer(), &TransactionSet::new(txs.clone()), &config)
                .unwrap()
                .value;
            assert!(value >= previous);
            previous = value;
        }
        assert_eq!(previous, dec!(15));
    }

    #[test]
    fn test_empty_window_is_insufficient_data() {
        let result = score_aml(&customer(), &TransactionSet::default(), &AmlConfig::default());
        assert!(matches!(result, Err(RiskMonitorError::InsufficientData(_))));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let start = at(4, 9);
        let edge = TransactionSet::new(vec![
            tx("s0", dec!(3500), "Acme Holdings", start),
            tx("s1", dec!(3500), "Acme Holdings", start + Duration::hours(12)),
            tx("s2", dec!(3500), "Acme Holdings", start + Duration::hours(24)),
        ]);
        assert_eq!(
            detect_structuring(&edge, &StructuringConfig::default()),
            vec!["s0", "s1", "s2"]
        );

        let past_edge = TransactionSet::new(vec![
            tx("s0", dec!(3500), "Acme Holdings", start),
            tx("s1", dec!(3500), "Acme Holdings", start + Duration::hours(12)),
            tx(
                "s2",
                dec!(3500),
                "Acme Holdings",
                start + Duration::hours(24) + Duration::seconds(1),
            ),
        ]);
        assert!(detect_structuring(&past_edge, &StructuringConfig::default()).is_empty());
    }

    #[test]
    fn test_zero_saturation_is_a_configuration_error() {
        let mut config = AmlConfig::default();
        config.saturation.structuring = 0;
        let set = TransactionSet::new(structuring_burst());
        match score_aml(&customer(), &set, &config) {
            Err(RiskMonitorError::Configuration { parameter, .. }) => {
                assert_eq!(parameter, "aml.saturation.structuring")
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_confidence_is_the_aml_model_confidence() {
        let set = TransactionSet::new(structuring_burst());
        let score = score_aml(&customer(), &set, &AmlConfig::default()).unwrap();
        assert_eq!(score.confidence, dec!(0.90));
    }
}
