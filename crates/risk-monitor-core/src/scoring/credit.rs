//! Credit sub-score.
//!
//! Five factors, each normalised to risk points in [0, 100] and weighted:
//! 1. **Payment history** -- share of late payments.
//! 2. **Utilisation** -- outstanding balance over limit.
//! 3. **Account age** -- log-scaled maturity bonus, ln(1 + years) / ln(1 + horizon).
//! 4. **Transaction frequency** -- thin files carry more risk; zero at saturation.
//! 5. **Amount consistency** -- coefficient of variation of transaction amounts.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use tracing::debug;

use crate::config::CreditConfig;
use crate::error::RiskMonitorError;
use crate::types::{
    ContributingFactor, Customer, Points, SubScore, SubScoreKind, TransactionSet, MAX_POINTS,
};
use crate::RiskMonitorResult;

/// Points used when a factor has nothing to measure.
const NEUTRAL_POINTS: Points = dec!(50);

// ---------------------------------------------------------------------------
// Factor normalisation
// ---------------------------------------------------------------------------

fn payment_history_factor(customer: &Customer, weight: Decimal) -> ContributingFactor {
    match customer.payment_history.on_time_ratio() {
        Some(ratio) => {
            let late = Decimal::ONE - ratio.min(Decimal::ONE);
            ContributingFactor::new("payment_history", weight, ratio, late * MAX_POINTS)
        }
        // raw value 0 with neutral points: no repayments were due yet
        None => ContributingFactor::new("payment_history", weight, Decimal::ZERO, NEUTRAL_POINTS),
    }
}

fn utilization_factor(customer: &Customer, weight: Decimal) -> ContributingFactor {
    ContributingFactor::new(
        "credit_utilization",
        weight,
        customer.credit_utilization,
        customer.credit_utilization * MAX_POINTS,
    )
}

/// Maturity in [0, 1]; reaches 1 at the configured horizon.
fn account_maturity(years: Decimal, horizon_years: Decimal) -> Decimal {
    if years <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let maturity = (Decimal::ONE + years).ln() / (Decimal::ONE + horizon_years).ln();
    maturity.max(Decimal::ZERO).min(Decimal::ONE)
}

fn account_age_factor(
    customer: &Customer,
    weight: Decimal,
    horizon_years: Decimal,
) -> ContributingFactor {
    let maturity = account_maturity(customer.account_age_years, horizon_years);
    ContributingFactor::new(
        "account_age",
        weight,
        customer.account_age_years,
        (Decimal::ONE - maturity) * MAX_POINTS,
    )
}

fn transaction_frequency_factor(
    transactions: &TransactionSet,
    weight: Decimal,
    saturation: u32,
) -> ContributingFactor {
    let count = Decimal::from(transactions.len() as u64);
    let activity = (count / Decimal::from(saturation)).min(Decimal::ONE);
    ContributingFactor::new(
        "transaction_frequency",
        weight,
        count,
        (Decimal::ONE - activity) * MAX_POINTS,
    )
}

fn dispersion_overflow() -> RiskMonitorError {
    RiskMonitorError::invalid(
        "transaction.amount",
        "Amounts are too large to measure their dispersion",
    )
}

/// Population coefficient of variation; `None` with fewer than two amounts.
fn coefficient_of_variation(transactions: &TransactionSet) -> RiskMonitorResult<Option<Decimal>> {
    let n = transactions.len();
    if n < 2 {
        return Ok(None);
    }
    let count = Decimal::from(n as u64);

    let mut total = Decimal::ZERO;
    for t in transactions.iter() {
        total = total.checked_add(t.amount).ok_or_else(dispersion_overflow)?;
    }
    let mean = total / count;
    if mean <= Decimal::ZERO {
        return Ok(Some(Decimal::ONE));
    }

    let mut squares = Decimal::ZERO;
    for t in transactions.iter() {
        let deviation = t.amount - mean;
        let square = deviation
            .checked_mul(deviation)
            .ok_or_else(dispersion_overflow)?;
        squares = squares.checked_add(square).ok_or_else(dispersion_overflow)?;
    }
    let std_dev = (squares / count).sqrt().unwrap_or(Decimal::ZERO);
    Ok(Some(std_dev / mean))
}

fn amount_consistency_factor(
    transactions: &TransactionSet,
    weight: Decimal,
) -> RiskMonitorResult<ContributingFactor> {
    let factor = match coefficient_of_variation(transactions)? {
        Some(cv) => ContributingFactor::new(
            "amount_consistency",
            weight,
            cv.round_dp(4),
            cv.min(Decimal::ONE) * MAX_POINTS,
        ),
        None => {
            ContributingFactor::new("amount_consistency", weight, Decimal::ZERO, NEUTRAL_POINTS)
        }
    };
    Ok(factor)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the credit sub-score for a customer over a transaction window.
///
/// Fails with `InsufficientData` when the window holds no transactions; the
/// caller decides whether to substitute [`SubScore::neutral`].
pub fn score_credit(
    customer: &Customer,
    transactions: &TransactionSet,
    config: &CreditConfig,
) -> RiskMonitorResult<SubScore> {
    config.validate()?;
    if transactions.is_empty() {
        return Err(RiskMonitorError::InsufficientData(format!(
            "no transactions in the scoring window for customer {}",
            customer.id
        )));
    }

    let w = &config.weights;
    let factors = vec![
        payment_history_factor(customer, w.payment_history),
        utilization_factor(customer, w.credit_utilization),
        account_age_factor(customer, w.account_age, config.maturity_horizon_years),
        transaction_frequency_factor(
            transactions,
            w.transaction_frequency,
            config.frequency_saturation,
        ),
        amount_consistency_factor(transactions, w.amount_consistency)?,
    ];

    let score = SubScore::from_factors(SubScoreKind::Credit, factors);
    debug!(customer = %customer.id, value = %score.value, "credit sub-score computed");
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentHistory, Transaction};
    use chrono::{TimeZone, Utc};

    fn customer() -> Customer {
        Customer {
            id: "cust_001".to_string(),
            name: "John Smith".to_string(),
            account_age_years: dec!(5),
            credit_utilization: dec!(0.3),
            payment_history: PaymentHistory {
                on_time_payments: 95,
                total_payments: 100,
            },
        }
    }

    fn tx(id: &str, amount: Decimal) -> Transaction {
        Transaction {
            id: id.to_string(),
            amount,
            counterparty: "Grocer".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            merchant_category: "groceries".to_string(),
            counterparty_jurisdiction: None,
            cash_equivalent: false,
        }
    }

    fn steady_history() -> TransactionSet {
        TransactionSet::new(vec![
            tx("t1", dec!(100)),
            tx("t2", dec!(110)),
            tx("t3", dec!(90)),
            tx("t4", dec!(100)),
        ])
    }

    fn factor<'a>(score: &'a SubScore, name: &str) -> &'a ContributingFactor {
        score.factors.iter().find(|f| f.name == name).unwrap()
    }

    #[test]
    fn test_good_customer_is_low_risk() {
        let score = score_credit(&customer(), &steady_history(), &CreditConfig::default()).unwrap();
        assert_eq!(score.kind, SubScoreKind::Credit);
        assert!(score.value < dec!(30), "credit value {}", score.value);
    }

    #[test]
    fn test_empty_window_is_insufficient_data() {
        let empty = TransactionSet::default();
        let result = score_credit(&customer(), &empty, &CreditConfig::default());
        assert!(matches!(result, Err(RiskMonitorError::InsufficientData(_))));
    }

    #[test]
    fn test_factor_points_and_contributions() {
        let score = score_credit(&customer(), &steady_history(), &CreditConfig::default()).unwrap();
        let payment = factor(&score, "payment_history");
        assert_eq!(payment.raw_value, dec!(0.95));
        assert_eq!(payment.points, dec!(5));
        assert_eq!(payment.contribution, dec!(1.75));

        let util = factor(&score, "credit_utilization");
        assert_eq!(util.points, dec!(30));
        assert_eq!(util.contribution, dec!(9));
    }

    #[test]
    fn test_factor_order_is_fixed() {
        let score = score_credit(&customer(), &steady_history(), &CreditConfig::default()).unwrap();
        let names: Vec<&str> = score.factors.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "payment_history",
                "credit_utilization",
                "account_age",
                "transaction_frequency",
                "amount_consistency"
            ]
        );
    }

    #[test]
    fn test_utilization_above_one_is_clipped() {
        let mut c = customer();
        c.credit_utilization = dec!(1.8);
        let score = score_credit(&c, &steady_history(), &CreditConfig::default()).unwrap();
        assert_eq!(factor(&score, "credit_utilization").points, dec!(100));
        assert_eq!(factor(&score, "credit_utilization").raw_value, dec!(1.8));
    }

    #[test]
    fn test_higher_utilization_never_lowers_score() {
        let config = CreditConfig::default();
        let mut previous = Decimal::ZERO;
        for step in 0..=12 {
            let mut c = customer();
            c.credit_utilization = Decimal::from(step) / dec!(10);
            let value = score_credit(&c, &steady_history(), &config).unwrap().value;
            assert!(value >= previous, "utilization step {step}: {value} < {previous}");
            previous = value;
        }
    }

    #[test]
    fn test_older_accounts_score_lower() {
        let config = CreditConfig::default();
        let mut young = customer();
        young.account_age_years = dec!(0.5);
        let mut old = customer();
        old.account_age_years = dec!(12);
        let young_score = score_credit(&young, &steady_history(), &config).unwrap();
        let old_score = score_credit(&old, &steady_history(), &config).unwrap();
        let young_points = factor(&young_score, "account_age").points;
        let old_points = factor(&old_score, "account_age").points;
        assert!(young_points > old_points);
        assert_eq!(old_points, Decimal::ZERO);
    }

    #[test]
    fn test_new_account_has_full_age_risk() {
        let mut c = customer();
        c.account_age_years = Decimal::ZERO;
        let score = score_credit(&c, &steady_history(), &CreditConfig::default()).unwrap();
        assert_eq!(factor(&score, "account_age").points, dec!(100));
    }

    #[test]
    fn test_no_payment_history_is_neutral() {
        let mut c = customer();
        c.payment_history = PaymentHistory::default();
        let score = score_credit(&c, &steady_history(), &CreditConfig::default()).unwrap();
        assert_eq!(factor(&score, "payment_history").points, dec!(50));
    }

    #[test]
    fn test_single_transaction_consistency_is_neutral() {
        let single = TransactionSet::new(vec![tx("t1", dec!(250))]);
        let score = score_credit(&customer(), &single, &CreditConfig::default()).unwrap();
        assert_eq!(factor(&score, "amount_consistency").points, dec!(50));
    }

    #[test]
    fn test_identical_amounts_have_zero_variation() {
        let same = TransactionSet::new(vec![tx("t1", dec!(2900)), tx("t2", dec!(2900))]);
        let score = score_credit(&customer(), &same, &CreditConfig::default()).unwrap();
        assert_eq!(factor(&score, "amount_consistency").points, Decimal::ZERO);
    }

    #[test]
    fn test_value_stays_in_bounds_for_worst_case() {
        let worst = Customer {
            id: "worst".to_string(),
            name: String::new(),
            account_age_years: Decimal::ZERO,
            credit_utilization: dec!(5),
            payment_history: PaymentHistory {
                on_time_payments: 0,
                total_payments: 12,
            },
        };
        let volatile = TransactionSet::new(vec![
            tx("t1", dec!(1)),
            tx("t2", dec!(1)),
            tx("t3", dec!(100_000)),
        ]);
        let score = score_credit(&worst, &volatile, &CreditConfig::default()).unwrap();
        // three transactions leave 90 frequency points, every other factor is at 100
        assert_eq!(score.value, dec!(99));
        assert!(score.value <= MAX_POINTS);
    }

    #[test]
    fn test_thin_file_carries_frequency_risk() {
        let config = CreditConfig::default();
        let thin = score_credit(&customer(), &steady_history(), &config).unwrap();
        let frequency = factor(&thin, "transaction_frequency");
        assert_eq!(frequency.raw_value, dec!(4));
        assert!(frequency.points > dec!(86) && frequency.points < dec!(87));

        let busy: Vec<Transaction> = (0..40)
            .map(|i| tx(&format!("t{i:02}"), dec!(100)))
            .collect();
        let busy = score_credit(&customer(), &TransactionSet::new(busy), &config).unwrap();
        assert_eq!(factor(&busy, "transaction_frequency").points, Decimal::ZERO);
        assert!(busy.value < thin.value);
    }

    #[test]
    fn test_dispersion_overflow_is_invalid_input() {
        let huge = TransactionSet::new(vec![
            tx("t1", dec!(1)),
            tx("t2", Decimal::MAX),
            tx("t3", Decimal::MAX),
        ]);
        let result = score_credit(&customer(), &huge, &CreditConfig::default());
        match result {
            Err(RiskMonitorError::InvalidInput { field, .. }) => {
                assert_eq!(field, "transaction.amount")
            }
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_config_is_rejected_before_scoring() {
        let mut config = CreditConfig::default();
        config.weights.payment_history = dec!(0.9);
        let result = score_credit(&customer(), &steady_history(), &config);
        assert!(matches!(result, Err(RiskMonitorError::Configuration { .. })));
    }

    #[test]
    fn test_confidence_is_the_credit_model_confidence() {
        let score = score_credit(&customer(), &steady_history(), &CreditConfig::default()).unwrap();
        assert_eq!(score.confidence, dec!(0.85));
    }
}
