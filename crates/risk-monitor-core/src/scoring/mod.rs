//! Credit, AML and OSINT scoring and their combination.

pub mod aml;
pub mod combiner;
pub mod credit;
pub mod osint;

use chrono::{DateTime, Utc};

use crate::config::ScoringConfig;
use crate::types::{Customer, CustomerRecord, OsintSignal, RiskScore, SubScore, TransactionSet};
use crate::RiskMonitorResult;

/// Validate the config and inputs, restrict the history to the scoring window
/// ending at `as_of`, and compute the credit and AML sub-scores.
pub fn base_subscores(
    customer: &Customer,
    transactions: &TransactionSet,
    config: &ScoringConfig,
    as_of: DateTime<Utc>,
) -> RiskMonitorResult<(SubScore, SubScore)> {
    config.validate()?;
    customer.validate()?;
    transactions.validate()?;
    let window = transactions.window(as_of, config.window_days);
    let credit = credit::score_credit(customer, &window, &config.credit)?;
    let aml = aml::score_aml(customer, &window, &config.aml)?;
    Ok((credit, aml))
}

/// Score one customer end to end. Either a complete RiskScore or an error;
/// never a partial result.
pub fn assess(
    customer: &Customer,
    transactions: &TransactionSet,
    osint_signals: Option<&[OsintSignal]>,
    config: &ScoringConfig,
    as_of: DateTime<Utc>,
) -> RiskMonitorResult<RiskScore> {
    let (credit, aml) = base_subscores(customer, transactions, config, as_of)?;
    let adjustment = osint::adjust(osint_signals, &config.osint)?;
    Ok(combiner::combine(customer, credit, aml, adjustment, config, as_of))
}

pub fn assess_record(
    record: &CustomerRecord,
    config: &ScoringConfig,
    as_of: DateTime<Utc>,
) -> RiskMonitorResult<RiskScore> {
    assess(
        &record.customer,
        &record.transactions,
        record.osint_signals.as_deref(),
        config,
        as_of,
    )
}
