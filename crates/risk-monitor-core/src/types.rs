use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::CombinerWeights;
use crate::error::RiskMonitorError;
use crate::RiskMonitorResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Ratios and weights expressed as decimals (0.30 = 30%). Never as percentages.
pub type Rate = Decimal;

/// Risk points on the 0-100 scale shared by every score.
pub type Points = Decimal;

/// Upper bound of the risk scale.
pub const MAX_POINTS: Points = dec!(100);

/// Largest credit utilization accepted (100x the limit).
pub const MAX_CREDIT_UTILIZATION: Rate = dec!(100);

/// Largest account age accepted, in years.
pub const MAX_ACCOUNT_AGE_YEARS: Decimal = dec!(150);

/// Largest single transaction amount accepted. Keeps the amount-dispersion
/// arithmetic well inside the `Decimal` range.
pub const MAX_TRANSACTION_AMOUNT: Money = dec!(1_000_000_000_000);

/// Clip a value onto the 0-100 risk scale.
pub fn clip_points(value: Decimal) -> Points {
    value.max(Decimal::ZERO).min(MAX_POINTS)
}

// ---------------------------------------------------------------------------
// Customer & transactions
// ---------------------------------------------------------------------------

/// Summary of scheduled repayments observed for a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentHistory {
    pub on_time_payments: u32,
    pub total_payments: u32,
}

impl PaymentHistory {
    /// Share of payments made on time, `None` when nothing was due yet.
    pub fn on_time_ratio(&self) -> Option<Rate> {
        if self.total_payments == 0 {
            return None;
        }
        Some(Decimal::from(self.on_time_payments) / Decimal::from(self.total_payments))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub account_age_years: Decimal,
    /// Outstanding balance over credit limit.
    pub credit_utilization: Rate,
    #[serde(default)]
    pub payment_history: PaymentHistory,
}

impl Customer {
    pub fn validate(&self) -> RiskMonitorResult<()> {
        if self.id.trim().is_empty() {
            return Err(RiskMonitorError::invalid("customer.id", "Customer id must not be empty"));
        }
        if self.account_age_years < Decimal::ZERO
            || self.account_age_years > MAX_ACCOUNT_AGE_YEARS
        {
            return Err(RiskMonitorError::invalid(
                "customer.account_age_years",
                format!("Must be between 0 and {MAX_ACCOUNT_AGE_YEARS}"),
            ));
        }
        if self.credit_utilization < Decimal::ZERO
            || self.credit_utilization > MAX_CREDIT_UTILIZATION
        {
            return Err(RiskMonitorError::invalid(
                "customer.credit_utilization",
                format!("Must be between 0 and {MAX_CREDIT_UTILIZATION}"),
            ));
        }
        if self.payment_history.on_time_payments > self.payment_history.total_payments {
            return Err(RiskMonitorError::invalid(
                "customer.payment_history",
                "On-time payments cannot exceed total payments",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub amount: Money,
    pub counterparty: String,
    pub timestamp: DateTime<Utc>,
    pub merchant_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_jurisdiction: Option<String>,
    #[serde(default)]
    pub cash_equivalent: bool,
}

/// Transactions of one customer, always ordered by timestamp then id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Transaction>", into = "Vec<Transaction>")]
pub struct TransactionSet {
    transactions: Vec<Transaction>,
}

impl TransactionSet {
    pub fn new(mut transactions: Vec<Transaction>) -> Self {
        transactions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Self { transactions }
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn as_slice(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Transactions in the `days`-long window ending at `as_of` (inclusive).
    pub fn window(&self, as_of: DateTime<Utc>, days: u32) -> TransactionSet {
        let start = as_of - Duration::days(i64::from(days));
        Self {
            transactions: self
                .transactions
                .iter()
                .filter(|t| t.timestamp > start && t.timestamp <= as_of)
                .cloned()
                .collect(),
        }
    }

    pub fn validate(&self) -> RiskMonitorResult<()> {
        for t in &self.transactions {
            if t.id.trim().is_empty() {
                return Err(RiskMonitorError::invalid(
                    "transaction.id",
                    "Transaction id must not be empty",
                ));
            }
            if t.amount <= Decimal::ZERO {
                return Err(RiskMonitorError::invalid(
                    "transaction.amount",
                    format!("Transaction {} must have a positive amount", t.id),
                ));
            }
            if t.amount > MAX_TRANSACTION_AMOUNT {
                return Err(RiskMonitorError::invalid(
                    "transaction.amount",
                    format!(
                        "Transaction {} exceeds the maximum amount {}",
                        t.id, MAX_TRANSACTION_AMOUNT
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl From<Vec<Transaction>> for TransactionSet {
    fn from(transactions: Vec<Transaction>) -> Self {
        TransactionSet::new(transactions)
    }
}

impl From<TransactionSet> for Vec<Transaction> {
    fn from(set: TransactionSet) -> Self {
        set.transactions
    }
}

impl<'a> IntoIterator for &'a TransactionSet {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}

// ---------------------------------------------------------------------------
// OSINT
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsintSignalType {
    AdverseMedia,
    Sanctions,
    Pep,
    DomainRisk,
    MerchantRisk,
}

impl OsintSignalType {
    pub fn label(&self) -> &'static str {
        match self {
            OsintSignalType::AdverseMedia => "adverse media",
            OsintSignalType::Sanctions => "sanctions match",
            OsintSignalType::Pep => "politically exposed person",
            OsintSignalType::DomainRisk => "domain risk",
            OsintSignalType::MerchantRisk => "merchant risk",
        }
    }
}

impl fmt::Display for OsintSignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OsintSignalType::AdverseMedia => "adverse_media",
            OsintSignalType::Sanctions => "sanctions",
            OsintSignalType::Pep => "pep",
            OsintSignalType::DomainRisk => "domain_risk",
            OsintSignalType::MerchantRisk => "merchant_risk",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsintSignal {
    pub signal_type: OsintSignalType,
    /// Provider confidence in [0, 1].
    pub confidence: Rate,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubScoreKind {
    Credit,
    Aml,
}

impl fmt::Display for SubScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubScoreKind::Credit => f.write_str("credit"),
            SubScoreKind::Aml => f.write_str("aml"),
        }
    }
}

impl SubScoreKind {
    /// Fixed confidence of each scoring model in its own output.
    pub fn model_confidence(&self) -> Rate {
        match self {
            SubScoreKind::Credit => dec!(0.85),
            SubScoreKind::Aml => dec!(0.90),
        }
    }
}

/// One named term of a sub-score: `contribution = weight * points`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub name: String,
    pub weight: Rate,
    /// The observed quantity before normalisation (ratio, years, count).
    pub raw_value: Decimal,
    /// Normalised risk points in [0, 100].
    pub points: Points,
    pub contribution: Points,
}

impl ContributingFactor {
    pub fn new(name: &str, weight: Rate, raw_value: Decimal, points: Decimal) -> Self {
        let points = clip_points(points).round_dp(4);
        Self {
            name: name.to_string(),
            weight,
            raw_value,
            points,
            contribution: weight * points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub kind: SubScoreKind,
    pub value: Points,
    /// Model confidence in [0, 1]; zero for a neutral substitute.
    #[serde(default)]
    pub confidence: Rate,
    pub factors: Vec<ContributingFactor>,
}

impl SubScore {
    /// Sum the factor contributions onto the 0-100 scale.
    pub fn from_factors(kind: SubScoreKind, factors: Vec<ContributingFactor>) -> Self {
        let total: Decimal = factors.iter().map(|f| f.contribution).sum();
        Self {
            kind,
            value: clip_points(total),
            confidence: kind.model_confidence(),
            factors,
        }
    }

    /// Mid-scale score with an empty trace, for callers that choose to
    /// continue after `InsufficientData`.
    pub fn neutral(kind: SubScoreKind) -> Self {
        Self {
            kind,
            value: dec!(50),
            confidence: Decimal::ZERO,
            factors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsintStatus {
    Applied,
    /// No signal was supplied for the customer.
    NoExternalSignal,
    /// The provider failed or timed out; treated as no signal.
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsintContribution {
    pub signal_type: OsintSignalType,
    pub confidence: Rate,
    pub source: String,
    pub max_contribution: Points,
    pub contribution: Points,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsintAdjustment {
    pub value: Points,
    pub status: OsintStatus,
    pub contributions: Vec<OsintContribution>,
}

impl OsintAdjustment {
    pub fn no_external_signal() -> Self {
        Self {
            value: Decimal::ZERO,
            status: OsintStatus::NoExternalSignal,
            contributions: Vec::new(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            value: Decimal::ZERO,
            status: OsintStatus::Unavailable {
                reason: reason.into(),
            },
            contributions: Vec::new(),
        }
    }

    pub fn has_signal(&self, signal_type: OsintSignalType) -> bool {
        self.contributions
            .iter()
            .any(|c| c.signal_type == signal_type && c.contribution > Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
            RiskTier::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}

/// The complete, immutable result of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub customer_id: String,
    #[serde(default)]
    pub customer_name: String,
    pub combined_value: Points,
    pub tier: RiskTier,
    /// Mean of the two sub-score confidences.
    #[serde(default)]
    pub confidence: Rate,
    pub credit_subscore: SubScore,
    pub aml_subscore: SubScore,
    pub osint_adjustment: OsintAdjustment,
    /// Sub-score weights the combined value was computed with.
    pub weights: CombinerWeights,
    pub explanation: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl RiskScore {
    /// Weighted base before the OSINT adjustment.
    pub fn base_value(&self) -> Points {
        self.weights.credit * self.credit_subscore.value
            + self.weights.aml * self.aml_subscore.value
    }

    pub fn subscore(&self, kind: SubScoreKind) -> &SubScore {
        match kind {
            SubScoreKind::Credit => &self.credit_subscore,
            SubScoreKind::Aml => &self.aml_subscore,
        }
    }

    pub fn weight_of(&self, kind: SubScoreKind) -> Rate {
        match kind {
            SubScoreKind::Credit => self.weights.credit,
            SubScoreKind::Aml => self.weights.aml,
        }
    }
}

// ---------------------------------------------------------------------------
// Case files
// ---------------------------------------------------------------------------

/// Everything known about one customer at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer: Customer,
    #[serde(default)]
    pub transactions: TransactionSet,
    /// `None` means the OSINT collaborator had nothing for this customer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osint_signals: Option<Vec<OsintSignal>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub customers: Vec<CustomerRecord>,
}

impl Dataset {
    pub fn customer_ids(&self) -> Vec<String> {
        self.customers.iter().map(|r| r.customer.id.clone()).collect()
    }
}
