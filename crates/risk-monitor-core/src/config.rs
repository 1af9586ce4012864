//! Scoring configuration.
//!
//! Every parameter is named, defaulted and range-checked by
//! [`ScoringConfig::validate`]. Out-of-range values are rejected with
//! `RiskMonitorError::Configuration`; nothing is clamped or renormalised.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RiskMonitorError;
use crate::types::{OsintSignalType, Points, Rate, RiskTier, MAX_POINTS};
use crate::RiskMonitorResult;

/// Tolerance when checking that a weight set sums to one.
const WEIGHT_SUM_TOLERANCE: Decimal = dec!(0.0001);

// ---------------------------------------------------------------------------
// Credit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditWeights {
    pub payment_history: Rate,
    pub credit_utilization: Rate,
    pub account_age: Rate,
    pub transaction_frequency: Rate,
    pub amount_consistency: Rate,
}

impl Default for CreditWeights {
    fn default() -> Self {
        Self {
            payment_history: dec!(0.35),
            credit_utilization: dec!(0.30),
            account_age: dec!(0.15),
            transaction_frequency: dec!(0.10),
            amount_consistency: dec!(0.10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditConfig {
    pub weights: CreditWeights,
    /// Account age at which the maturity bonus is complete.
    pub maturity_horizon_years: Decimal,
    /// Transactions in the window at which the thin-file risk reaches zero.
    pub frequency_saturation: u32,
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            weights: CreditWeights::default(),
            maturity_horizon_years: dec!(10),
            frequency_saturation: 30,
        }
    }
}

impl CreditConfig {
    pub fn validate(&self) -> RiskMonitorResult<()> {
        let w = &self.weights;
        check_weight_set(
            "credit.weights",
            &[
                ("payment_history", w.payment_history),
                ("credit_utilization", w.credit_utilization),
                ("account_age", w.account_age),
                ("transaction_frequency", w.transaction_frequency),
                ("amount_consistency", w.amount_consistency),
            ],
        )?;
        if self.maturity_horizon_years <= Decimal::ZERO {
            return Err(RiskMonitorError::config(
                "credit.maturity_horizon_years",
                "Must be positive",
            ));
        }
        if self.frequency_saturation == 0 {
            return Err(RiskMonitorError::config(
                "credit.frequency_saturation",
                "Must be positive",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AML
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmlWeights {
    pub structuring: Rate,
    pub high_risk_merchants: Rate,
    pub offshore_counterparties: Rate,
    pub cash_equivalents: Rate,
    pub round_amounts: Rate,
    pub unusual_hours: Rate,
}

impl Default for AmlWeights {
    fn default() -> Self {
        Self {
            structuring: dec!(0.45),
            high_risk_merchants: dec!(0.15),
            offshore_counterparties: dec!(0.15),
            cash_equivalents: dec!(0.10),
            round_amounts: dec!(0.05),
            unusual_hours: dec!(0.10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuringConfig {
    /// Single-transaction reporting threshold (e.g. the 10,000 CTR limit).
    pub reporting_threshold: Decimal,
    /// Length of the rolling window, in hours.
    pub window_hours: u32,
    /// Minimum number of sub-threshold transactions in one window.
    pub min_transactions: u32,
}

impl Default for StructuringConfig {
    fn default() -> Self {
        Self {
            reporting_threshold: dec!(10_000),
            window_hours: 24,
            min_transactions: 3,
        }
    }
}

/// Counts at which each AML detector reaches full intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSaturation {
    pub structuring: u32,
    pub high_risk_merchants: u32,
    pub offshore_counterparties: u32,
    pub cash_equivalents: u32,
    pub round_amounts: u32,
    pub unusual_hours: u32,
}

impl Default for DetectorSaturation {
    fn default() -> Self {
        Self {
            structuring: 5,
            high_risk_merchants: 5,
            offshore_counterparties: 3,
            cash_equivalents: 5,
            round_amounts: 5,
            unusual_hours: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmlConfig {
    pub weights: AmlWeights,
    pub structuring: StructuringConfig,
    pub saturation: DetectorSaturation,
    pub high_risk_merchant_categories: Vec<String>,
    pub offshore_jurisdictions: Vec<String>,
    /// Amounts that are exact multiples of this unit (and above it) count as round.
    pub round_amount_unit: Decimal,
    /// Hours (UTC) from `night_start_hour` until `night_end_hour` are unusual.
    pub night_start_hour: u32,
    pub night_end_hour: u32,
}

impl Default for AmlConfig {
    fn default() -> Self {
        Self {
            weights: AmlWeights::default(),
            structuring: StructuringConfig::default(),
            saturation: DetectorSaturation::default(),
            high_risk_merchant_categories: [
                "gambling",
                "casino",
                "crypto_exchange",
                "money_service",
                "precious_metals",
                "offshore_trading",
                "weapons",
                "adult_entertainment",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            offshore_jurisdictions: [
                "cayman islands",
                "british virgin islands",
                "panama",
                "seychelles",
                "bermuda",
                "bahamas",
                "belize",
                "marshall islands",
                "vanuatu",
                "samoa",
                "isle of man",
                "jersey",
                "guernsey",
                "iran",
                "north korea",
                "myanmar",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            round_amount_unit: dec!(1_000),
            night_start_hour: 23,
            night_end_hour: 6,
        }
    }
}

impl AmlConfig {
    pub fn validate(&self) -> RiskMonitorResult<()> {
        let aw = &self.weights;
        check_weight_set(
            "aml.weights",
            &[
                ("structuring", aw.structuring),
                ("high_risk_merchants", aw.high_risk_merchants),
                ("offshore_counterparties", aw.offshore_counterparties),
                ("cash_equivalents", aw.cash_equivalents),
                ("round_amounts", aw.round_amounts),
                ("unusual_hours", aw.unusual_hours),
            ],
        )?;

        let st = &self.structuring;
        if st.reporting_threshold <= Decimal::ZERO {
            return Err(RiskMonitorError::config(
                "aml.structuring.reporting_threshold",
                "Must be positive",
            ));
        }
        if st.window_hours == 0 {
            return Err(RiskMonitorError::config(
                "aml.structuring.window_hours",
                "Must be at least one hour",
            ));
        }
        if st.min_transactions < 2 {
            return Err(RiskMonitorError::config(
                "aml.structuring.min_transactions",
                "Structuring needs at least two transactions",
            ));
        }

        let sat = &self.saturation;
        for (name, value) in [
            ("structuring", sat.structuring),
            ("high_risk_merchants", sat.high_risk_merchants),
            ("offshore_counterparties", sat.offshore_counterparties),
            ("cash_equivalents", sat.cash_equivalents),
            ("round_amounts", sat.round_amounts),
            ("unusual_hours", sat.unusual_hours),
        ] {
            if value == 0 {
                return Err(RiskMonitorError::config(
                    &format!("aml.saturation.{name}"),
                    "Must be positive",
                ));
            }
        }
        if self.round_amount_unit <= Decimal::ZERO {
            return Err(RiskMonitorError::config(
                "aml.round_amount_unit",
                "Must be positive",
            ));
        }
        if self.night_start_hour > 23 || self.night_end_hour > 23 {
            return Err(RiskMonitorError::config(
                "aml.night_start_hour",
                "Hours must be in 0..=23",
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// OSINT
// ---------------------------------------------------------------------------

/// Maximum contribution of each signal type at full confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsintCaps {
    pub adverse_media: Points,
    pub sanctions: Points,
    pub pep: Points,
    pub domain_risk: Points,
    pub merchant_risk: Points,
}

impl OsintCaps {
    pub fn cap_for(&self, signal_type: OsintSignalType) -> Points {
        match signal_type {
            OsintSignalType::AdverseMedia => self.adverse_media,
            OsintSignalType::Sanctions => self.sanctions,
            OsintSignalType::Pep => self.pep,
            OsintSignalType::DomainRisk => self.domain_risk,
            OsintSignalType::MerchantRisk => self.merchant_risk,
        }
    }
}

impl Default for OsintCaps {
    fn default() -> Self {
        Self {
            adverse_media: dec!(12),
            sanctions: dec!(20),
            pep: dec!(10),
            domain_risk: dec!(6),
            merchant_risk: dec!(8),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsintConfig {
    pub caps: OsintCaps,
    /// Bound on the absolute total adjustment.
    pub total_cap: Points,
    /// Deadline for the OSINT provider call.
    pub timeout_ms: u64,
}

impl Default for OsintConfig {
    fn default() -> Self {
        Self {
            caps: OsintCaps::default(),
            total_cap: dec!(20),
            timeout_ms: 30_000,
        }
    }
}

impl OsintConfig {
    pub fn validate(&self) -> RiskMonitorResult<()> {
        let caps = &self.caps;
        for (name, value) in [
            ("adverse_media", caps.adverse_media),
            ("sanctions", caps.sanctions),
            ("pep", caps.pep),
            ("domain_risk", caps.domain_risk),
            ("merchant_risk", caps.merchant_risk),
        ] {
            if value < Decimal::ZERO || value > MAX_POINTS {
                return Err(RiskMonitorError::config(
                    &format!("osint.caps.{name}"),
                    "Must be between 0 and 100",
                ));
            }
        }
        if self.total_cap < Decimal::ZERO || self.total_cap > MAX_POINTS {
            return Err(RiskMonitorError::config(
                "osint.total_cap",
                "Must be between 0 and 100",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(RiskMonitorError::config(
                "osint.timeout_ms",
                "Must be positive",
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Combiner, tiers, explanation, alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinerWeights {
    pub credit: Rate,
    pub aml: Rate,
}

impl Default for CombinerWeights {
    fn default() -> Self {
        Self {
            credit: dec!(0.4),
            aml: dec!(0.6),
        }
    }
}

/// Inclusive lower bounds of the medium, high and critical tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub medium: Points,
    pub high: Points,
    pub critical: Points,
}

impl TierThresholds {
    pub fn tier_for(&self, value: Points) -> RiskTier {
        if value >= self.critical {
            RiskTier::Critical
        } else if value >= self.high {
            RiskTier::High
        } else if value >= self.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            medium: dec!(30),
            high: dec!(60),
            critical: dec!(85),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    /// Minimum contribution to the combined score (in points) worth stating.
    pub materiality: Points,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            materiality: dec!(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Sub-scores and combined scores at or above this value raise an alert.
    pub floor: Points,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { floor: dec!(60) }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub credit: CreditConfig,
    pub aml: AmlConfig,
    pub osint: OsintConfig,
    pub combiner: CombinerWeights,
    pub tiers: TierThresholds,
    pub explain: ExplainConfig,
    pub alerts: AlertConfig,
    /// Days of transaction history the engine scores.
    pub window_days: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            credit: CreditConfig::default(),
            aml: AmlConfig::default(),
            osint: OsintConfig::default(),
            combiner: CombinerWeights::default(),
            tiers: TierThresholds::default(),
            explain: ExplainConfig::default(),
            alerts: AlertConfig::default(),
            window_days: 90,
        }
    }
}

impl ScoringConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> RiskMonitorResult<Self> {
        let config: ScoringConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section. `assess` runs this before any arithmetic.
    pub fn validate(&self) -> RiskMonitorResult<()> {
        self.credit.validate()?;
        self.aml.validate()?;
        self.osint.validate()?;

        check_weight_set(
            "combiner",
            &[("credit", self.combiner.credit), ("aml", self.combiner.aml)],
        )?;

        let t = &self.tiers;
        if !(Decimal::ZERO < t.medium && t.medium < t.high && t.high < t.critical)
            || t.critical > MAX_POINTS
        {
            return Err(RiskMonitorError::config(
                "tiers",
                format!(
                    "Cut points must satisfy 0 < medium < high < critical <= 100 (got {}, {}, {})",
                    t.medium, t.high, t.critical
                ),
            ));
        }

        if self.explain.materiality < Decimal::ZERO {
            return Err(RiskMonitorError::config(
                "explain.materiality",
                "Must be non-negative",
            ));
        }
        if self.alerts.floor < Decimal::ZERO || self.alerts.floor > MAX_POINTS {
            return Err(RiskMonitorError::config(
                "alerts.floor",
                "Must be between 0 and 100",
            ));
        }
        if self.window_days == 0 {
            return Err(RiskMonitorError::config("window_days", "Must be positive"));
        }

        Ok(())
    }
}

fn check_weight_set(parameter: &str, weights: &[(&str, Rate)]) -> RiskMonitorResult<()> {
    for (name, w) in weights {
        if *w < Decimal::ZERO {
            return Err(RiskMonitorError::config(
                &format!("{parameter}.{name}"),
                "Weights must be non-negative",
            ));
        }
    }
    let sum: Decimal = weights.iter().map(|(_, w)| *w).sum();
    if (sum - Decimal::ONE).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(RiskMonitorError::config(
            parameter,
            format!("Weights must sum to 1 (got {sum})"),
        ));
    }
    Ok(())
}
