//! OSINT adjustment.
//!
//! External intelligence augments the base credit/AML assessment but never
//! replaces it: each signal type is capped, confidence scales the cap
//! linearly, and the total is bounded by `total_cap`. Missing data is not an
//! error; it yields a zero adjustment marked `NoExternalSignal`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::OsintConfig;
use crate::types::{OsintAdjustment, OsintContribution, OsintSignal, OsintSignalType, OsintStatus};
use crate::RiskMonitorResult;

fn clamp_confidence(signal: &OsintSignal) -> Decimal {
    let c = signal.confidence.max(Decimal::ZERO).min(Decimal::ONE);
    if c != signal.confidence {
        warn!(
            signal_type = %signal.signal_type,
            source = %signal.source,
            confidence = %signal.confidence,
            "OSINT confidence outside [0, 1], clamped"
        );
    }
    c
}

/// Strongest contribution wins; ties go to the lexicographically smaller source
/// so the outcome does not depend on provider ordering.
fn stronger(candidate: &OsintContribution, current: &OsintContribution) -> bool {
    candidate.contribution > current.contribution
        || (candidate.contribution == current.contribution && candidate.source < current.source)
}

/// Map a customer's OSINT signals to a bounded adjustment.
///
/// Fails only when `config` does not validate; missing signals are not an
/// error.
pub fn adjust(
    signals: Option<&[OsintSignal]>,
    config: &OsintConfig,
) -> RiskMonitorResult<OsintAdjustment> {
    config.validate()?;
    let signals = match signals {
        Some(s) if !s.is_empty() => s,
        _ => return Ok(OsintAdjustment::no_external_signal()),
    };

    let mut best: BTreeMap<OsintSignalType, OsintContribution> = BTreeMap::new();
    for signal in signals {
        let confidence = clamp_confidence(signal);
        let cap = config.caps.cap_for(signal.signal_type);
        let candidate = OsintContribution {
            signal_type: signal.signal_type,
            confidence,
            source: signal.source.clone(),
            max_contribution: cap,
            contribution: cap * confidence,
        };
        match best.get(&signal.signal_type) {
            Some(current) if !stronger(&candidate, current) => {}
            _ => {
                best.insert(signal.signal_type, candidate);
            }
        }
    }

    let mut contributions: Vec<OsintContribution> = best.into_values().collect();
    let total: Decimal = contributions.iter().map(|c| c.contribution).sum();
    let cap = config.total_cap;
    let value = total.max(-cap).min(cap);

    // Scale the trace down so it still adds up to the applied value.
    if value != total && !total.is_zero() {
        let factor = value / total;
        for c in &mut contributions {
            c.contribution = (c.contribution * factor).round_dp(4);
        }
    }

    debug!(
        signals = signals.len(),
        total = %total,
        applied = %value,
        "OSINT adjustment computed"
    );
    Ok(OsintAdjustment {
        value,
        status: OsintStatus::Applied,
        contributions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiskMonitorError;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn signal(signal_type: OsintSignalType, confidence: Decimal, source: &str) -> OsintSignal {
        OsintSignal {
            signal_type,
            confidence,
            source: source.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_missing_signals_yield_no_external_signal() {
        let adj = adjust(None, &OsintConfig::default()).unwrap();
        assert_eq!(adj.value, Decimal::ZERO);
        assert_eq!(adj.status, OsintStatus::NoExternalSignal);

        let adj = adjust(Some(&[][..]), &OsintConfig::default()).unwrap();
        assert_eq!(adj.value, Decimal::ZERO);
        assert_eq!(adj.status, OsintStatus::NoExternalSignal);
    }

    #[test]
    fn test_confidence_scales_cap_linearly() {
        let signals = [signal(OsintSignalType::Pep, dec!(0.88), "pep_database")];
        let adj = adjust(Some(&signals[..]), &OsintConfig::default()).unwrap();
        assert_eq!(adj.status, OsintStatus::Applied);
        assert_eq!(adj.value, dec!(8.8));
        assert_eq!(adj.contributions[0].max_contribution, dec!(10));
    }

    #[test]
    fn test_strongest_signal_per_type_counts_once() {
        let signals = [
            signal(OsintSignalType::AdverseMedia, dec!(0.5), "news_a"),
            signal(OsintSignalType::AdverseMedia, dec!(0.85), "news_b"),
        ];
        let adj = adjust(Some(&signals[..]), &OsintConfig::default()).unwrap();
        assert_eq!(adj.contributions.len(), 1);
        assert_eq!(adj.contributions[0].source, "news_b");
        assert_eq!(adj.value, dec!(10.2));
    }

    #[test]
    fn test_total_is_capped_and_trace_rescaled() {
        let signals = [
            signal(OsintSignalType::Sanctions, dec!(0.95), "sanctions_api"),
            signal(OsintSignalType::AdverseMedia, dec!(0.85), "news"),
        ];
        // 19 + 10.2 = 29.2, capped at 20
        let adj = adjust(Some(&signals[..]), &OsintConfig::default()).unwrap();
        assert_eq!(adj.value, dec!(20));
        let traced: Decimal = adj.contributions.iter().map(|c| c.contribution).sum();
        assert!((traced - dec!(20)).abs() <= dec!(0.001));
        assert!(adj.contributions[1].contribution > adj.contributions[0].contribution);
    }

    #[test]
    fn test_confidence_out_of_range_is_clamped() {
        let signals = [signal(OsintSignalType::DomainRisk, dec!(1.7), "domain_analysis")];
        let adj = adjust(Some(&signals[..]), &OsintConfig::default()).unwrap();
        assert_eq!(adj.value, dec!(6));
        assert_eq!(adj.contributions[0].confidence, Decimal::ONE);
    }

    #[test]
    fn test_signal_order_does_not_matter() {
        let a = signal(OsintSignalType::MerchantRisk, dec!(0.9), "b_source");
        let b = signal(OsintSignalType::MerchantRisk, dec!(0.9), "a_source");
        let c = signal(OsintSignalType::Pep, dec!(0.6), "pep_database");
        let config = OsintConfig::default();
        let forward = adjust(Some(&[a.clone(), b.clone(), c.clone()][..]), &config).unwrap();
        let backward = adjust(Some(&[c, b, a][..]), &config).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.contributions[1].source, "a_source");
    }

    #[test]
    fn test_invalid_caps_are_rejected() {
        let mut config = OsintConfig::default();
        config.total_cap = dec!(-5);
        let signals = [signal(OsintSignalType::Pep, dec!(0.5), "pep_database")];
        assert!(matches!(
            adjust(Some(&signals[..]), &config),
            Err(RiskMonitorError::Configuration { .. })
        ));
    }
}
