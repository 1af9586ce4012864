//! Combined score and tier.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::ScoringConfig;
use crate::explain::explain;
use crate::types::{clip_points, Customer, OsintAdjustment, RiskScore, SubScore, SubScoreKind};

/// Weight the two sub-scores, add the OSINT adjustment, clip to [0, 100] and
/// assign the tier.
///
/// Pure: the same inputs and `generated_at` always produce the same score
/// and explanation. `config` must already be validated.
pub(crate) fn combine(
    customer: &Customer,
    credit: SubScore,
    aml: SubScore,
    osint: OsintAdjustment,
    config: &ScoringConfig,
    generated_at: DateTime<Utc>,
) -> RiskScore {
    debug_assert_eq!(credit.kind, SubScoreKind::Credit);
    debug_assert_eq!(aml.kind, SubScoreKind::Aml);

    let weights = config.combiner.clone();
    let base = weights.credit * credit.value + weights.aml * aml.value;
    let combined_value = clip_points(base + osint.value);
    let tier = config.tiers.tier_for(combined_value);
    let confidence = (credit.confidence + aml.confidence) / Decimal::TWO;

    let mut score = RiskScore {
        customer_id: customer.id.clone(),
        customer_name: customer.name.clone(),
        combined_value,
        tier,
        confidence,
        credit_subscore: credit,
        aml_subscore: aml,
        osint_adjustment: osint,
        weights,
        explanation: Vec::new(),
        generated_at,
    };
    score.explanation = explain(&score, config.explain.materiality);

    debug!(
        customer = %customer.id,
        base = %base,
        combined = %combined_value,
        tier = %tier,
        "scores combined"
    );
    score
}
