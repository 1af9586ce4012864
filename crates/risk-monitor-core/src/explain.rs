//! Human-readable explanation of a RiskScore.
//!
//! Every statement is derived from the factor trace carried by the score, so
//! an explanation never mentions something that did not move the number.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Points, RiskScore, SubScoreKind};

/// Where a material factor came from. Ordering is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorSource {
    Credit,
    Aml,
    Osint,
}

impl FactorSource {
    fn prefix(&self) -> &'static str {
        match self {
            FactorSource::Credit => "Credit",
            FactorSource::Aml => "AML",
            FactorSource::Osint => "OSINT",
        }
    }
}

impl From<SubScoreKind> for FactorSource {
    fn from(kind: SubScoreKind) -> Self {
        match kind {
            SubScoreKind::Credit => FactorSource::Credit,
            SubScoreKind::Aml => FactorSource::Aml,
        }
    }
}

/// A trace entry whose impact on the combined score exceeds materiality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialFactor {
    pub source: FactorSource,
    pub name: String,
    /// Points this factor moved the combined score by.
    pub impact: Points,
    pub statement: String,
}

fn signed(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    if rounded.is_sign_negative() {
        rounded.to_string()
    } else {
        format!("+{rounded}")
    }
}

fn by_magnitude(a: &MaterialFactor, b: &MaterialFactor) -> Ordering {
    b.impact
        .abs()
        .cmp(&a.impact.abs())
        .then_with(|| a.source.cmp(&b.source))
        .then_with(|| a.name.cmp(&b.name))
}

/// Structured form of [`explain`]: material factors, largest impact first.
pub fn material_factors(score: &RiskScore, materiality: Points) -> Vec<MaterialFactor> {
    let mut out = Vec::new();

    for kind in [SubScoreKind::Credit, SubScoreKind::Aml] {
        let weight = score.weight_of(kind);
        let source = FactorSource::from(kind);
        for factor in &score.subscore(kind).factors {
            let impact = factor.contribution * weight;
            if impact.abs() <= materiality {
                continue;
            }
            let statement = format!(
                "{} {}: {} points (raw value {}, {} risk points at weight {})",
                source.prefix(),
                factor.name.replace('_', " "),
                signed(impact),
                factor.raw_value.normalize(),
                factor.points.normalize(),
                factor.weight.normalize(),
            );
            out.push(MaterialFactor {
                source,
                name: factor.name.clone(),
                impact,
                statement,
            });
        }
    }

    for c in &score.osint_adjustment.contributions {
        if c.contribution.abs() <= materiality {
            continue;
        }
        let statement = format!(
            "OSINT {} from {}: {} points (confidence {})",
            c.signal_type.label(),
            c.source,
            signed(c.contribution),
            c.confidence.normalize(),
        );
        out.push(MaterialFactor {
            source: FactorSource::Osint,
            name: c.signal_type.to_string(),
            impact: c.contribution,
            statement,
        });
    }

    out.sort_by(by_magnitude);
    out
}

/// One statement per material factor, largest impact first.
pub fn explain(score: &RiskScore, materiality: Points) -> Vec<String> {
    material_factors(score, materiality)
        .into_iter()
        .map(|f| f.statement)
        .collect()
}
