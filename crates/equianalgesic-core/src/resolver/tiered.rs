//! Dose-banded resolution.
//!
//! Order of precedence:
//! 1. Exact threshold match
//! 2. Fallback ratio, when the rule has one
//! 3. Nearest threshold

use crate::config::TieBreak;
use crate::models::{round_to, ConversionOutcome, ResolutionPath, TieredRule};

/// Resolve `dose` against a tiered rule.
pub fn resolve_tiered(
    rule: &TieredRule,
    dose: f64,
    tie_break: TieBreak,
    precision: u32,
) -> (ConversionOutcome, ResolutionPath) {
    if let Some(tier) = rule.exact(dose) {
        tracing::debug!(threshold = tier.threshold, "Exact tier match");
        return (
            ConversionOutcome::from(&tier.outcome).rounded(precision),
            ResolutionPath::ExactTier,
        );
    }

    if let Some(ratio) = rule.fallback_ratio() {
        let converted = dose * ratio;
        if !converted.is_finite() {
            return (super::out_of_range(dose), ResolutionPath::Rejected);
        }
        tracing::warn!(dose, ratio, "No exact tier; using fallback ratio");
        return (
            ConversionOutcome::Value(round_to(converted, precision)),
            ResolutionPath::FallbackRatioUsed,
        );
    }

    let tier = rule.nearest(dose, tie_break);
    tracing::warn!(dose, threshold = tier.threshold, "No exact tier; using closest");
    (
        ConversionOutcome::from(&tier.outcome).rounded(precision),
        ResolutionPath::ClosestDoseUsed {
            threshold: tier.threshold,
        },
    )
}
