//! Equivalence rule models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TieBreak;

/// Rule construction errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("Conversion factor must be positive and finite, got {0}")]
    InvalidFactor(f64),

    #[error("Tiered rule has no tiers")]
    EmptyTiers,

    #[error("Tier threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),

    #[error("Duplicate tier threshold: {0}")]
    DuplicateThreshold(f64),

    #[error("Tier thresholds must be strictly ascending: {previous} then {next}")]
    UnorderedThresholds { previous: f64, next: f64 },

    #[error("Tier dose must be finite and non-negative, got {0}")]
    InvalidDose(f64),

    #[error("Tier range is inverted: [{min}, {max}]")]
    InvertedRange { min: f64, max: f64 },
}

pub type RuleResult<T> = Result<T, RuleError>;

/// How one (agent, route) converts to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionRule {
    /// output = input × factor, at any dose
    Linear { factor: f64 },
    /// No product exists at any dose
    Unavailable,
    /// Dose-banded equivalence
    Tiered(TieredRule),
}

impl ConversionRule {
    pub fn linear(factor: f64) -> RuleResult<Self> {
        check_ratio(factor)?;
        Ok(ConversionRule::Linear { factor })
    }

    pub fn tiered(tiers: Vec<Tier>, fallback_ratio: Option<f64>) -> RuleResult<Self> {
        Ok(ConversionRule::Tiered(TieredRule::new(tiers, fallback_ratio)?))
    }

    /// Re-check invariants (needed for `Linear` values that came from serde).
    pub fn validate(&self) -> RuleResult<()> {
        match self {
            ConversionRule::Linear { factor } => check_ratio(*factor),
            ConversionRule::Unavailable => Ok(()),
            ConversionRule::Tiered(rule) => TieredRule::check(&rule.tiers, rule.fallback_ratio),
        }
    }
}

/// Outcome attached to a single tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierOutcome {
    Dose(f64),
    Range { min: f64, max: f64 },
    /// Opaque value such as a named patch strength; never reduced.
    Label(String),
    /// No product exists for this band.
    NoProduct,
}

impl TierOutcome {
    fn check(&self) -> RuleResult<()> {
        match self {
            TierOutcome::Dose(dose) => check_dose(*dose),
            TierOutcome::Range { min, max } => {
                check_dose(*min)?;
                check_dose(*max)?;
                if min > max {
                    return Err(RuleError::InvertedRange {
                        min: *min,
                        max: *max,
                    });
                }
                Ok(())
            }
            TierOutcome::Label(_) | TierOutcome::NoProduct => Ok(()),
        }
    }
}

/// A threshold dose and what it maps to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub threshold: f64,
    pub outcome: TierOutcome,
}

impl Tier {
    pub fn new(threshold: f64, outcome: TierOutcome) -> Self {
        Self { threshold, outcome }
    }
}

/// Tiers sorted strictly ascending by threshold, plus an optional ratio used
/// between thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTieredRule", into = "RawTieredRule")]
pub struct TieredRule {
    tiers: Vec<Tier>,
    fallback_ratio: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTieredRule {
    tiers: Vec<Tier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fallback_ratio: Option<f64>,
}

impl TryFrom<RawTieredRule> for TieredRule {
    type Error = RuleError;

    fn try_from(raw: RawTieredRule) -> Result<Self, Self::Error> {
        TieredRule::new(raw.tiers, raw.fallback_ratio)
    }
}

impl From<TieredRule> for RawTieredRule {
    fn from(rule: TieredRule) -> Self {
        Self {
            tiers: rule.tiers,
            fallback_ratio: rule.fallback_ratio,
        }
    }
}

impl TieredRule {
    pub fn new(tiers: Vec<Tier>, fallback_ratio: Option<f64>) -> RuleResult<Self> {
        Self::check(&tiers, fallback_ratio)?;
        Ok(Self {
            tiers,
            fallback_ratio,
        })
    }

    fn check(tiers: &[Tier], fallback_ratio: Option<f64>) -> RuleResult<()> {
        if tiers.is_empty() {
            return Err(RuleError::EmptyTiers);
        }
        if let Some(ratio) = fallback_ratio {
            check_ratio(ratio)?;
        }

        for tier in tiers {
            if !tier.threshold.is_finite() || tier.threshold < 0.0 {
                return Err(RuleError::InvalidThreshold(tier.threshold));
            }
            tier.outcome.check()?;
        }

        for pair in tiers.windows(2) {
            let (previous, next) = (pair[0].threshold, pair[1].threshold);
            if previous == next {
                return Err(RuleError::DuplicateThreshold(next));
            }
            if previous > next {
                return Err(RuleError::UnorderedThresholds { previous, next });
            }
        }

        Ok(())
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn fallback_ratio(&self) -> Option<f64> {
        self.fallback_ratio
    }

    /// Tier whose threshold equals `dose` exactly.
    pub fn exact(&self, dose: f64) -> Option<&Tier> {
        self.tiers
            .binary_search_by(|t| t.threshold.total_cmp(&dose))
            .ok()
            .map(|i| &self.tiers[i])
    }

    /// Tier whose threshold is closest to `dose`.
    ///
    /// Equidistant neighbours are resolved by `tie_break`, never by iteration
    /// order.
    pub fn nearest(&self, dose: f64, tie_break: TieBreak) -> &Tier {
        let idx = match self
            .tiers
            .binary_search_by(|t| t.threshold.total_cmp(&dose))
        {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) if i == self.tiers.len() => i - 1,
            Err(i) => {
                let below = dose - self.tiers[i - 1].threshold;
                let above = self.tiers[i].threshold - dose;
                if below < above {
                    i - 1
                } else if above < below {
                    i
                } else {
                    match tie_break {
                        TieBreak::PreferLower => i - 1,
                        TieBreak::PreferHigher => i,
                    }
                }
            }
        };
        &self.tiers[idx]
    }
}

fn check_ratio(ratio: f64) -> RuleResult<()> {
    if ratio.is_finite() && ratio > 0.0 {
        Ok(())
    } else {
        Err(RuleError::InvalidFactor(ratio))
    }
}

fn check_dose(dose: f64) -> RuleResult<()> {
    if dose.is_finite() && dose >= 0.0 {
        Ok(())
    } else {
        Err(RuleError::InvalidDose(dose))
    }
}
