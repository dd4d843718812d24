//! Conversion outcome models.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{DoseUnit, RouteKey, TierOutcome};

/// Result value of a single conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionOutcome {
    Value(f64),
    Range { min: f64, max: f64 },
    /// Opaque value such as a named patch strength
    Label(String),
    /// Missing selection or unusable dose
    InvalidInput(String),
    /// No table entry; the caller should go through `hub` first
    NoDirectConversion { hub: RouteKey },
    /// The table states that no product exists for this pair
    NoProductAvailable,
}

impl ConversionOutcome {
    /// Whether this outcome is one of the failure codes.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ConversionOutcome::InvalidInput(_)
                | ConversionOutcome::NoDirectConversion { .. }
                | ConversionOutcome::NoProductAvailable
        )
    }

    /// Whether arithmetic (e.g. a safety reduction) can be applied.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ConversionOutcome::Value(_) | ConversionOutcome::Range { .. }
        )
    }

    pub fn as_value(&self) -> Option<f64> {
        match self {
            ConversionOutcome::Value(v) => Some(*v),
            _ => None,
        }
    }

    /// Short machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ConversionOutcome::Value(_) => "value",
            ConversionOutcome::Range { .. } => "range",
            ConversionOutcome::Label(_) => "label",
            ConversionOutcome::InvalidInput(_) => "invalid_input",
            ConversionOutcome::NoDirectConversion { .. } => "no_direct_conversion",
            ConversionOutcome::NoProductAvailable => "no_product_available",
        }
    }

    /// Round numeric parts to `precision` fractional digits.
    pub fn rounded(self, precision: u32) -> Self {
        match self {
            ConversionOutcome::Value(v) => ConversionOutcome::Value(round_to(v, precision)),
            ConversionOutcome::Range { min, max } => ConversionOutcome::Range {
                min: round_to(min, precision),
                max: round_to(max, precision),
            },
            other => other,
        }
    }

    /// Multiply numeric parts by `factor`; other outcomes pass through.
    pub fn scaled(self, factor: f64) -> Self {
        match self {
            ConversionOutcome::Value(v) => ConversionOutcome::Value(v * factor),
            ConversionOutcome::Range { min, max } => ConversionOutcome::Range {
                min: min * factor,
                max: max * factor,
            },
            other => other,
        }
    }
}

impl From<&TierOutcome> for ConversionOutcome {
    fn from(outcome: &TierOutcome) -> Self {
        match outcome {
            TierOutcome::Dose(dose) => ConversionOutcome::Value(*dose),
            TierOutcome::Range { min, max } => ConversionOutcome::Range {
                min: *min,
                max: *max,
            },
            TierOutcome::Label(label) => ConversionOutcome::Label(label.clone()),
            TierOutcome::NoProduct => ConversionOutcome::NoProductAvailable,
        }
    }
}

impl fmt::Display for ConversionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionOutcome::Value(v) => write!(f, "{:.2}", v),
            ConversionOutcome::Range { min, max } => write!(f, "{:.2}-{:.2}", min, max),
            ConversionOutcome::Label(label) => f.write_str(label),
            ConversionOutcome::InvalidInput(reason) => f.write_str(reason),
            ConversionOutcome::NoDirectConversion { hub } => write!(
                f,
                "Direct conversion not available. Please convert to {} first.",
                hub
            ),
            ConversionOutcome::NoProductAvailable => {
                f.write_str("No product available for the given dose and conversion.")
            }
        }
    }
}

/// Which resolution strategy produced an outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    /// Source and target are the same key
    Identity,
    /// Fixed ratio
    Linear,
    /// Dose matched a tier threshold exactly
    ExactTier,
    /// No exact tier; the approximate ratio was applied
    FallbackRatioUsed,
    /// No exact tier and no ratio; the nearest tier was used
    ClosestDoseUsed { threshold: f64 },
    /// The request produced a failure outcome
    Rejected,
}

impl ResolutionPath {
    pub fn severity(&self) -> Severity {
        match self {
            ResolutionPath::FallbackRatioUsed | ResolutionPath::ClosestDoseUsed { .. } => {
                Severity::Warning
            }
            ResolutionPath::Identity
            | ResolutionPath::Linear
            | ResolutionPath::ExactTier
            | ResolutionPath::Rejected => Severity::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPath::Identity => "identity",
            ResolutionPath::Linear => "linear",
            ResolutionPath::ExactTier => "exact_tier",
            ResolutionPath::FallbackRatioUsed => "fallback_ratio_used",
            ResolutionPath::ClosestDoseUsed { .. } => "closest_dose_used",
            ResolutionPath::Rejected => "rejected",
        }
    }
}

/// Visual treatment hint for the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    None,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Warning => "warning",
        }
    }
}

/// Outcome of `Resolver::resolve`, owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub outcome: ConversionOutcome,
    pub path: ResolutionPath,
    /// Canonical unit of the target key
    pub unit: Option<DoseUnit>,
}

impl Resolution {
    pub fn new(outcome: ConversionOutcome, path: ResolutionPath, unit: Option<DoseUnit>) -> Self {
        Self {
            outcome,
            path,
            unit,
        }
    }

    pub fn rejected(outcome: ConversionOutcome, unit: Option<DoseUnit>) -> Self {
        Self::new(outcome, ResolutionPath::Rejected, unit)
    }

    pub fn is_success(&self) -> bool {
        !self.outcome.is_failure()
    }

    pub fn severity(&self) -> Severity {
        self.path.severity()
    }

    /// Human-readable description of how the outcome was reached.
    pub fn note(&self) -> String {
        match &self.path {
            ResolutionPath::Identity => "Same agent and route; dose unchanged.".into(),
            ResolutionPath::Linear => "Converted with a fixed equianalgesic ratio.".into(),
            ResolutionPath::ExactTier => "Matched a tabulated dose exactly.".into(),
            ResolutionPath::FallbackRatioUsed => {
                "No tabulated dose matches; approximate ratio used. \
                 A product may not exist at this exact dose."
                    .into()
            }
            ResolutionPath::ClosestDoseUsed { threshold } => format!(
                "No tabulated dose matches; closest tabulated dose ({}) used.",
                threshold
            ),
            ResolutionPath::Rejected => self.outcome.to_string(),
        }
    }
}

/// A single conversion request, for batch resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub source: RouteKey,
    pub dose: f64,
    /// Unit the dose was entered in; the source key's unit when absent
    pub unit: Option<DoseUnit>,
    pub target: RouteKey,
}

/// Largest magnitude at which every `f64` is still a whole number step apart.
const EXACT_INTEGER_LIMIT: f64 = 4_503_599_627_370_496.0; // 2^52

/// Round half away from zero to `precision` fractional digits.
///
/// Values too large to carry `precision` fractional digits are returned
/// unchanged.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision.min(i32::MAX as u32) as i32);
    if !value.is_finite() || value.abs() >= EXACT_INTEGER_LIMIT / scale {
        return value;
    }
    (value * scale).round() / scale
}
