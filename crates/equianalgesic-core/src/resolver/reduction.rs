//! Safety-margin reduction of a converted dose.

use thiserror::Error;

use crate::config::ConverterConfig;
use crate::models::ConversionOutcome;

/// Reduction errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReductionError {
    #[error("Reduction of {percentage}% is not sanctioned (allowed: {allowed:?})")]
    UnsanctionedPercentage { percentage: u8, allowed: Vec<u8> },
}

pub type ReductionResult<T> = Result<T, ReductionError>;

/// Applies `value × (1 − p/100)` to numeric outcomes.
#[derive(Debug, Clone)]
pub struct ReductionCalculator {
    percentages: Vec<u8>,
    default_percentage: u8,
    precision: u32,
}

impl Default for ReductionCalculator {
    fn default() -> Self {
        Self::new(&ConverterConfig::default())
    }
}

impl ReductionCalculator {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            percentages: config.reduction_percentages.clone(),
            default_percentage: config.default_reduction,
            precision: config.precision,
        }
    }

    /// Sanctioned percentages, in display order.
    pub fn percentages(&self) -> &[u8] {
        &self.percentages
    }

    pub fn default_percentage(&self) -> u8 {
        self.default_percentage
    }

    /// Check that `percentage` is one of the sanctioned values.
    pub fn check(&self, percentage: u8) -> ReductionResult<()> {
        if self.percentages.contains(&percentage) {
            Ok(())
        } else {
            Err(ReductionError::UnsanctionedPercentage {
                percentage,
                allowed: self.percentages.clone(),
            })
        }
    }

    /// Reduce a numeric outcome. Labels and failures pass through unchanged.
    pub fn reduce(
        &self,
        outcome: &ConversionOutcome,
        percentage: u8,
    ) -> ReductionResult<ConversionOutcome> {
        self.check(percentage)?;

        if !outcome.is_numeric() {
            return Ok(outcome.clone());
        }

        let factor = 1.0 - f64::from(percentage) / 100.0;
        Ok(outcome.clone().scaled(factor).rounded(self.precision))
    }
}
