//! Converter configuration.
//!
//! Everything here has a compiled-in default; hosts may override it with a
//! JSON document via [`ConverterConfig::from_json`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::models::{Route, RouteKey};

/// Fractional digits kept in numeric outcomes.
pub const DEFAULT_PRECISION: u32 = 2;

/// Clinically sanctioned safety reductions, in percent.
pub const SANCTIONED_REDUCTIONS: [u8; 6] = [25, 30, 35, 40, 45, 50];

/// Reduction preselected for the host UI.
pub const DEFAULT_REDUCTION: u8 = 30;

/// Agent of the canonical hub key indirect conversions go through.
pub const HUB_AGENT: &str = "Morphine";

/// Route of the canonical hub key.
pub const HUB_ROUTE: Route = Route::Oral;

const MAX_PRECISION: u32 = 6;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "equianalgesic_core=info"
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Precision {0} exceeds the maximum of {max}", max = MAX_PRECISION)]
    PrecisionTooHigh(u32),

    #[error("Reduction percentages must be between 1 and 99, got {0}")]
    InvalidPercentage(u8),

    #[error("Default reduction {0} is not one of the sanctioned percentages")]
    InvalidDefaultReduction(u8),

    #[error("Hub {0} is not in the catalog")]
    UnknownHub(RouteKey),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which threshold wins when a dose sits exactly between two tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The lower threshold (the more conservative choice for dose-up tables)
    #[default]
    PreferLower,
    PreferHigher,
}

/// Tunables of the resolver and reduction calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub precision: u32,
    pub reduction_percentages: Vec<u8>,
    pub default_reduction: u8,
    pub hub: RouteKey,
    pub tie_break: TieBreak,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            reduction_percentages: SANCTIONED_REDUCTIONS.to_vec(),
            default_reduction: DEFAULT_REDUCTION,
            hub: RouteKey::new(HUB_AGENT, HUB_ROUTE),
            tie_break: TieBreak::default(),
        }
    }
}

impl ConverterConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: ConverterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.precision > MAX_PRECISION {
            return Err(ConfigError::PrecisionTooHigh(self.precision));
        }
        if let Some(&bad) = self
            .reduction_percentages
            .iter()
            .find(|&&p| p == 0 || p >= 100)
        {
            return Err(ConfigError::InvalidPercentage(bad));
        }
        if !self.reduction_percentages.contains(&self.default_reduction) {
            return Err(ConfigError::InvalidDefaultReduction(self.default_reduction));
        }
        Ok(())
    }

    /// Validate, and check that the hub key exists in `catalog`.
    pub fn validate_against(&self, catalog: &Catalog) -> ConfigResult<()> {
        self.validate()?;
        if !catalog.contains(&self.hub) {
            return Err(ConfigError::UnknownHub(self.hub.clone()));
        }
        Ok(())
    }
}
