//! Conversion resolver.
//!
//! Pipeline: Unit Normalization → Identity → Table Lookup → Tiered Resolution

mod normalizer;
mod reduction;
mod tiered;

pub use normalizer::*;
pub use reduction::*;
pub use tiered::*;

use thiserror::Error;

use crate::catalog::Catalog;
use crate::config::{ConfigResult, ConverterConfig};
use crate::formulary::Formulary;
use crate::models::{
    round_to, ConversionOutcome, ConversionRequest, ConversionRule, DoseUnit, Resolution,
    ResolutionPath, RouteKey,
};
use crate::table::RuleTable;

/// Resolver errors.
///
/// These are caller bugs, not conversion outcomes: expected conditions are
/// reported through [`ConversionOutcome`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolverError {
    #[error("Route key not in catalog: {0}")]
    UnknownRouteKey(RouteKey),
}

pub type ResolverResult<T> = Result<T, ResolverError>;

/// Resolves (source, dose, target) triples against a formulary.
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    table: &'a RuleTable,
    config: ConverterConfig,
    normalizer: Normalizer,
}

impl<'a> Resolver<'a> {
    /// Create a resolver with the default configuration.
    pub fn new(formulary: &'a Formulary) -> Self {
        Self::unchecked(formulary, ConverterConfig::default())
    }

    /// Create a resolver with a custom configuration.
    ///
    /// The configuration is validated against the formulary's catalog.
    pub fn with_config(formulary: &'a Formulary, config: ConverterConfig) -> ConfigResult<Self> {
        config.validate_against(formulary.catalog())?;
        Ok(Self::unchecked(formulary, config))
    }

    fn unchecked(formulary: &'a Formulary, config: ConverterConfig) -> Self {
        Self {
            catalog: formulary.catalog(),
            table: formulary.rules(),
            config,
            normalizer: Normalizer::new(),
        }
    }

    /// Convert `dose` (in the source key's unit) to the target key.
    pub fn resolve(
        &self,
        source: &RouteKey,
        dose: f64,
        target: &RouteKey,
    ) -> ResolverResult<Resolution> {
        let source = self.canonical(source)?;
        let target = self.canonical(target)?;
        let unit = self.catalog.unit_of(&target);

        // Step 1: Reject unusable doses before touching the table
        if !dose.is_finite() || dose < 0.0 {
            return Ok(Resolution::rejected(
                ConversionOutcome::InvalidInput(format!(
                    "Dose must be a finite, non-negative number, got {}",
                    dose
                )),
                unit,
            ));
        }
        // -0.0 passes the check above; tier thresholds compare with total_cmp
        let dose = if dose == 0.0 { 0.0 } else { dose };

        // Step 2: Identity wins over any table entry
        if source == target {
            return Ok(Resolution::new(
                ConversionOutcome::Value(dose),
                ResolutionPath::Identity,
                unit,
            ));
        }

        // Step 3: Dispatch on the tabulated rule
        let resolution = match self.table.rule(&source, &target) {
            None => {
                tracing::debug!(%source, %target, hub = %self.config.hub, "No direct conversion");
                Resolution::rejected(
                    ConversionOutcome::NoDirectConversion {
                        hub: self.config.hub.clone(),
                    },
                    unit,
                )
            }
            Some(ConversionRule::Unavailable) => {
                tracing::debug!(%source, %target, "No product available");
                Resolution::rejected(ConversionOutcome::NoProductAvailable, unit)
            }
            Some(ConversionRule::Linear { factor }) => {
                let converted = dose * factor;
                if converted.is_finite() {
                    Resolution::new(
                        ConversionOutcome::Value(round_to(converted, self.config.precision)),
                        ResolutionPath::Linear,
                        unit,
                    )
                } else {
                    Resolution::rejected(out_of_range(dose), unit)
                }
            }
            Some(ConversionRule::Tiered(rule)) => {
                let (outcome, path) =
                    resolve_tiered(rule, dose, self.config.tie_break, self.config.precision);
                Resolution::new(outcome, path, unit)
            }
        };

        tracing::debug!(
            %source,
            %target,
            dose,
            path = resolution.path.as_str(),
            outcome = %resolution.outcome,
            "Resolved conversion"
        );

        Ok(resolution)
    }

    /// Convert a dose entered in `unit`, normalizing it to the source key's
    /// unit first.
    pub fn resolve_with_unit(
        &self,
        source: &RouteKey,
        dose: f64,
        unit: DoseUnit,
        target: &RouteKey,
    ) -> ResolverResult<Resolution> {
        let source = self.canonical(source)?;
        let source_unit = self
            .catalog
            .unit_of(&source)
            .ok_or_else(|| ResolverError::UnknownRouteKey(source.clone()))?;

        match self.normalizer.convert_dose(dose, unit, source_unit) {
            Ok(normalized) => self.resolve(&source, normalized, target),
            Err(e) => {
                let target = self.canonical(target)?;
                Ok(Resolution::rejected(
                    ConversionOutcome::InvalidInput(e.to_string()),
                    self.catalog.unit_of(&target),
                ))
            }
        }
    }

    /// Resolve a batch of independent requests.
    pub fn resolve_all(&self, requests: &[ConversionRequest]) -> Vec<ResolverResult<Resolution>> {
        requests
            .iter()
            .map(|r| match r.unit {
                Some(unit) => self.resolve_with_unit(&r.source, r.dose, unit, &r.target),
                None => self.resolve(&r.source, r.dose, &r.target),
            })
            .collect()
    }

    /// Reduction calculator sharing this resolver's configuration.
    pub fn reduction(&self) -> ReductionCalculator {
        ReductionCalculator::new(&self.config)
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Get the normalizer for direct access.
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    fn canonical(&self, key: &RouteKey) -> ResolverResult<RouteKey> {
        self.catalog
            .canonical(key)
            .ok_or_else(|| ResolverError::UnknownRouteKey(key.clone()))
    }
}

/// Outcome for a dose whose converted value leaves the `f64` range.
fn out_of_range(dose: f64) -> ConversionOutcome {
    ConversionOutcome::InvalidInput(format!("Dose {} is too large to convert", dose))
}
