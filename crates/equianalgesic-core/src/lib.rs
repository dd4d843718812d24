//! Equianalgesic Core Library
//!
//! Opioid dose conversion between agents and administration routes.
//!
//! # Architecture
//!
//! ```text
//! (source agent+route, dose, unit, target agent+route)
//!                         │
//!                 Unit Normalization
//!                         │
//!              Identity? ──yes──► dose unchanged
//!                         │
//!                    Table Lookup
//!                         │
//!        ┌────────────┬───┴─────────┬──────────────────┐
//!        ▼            ▼             ▼                  ▼
//!     (absent)   Unavailable      Linear             Tiered
//!   convert via  no product    dose × factor   exact → ratio → closest
//!   the hub first
//!                         │
//!              Optional safety reduction
//! ```
//!
//! # Core Principle
//!
//! **Never guess a path.** A missing table entry is reported, never chained
//! through an intermediate agent, and every approximation is flagged.
//!
//! # Modules
//!
//! - [`models`]: Domain types (RouteKey, ConversionRule, ConversionOutcome, etc.)
//! - [`catalog`]: Agents, their routes and canonical units
//! - [`table`]: Directed rule table and the compiled-in data
//! - [`formulary`]: Validated catalog + table pair, JSON loading, fingerprint
//! - [`resolver`]: Conversion resolver, normalizer and reduction calculator
//! - [`config`]: Converter configuration

pub mod catalog;
pub mod config;
pub mod formulary;
pub mod models;
pub mod resolver;
pub mod table;

// Re-export commonly used types
pub use catalog::{AgentEntry, Catalog, CatalogError, RouteEntry};
pub use config::{ConverterConfig, TieBreak};
pub use formulary::Formulary;
pub use models::{
    ConversionOutcome, ConversionRequest, ConversionRule, DoseUnit, Resolution, ResolutionPath,
    Route, RouteKey, Severity, Tier, TierOutcome, TieredRule,
};
pub use resolver::{Normalizer, ReductionCalculator, Resolver};
pub use table::RuleTable;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Message shown when a selection is missing.
const MISSING_FIELDS: &str = "Please fill in all fields";

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ConverterError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<catalog::CatalogError> for ConverterError {
    fn from(e: catalog::CatalogError) -> Self {
        ConverterError::NotFound(e.to_string())
    }
}

impl From<table::TableError> for ConverterError {
    fn from(e: table::TableError) -> Self {
        ConverterError::InvalidData(e.to_string())
    }
}

impl From<resolver::ResolverError> for ConverterError {
    fn from(e: resolver::ResolverError) -> Self {
        ConverterError::NotFound(e.to_string())
    }
}

impl From<resolver::ReductionError> for ConverterError {
    fn from(e: resolver::ReductionError) -> Self {
        ConverterError::InvalidInput(e.to_string())
    }
}

impl From<resolver::NormalizeError> for ConverterError {
    fn from(e: resolver::NormalizeError) -> Self {
        ConverterError::InvalidInput(e.to_string())
    }
}

impl From<config::ConfigError> for ConverterError {
    fn from(e: config::ConfigError) -> Self {
        ConverterError::Configuration(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install a `tracing` subscriber. `filter` overrides `RUST_LOG`.
///
/// Returns false when a subscriber was already installed.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) -> bool {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

/// Open a converter over the compiled-in formulary.
#[uniffi::export]
pub fn open_builtin_converter() -> Arc<OpioidConverter> {
    Arc::new(OpioidConverter {
        formulary: Arc::new(Formulary::builtin().clone()),
        config: ConverterConfig::default(),
    })
}

/// Open a converter over a JSON formulary, with an optional JSON config.
#[uniffi::export]
pub fn open_converter_from_json(
    formulary_json: String,
    config_json: Option<String>,
) -> Result<Arc<OpioidConverter>, ConverterError> {
    let formulary = Formulary::from_json(&formulary_json)?;
    let config = match config_json {
        Some(json) => ConverterConfig::from_json(&json)?,
        None => ConverterConfig::default(),
    };
    config.validate_against(formulary.catalog())?;

    Ok(Arc::new(OpioidConverter {
        formulary: Arc::new(formulary),
        config,
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe converter for FFI. Immutable after construction.
#[derive(uniffi::Object)]
pub struct OpioidConverter {
    formulary: Arc<Formulary>,
    config: ConverterConfig,
}

#[uniffi::export]
impl OpioidConverter {
    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Registered agent names, in display order.
    pub fn agents(&self) -> Vec<String> {
        self.formulary
            .catalog()
            .agents()
            .map(|a| a.name.clone())
            .collect()
    }

    /// Routes of an agent, as display strings.
    pub fn routes_of(&self, agent: String) -> Result<Vec<String>, ConverterError> {
        let catalog = self.formulary.catalog();
        let routes = catalog.routes_of(&agent).ok_or_else(|| {
            CatalogError::UnknownAgent {
                suggestion: catalog.suggest_agent(&agent).map(str::to_string),
                name: agent.clone(),
            }
        })?;
        Ok(routes.iter().map(|r| r.to_string()).collect())
    }

    /// Canonical dose unit for an agent and route.
    pub fn unit_of(&self, agent: String, route: String) -> Result<String, ConverterError> {
        let key = self.route_key(&agent, &route)?;
        let unit = self
            .formulary
            .catalog()
            .unit_of(&key)
            .ok_or_else(|| ConverterError::NotFound(key.to_string()))?;
        Ok(unit.to_string())
    }

    // =========================================================================
    // Conversion Operations
    // =========================================================================

    /// Convert a dose. Missing selections come back as an `invalid_input`
    /// outcome rather than an error.
    pub fn convert(&self, request: FfiConversionRequest) -> Result<FfiConversion, ConverterError> {
        let dose = match request.dose {
            Some(dose)
                if !request.source_agent.trim().is_empty()
                    && !request.source_route.trim().is_empty()
                    && !request.target_agent.trim().is_empty()
                    && !request.target_route.trim().is_empty() =>
            {
                dose
            }
            _ => {
                return Ok(Resolution::rejected(
                    ConversionOutcome::InvalidInput(MISSING_FIELDS.into()),
                    None,
                )
                .into())
            }
        };

        let source = self.route_key(&request.source_agent, &request.source_route)?;
        let target = self.route_key(&request.target_agent, &request.target_route)?;

        let resolver = self.formulary.resolver_with_config(self.config.clone())?;
        let resolution = match request.dose_unit.as_deref().map(str::trim) {
            Some(unit) if !unit.is_empty() => {
                let unit = resolver.normalizer().canonicalize_unit(unit)?;
                resolver.resolve_with_unit(&source, dose, unit, &target)?
            }
            _ => resolver.resolve(&source, dose, &target)?,
        };

        Ok(resolution.into())
    }

    /// Apply a safety reduction to a previously converted outcome.
    pub fn reduce(&self, outcome: FfiOutcome, percentage: u8) -> Result<FfiOutcome, ConverterError> {
        let outcome = outcome.to_outcome(&self.config)?;
        let reduced = ReductionCalculator::new(&self.config).reduce(&outcome, percentage)?;
        Ok(reduced.into())
    }

    /// Sanctioned reduction percentages.
    pub fn reduction_percentages(&self) -> Vec<u8> {
        self.config.reduction_percentages.clone()
    }

    pub fn default_reduction(&self) -> u8 {
        self.config.default_reduction
    }

    /// SHA-256 of the loaded formulary, for recording alongside results.
    pub fn table_fingerprint(&self) -> Result<String, ConverterError> {
        Ok(self.formulary.fingerprint()?)
    }
}

impl OpioidConverter {
    fn route_key(&self, agent: &str, route: &str) -> Result<RouteKey, ConverterError> {
        let normalizer = Normalizer::new();
        let route = normalizer.canonicalize_route(route)?;
        Ok(self.formulary.catalog().resolve_key(agent.trim(), route)?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe conversion request. Empty strings mean "not selected".
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConversionRequest {
    pub source_agent: String,
    pub source_route: String,
    pub dose: Option<f64>,
    /// Unit the dose was entered in; the source route's unit when absent
    pub dose_unit: Option<String>,
    pub target_agent: String,
    pub target_route: String,
}

/// FFI-safe conversion outcome.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiOutcome {
    /// One of `value`, `range`, `label`, `invalid_input`,
    /// `no_direct_conversion`, `no_product_available`
    pub kind: String,
    pub value: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub label: Option<String>,
    /// Display text (formatted value or failure message)
    pub message: String,
}

impl From<ConversionOutcome> for FfiOutcome {
    fn from(outcome: ConversionOutcome) -> Self {
        let message = outcome.to_string();
        let kind = outcome.kind().to_string();
        let (value, min, max, label) = match outcome {
            ConversionOutcome::Value(v) => (Some(v), None, None, None),
            ConversionOutcome::Range { min, max } => (None, Some(min), Some(max), None),
            ConversionOutcome::Label(label) => (None, None, None, Some(label)),
            _ => (None, None, None, None),
        };
        Self {
            kind,
            value,
            min,
            max,
            label,
            message,
        }
    }
}

impl FfiOutcome {
    /// Rebuild the domain outcome. Failure outcomes keep their message.
    pub fn to_outcome(&self, config: &ConverterConfig) -> Result<ConversionOutcome, ConverterError> {
        let missing = |field: &str| {
            ConverterError::InvalidInput(format!("{} outcome without {}", self.kind, field))
        };

        match self.kind.as_str() {
            "value" => Ok(ConversionOutcome::Value(
                self.value.ok_or_else(|| missing("value"))?,
            )),
            "range" => Ok(ConversionOutcome::Range {
                min: self.min.ok_or_else(|| missing("min"))?,
                max: self.max.ok_or_else(|| missing("max"))?,
            }),
            "label" => Ok(ConversionOutcome::Label(
                self.label.clone().ok_or_else(|| missing("label"))?,
            )),
            "invalid_input" => Ok(ConversionOutcome::InvalidInput(self.message.clone())),
            "no_direct_conversion" => Ok(ConversionOutcome::NoDirectConversion {
                hub: config.hub.clone(),
            }),
            "no_product_available" => Ok(ConversionOutcome::NoProductAvailable),
            other => Err(ConverterError::InvalidInput(format!(
                "Unknown outcome kind: {}",
                other
            ))),
        }
    }
}

/// FFI-safe conversion result.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiConversion {
    pub outcome: FfiOutcome,
    /// How the outcome was reached (`identity`, `linear`, `exact_tier`, ...)
    pub path: String,
    /// `none` or `warning`
    pub severity: String,
    pub note: String,
    /// Canonical unit of the target route
    pub unit: Option<String>,
}

impl From<Resolution> for FfiConversion {
    fn from(resolution: Resolution) -> Self {
        Self {
            path: resolution.path.as_str().to_string(),
            severity: resolution.severity().as_str().to_string(),
            note: resolution.note(),
            unit: resolution.unit.map(|u| u.to_string()),
            outcome: resolution.outcome.into(),
        }
    }
}
