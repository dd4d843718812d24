//! Input normalizer.
//!
//! Handles:
//! - Unit spellings (microgram→mcg, mcg/hr→mcg/hour, etc.)
//! - Route spellings (orally→PO, subcutaneously→SC, patch→Transdermal)
//! - Dose conversion between mg and mcg into the source key's unit

use std::collections::HashMap;

use thiserror::Error;

use crate::models::{DoseUnit, Route};

/// Normalization errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("Unknown dose unit: {0}")]
    UnknownUnit(String),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Cannot convert a dose in {from} to {to}")]
    Incompatible { from: DoseUnit, to: DoseUnit },
}

pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Micrograms per milligram.
const MCG_PER_MG: f64 = 1000.0;

/// Normalizer for user-entered units, routes and doses.
pub struct Normalizer {
    /// Unit spellings: spoken/written → canonical unit
    units: HashMap<String, DoseUnit>,
    /// Route spellings: spoken/written → canonical route
    routes: HashMap<String, Route>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Create a new normalizer with default mappings.
    pub fn new() -> Self {
        Self {
            units: Self::default_units(),
            routes: Self::default_routes(),
        }
    }

    /// Canonicalize a unit spelling.
    pub fn canonicalize_unit(&self, unit: &str) -> NormalizeResult<DoseUnit> {
        let lower = unit.trim().to_lowercase();
        self.units
            .get(&lower)
            .copied()
            .ok_or_else(|| NormalizeError::UnknownUnit(unit.to_string()))
    }

    /// Canonicalize a route spelling.
    pub fn canonicalize_route(&self, route: &str) -> NormalizeResult<Route> {
        let lower = route.trim().to_lowercase();
        self.routes
            .get(&lower)
            .copied()
            .ok_or_else(|| NormalizeError::UnknownRoute(route.to_string()))
    }

    /// Express `dose` (in `from`) in `to`.
    ///
    /// Only mass units convert into each other; a rate unit only matches
    /// itself.
    pub fn convert_dose(&self, dose: f64, from: DoseUnit, to: DoseUnit) -> NormalizeResult<f64> {
        match (from, to) {
            (a, b) if a == b => Ok(dose),
            (DoseUnit::Mg, DoseUnit::Mcg) => Ok(dose * MCG_PER_MG),
            (DoseUnit::Mcg, DoseUnit::Mg) => Ok(dose / MCG_PER_MG),
            (from, to) => Err(NormalizeError::Incompatible { from, to }),
        }
    }

    /// Add a custom unit spelling.
    pub fn add_unit(&mut self, spelling: &str, unit: DoseUnit) {
        self.units.insert(spelling.to_lowercase(), unit);
    }

    /// Add a custom route spelling.
    pub fn add_route(&mut self, spelling: &str, route: Route) {
        self.routes.insert(spelling.to_lowercase(), route);
    }

    /// Default unit spellings.
    fn default_units() -> HashMap<String, DoseUnit> {
        let mut map = HashMap::new();

        // Milligrams
        map.insert("mg".into(), DoseUnit::Mg);
        map.insert("milligram".into(), DoseUnit::Mg);
        map.insert("milligrams".into(), DoseUnit::Mg);

        // Micrograms
        map.insert("mcg".into(), DoseUnit::Mcg);
        map.insert("µg".into(), DoseUnit::Mcg);
        map.insert("ug".into(), DoseUnit::Mcg);
        map.insert("microgram".into(), DoseUnit::Mcg);
        map.insert("micrograms".into(), DoseUnit::Mcg);

        // Patch delivery rate
        map.insert("mcg/hour".into(), DoseUnit::McgPerHour);
        map.insert("mcg/hr".into(), DoseUnit::McgPerHour);
        map.insert("mcg/h".into(), DoseUnit::McgPerHour);
        map.insert("µg/h".into(), DoseUnit::McgPerHour);
        map.insert("micrograms/hour".into(), DoseUnit::McgPerHour);

        map
    }

    /// Default route spellings.
    fn default_routes() -> HashMap<String, Route> {
        let mut map = HashMap::new();

        // Oral
        map.insert("po".into(), Route::Oral);
        map.insert("oral".into(), Route::Oral);
        map.insert("orally".into(), Route::Oral);
        map.insert("by mouth".into(), Route::Oral);
        map.insert("per os".into(), Route::Oral);

        // Subcutaneous
        map.insert("sc".into(), Route::Subcutaneous);
        map.insert("sq".into(), Route::Subcutaneous);
        map.insert("subcut".into(), Route::Subcutaneous);
        map.insert("subq".into(), Route::Subcutaneous);
        map.insert("sub-q".into(), Route::Subcutaneous);
        map.insert("subcutaneous".into(), Route::Subcutaneous);
        map.insert("subcutaneously".into(), Route::Subcutaneous);

        // Transdermal
        map.insert("transdermal".into(), Route::Transdermal);
        map.insert("transdermally".into(), Route::Transdermal);
        map.insert("td".into(), Route::Transdermal);
        map.insert("patch".into(), Route::Transdermal);

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_spellings() {
        let normalizer = Normalizer::new();

        assert_eq!(normalizer.canonicalize_unit("MG"), Ok(DoseUnit::Mg));
        assert_eq!(normalizer.canonicalize_unit("micrograms"), Ok(DoseUnit::Mcg));
        assert_eq!(normalizer.canonicalize_unit("µg"), Ok(DoseUnit::Mcg));
        assert_eq!(
            normalizer.canonicalize_unit("mcg/hr"),
            Ok(DoseUnit::McgPerHour)
        );
        assert_eq!(
            normalizer.canonicalize_unit("grains"),
            Err(NormalizeError::UnknownUnit("grains".into()))
        );
    }

    #[test]
    fn test_route_spellings() {
        let normalizer = Normalizer::new();

        assert_eq!(normalizer.canonicalize_route("orally"), Ok(Route::Oral));
        assert_eq!(normalizer.canonicalize_route("By Mouth"), Ok(Route::Oral));
        assert_eq!(
            normalizer.canonicalize_route("subcut"),
            Ok(Route::Subcutaneous)
        );
        assert_eq!(normalizer.canonicalize_route("patch"), Ok(Route::Transdermal));
        assert!(normalizer.canonicalize_route("intrathecal").is_err());
    }

    #[test]
    fn test_convert_dose() {
        let normalizer = Normalizer::new();

        assert_eq!(normalizer.convert_dose(5.0, DoseUnit::Mg, DoseUnit::Mg), Ok(5.0));
        assert_eq!(
            normalizer.convert_dose(0.5, DoseUnit::Mg, DoseUnit::Mcg),
            Ok(500.0)
        );
        assert_eq!(
            normalizer.convert_dose(500.0, DoseUnit::Mcg, DoseUnit::Mg),
            Ok(0.5)
        );
        assert_eq!(
            normalizer.convert_dose(25.0, DoseUnit::McgPerHour, DoseUnit::McgPerHour),
            Ok(25.0)
        );
    }

    #[test]
    fn test_rate_and_mass_do_not_mix() {
        let normalizer = Normalizer::new();

        assert_eq!(
            normalizer.convert_dose(25.0, DoseUnit::Mcg, DoseUnit::McgPerHour),
            Err(NormalizeError::Incompatible {
                from: DoseUnit::Mcg,
                to: DoseUnit::McgPerHour
            })
        );
        assert!(normalizer
            .convert_dose(1.0, DoseUnit::McgPerHour, DoseUnit::Mg)
            .is_err());
    }

    #[test]
    fn test_custom_spellings() {
        let mut normalizer = Normalizer::new();
        normalizer.add_unit("Milligramme", DoseUnit::Mg);
        normalizer.add_route("s/c", Route::Subcutaneous);

        assert_eq!(normalizer.canonicalize_unit("milligramme"), Ok(DoseUnit::Mg));
        assert_eq!(
            normalizer.canonicalize_route("S/C"),
            Ok(Route::Subcutaneous)
        );
    }
}
