//! Validated catalog + rule table pair.
//!
//! A formulary is built once (compiled-in data or a JSON document) and then
//! only read. The compiled-in formulary is process-wide and initialized on
//! first access.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::catalog::Catalog;
use crate::config::{ConfigResult, ConverterConfig};
use crate::models::ConversionRule;
use crate::resolver::Resolver;
use crate::table::{builtin_catalog, builtin_rules, RuleTable, TableResult};

static BUILTIN: OnceLock<Formulary> = OnceLock::new();

/// Catalog and rule table, validated against each other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Formulary {
    catalog: Catalog,
    rules: RuleTable,
}

/// On-disk shape. Rule keys stay text until the catalog canonicalizes them.
#[derive(Debug, Deserialize)]
struct FormularyDocument {
    catalog: Catalog,
    #[serde(default)]
    rules: BTreeMap<String, BTreeMap<String, ConversionRule>>,
}

impl Formulary {
    /// The compiled-in formulary.
    pub fn builtin() -> &'static Formulary {
        BUILTIN.get_or_init(|| {
            // Literal data, checked by the table tests
            let formulary = Self::build_builtin().expect("built-in formulary is valid");
            tracing::info!(
                agents = formulary.catalog.agents().count(),
                rules = formulary.rules.len(),
                "Built-in formulary initialized"
            );
            formulary
        })
    }

    fn build_builtin() -> TableResult<Self> {
        let catalog = builtin_catalog()?;
        let rules = builtin_rules(&catalog)?;
        Ok(Self { catalog, rules })
    }

    /// Load a formulary from JSON, failing on the first invalid entry.
    ///
    /// ```json
    /// {
    ///   "catalog": [{"name": "Morphine", "routes": [{"route": "PO", "unit": "mg"}]}],
    ///   "rules": {"Morphine PO": {"Morphine SC": {"kind": "linear", "factor": 0.5}}}
    /// }
    /// ```
    pub fn from_json(json: &str) -> TableResult<Self> {
        let document: FormularyDocument = serde_json::from_str(json)?;
        let catalog = document.catalog;

        let mut builder = RuleTable::builder(&catalog);
        for (source, targets) in &document.rules {
            let source = catalog.parse_key(source)?;
            for (target, rule) in targets {
                let target = catalog.parse_key(target)?;
                builder.insert(&source, &target, rule.clone())?;
            }
        }
        let rules = builder.build();

        tracing::info!(
            agents = catalog.agents().count(),
            rules = rules.len(),
            "Formulary loaded"
        );

        Ok(Self { catalog, rules })
    }

    /// Serialize to the same JSON shape `from_json` reads.
    pub fn to_json(&self) -> TableResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// SHA-256 (hex) of the canonical JSON form, identifying this table version.
    pub fn fingerprint(&self) -> TableResult<String> {
        let canonical = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&canonical)))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Resolver with the default configuration.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self)
    }

    /// Resolver with a custom configuration, validated against this catalog.
    pub fn resolver_with_config(&self, config: ConverterConfig) -> ConfigResult<Resolver<'_>> {
        Resolver::with_config(self, config)
    }
}
