//! Directed equivalence rule table.
//!
//! The table is sparse: a missing entry means "no known direct path" and is
//! distinct from [`ConversionRule::Unavailable`]. Entries are directed; the
//! factor for A→B is never inferred from B→A.

mod builtin;

pub use builtin::*;

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::models::{ConversionRule, RouteKey, RuleError, Tier};

/// Table construction and loading errors.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Route key not in catalog: {0}")]
    UnknownRouteKey(RouteKey),

    #[error("Invalid rule {source_key} -> {target_key}: {error}")]
    InvalidRule {
        source_key: RouteKey,
        target_key: RouteKey,
        error: RuleError,
    },

    #[error("Duplicate rule {source_key} -> {target_key}")]
    DuplicateRule {
        source_key: RouteKey,
        target_key: RouteKey,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TableResult<T> = Result<T, TableError>;

/// Read-only mapping source key → target key → rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: BTreeMap<RouteKey, BTreeMap<RouteKey, ConversionRule>>,
}

impl RuleTable {
    /// Start building a table whose keys must exist in `catalog`.
    pub fn builder(catalog: &Catalog) -> RuleTableBuilder<'_> {
        RuleTableBuilder {
            catalog,
            rules: BTreeMap::new(),
        }
    }

    /// Rule for a directed pair, if one is tabulated.
    pub fn rule(&self, source: &RouteKey, target: &RouteKey) -> Option<&ConversionRule> {
        self.rules.get(source)?.get(target)
    }

    /// Targets tabulated for a source key.
    pub fn targets_of<'a>(
        &'a self,
        source: &RouteKey,
    ) -> impl Iterator<Item = (&'a RouteKey, &'a ConversionRule)> + 'a {
        self.rules.get(source).into_iter().flat_map(|t| t.iter())
    }

    /// All `(source, target, rule)` entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&RouteKey, &RouteKey, &ConversionRule)> {
        self.rules
            .iter()
            .flat_map(|(s, targets)| targets.iter().map(move |(t, r)| (s, t, r)))
    }

    /// Number of tabulated entries.
    pub fn len(&self) -> usize {
        self.rules.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accumulates validated entries; the finished table has no mutation API.
pub struct RuleTableBuilder<'a> {
    catalog: &'a Catalog,
    rules: BTreeMap<RouteKey, BTreeMap<RouteKey, ConversionRule>>,
}

impl<'a> RuleTableBuilder<'a> {
    /// Add a rule. Keys are canonicalized against the catalog.
    pub fn insert(
        &mut self,
        source: &RouteKey,
        target: &RouteKey,
        rule: ConversionRule,
    ) -> TableResult<&mut Self> {
        let source_key = self.known(source)?;
        let target_key = self.known(target)?;

        if let Err(error) = rule.validate() {
            return Err(TableError::InvalidRule {
                source_key,
                target_key,
                error,
            });
        }

        let targets = self.rules.entry(source_key.clone()).or_default();
        if targets.contains_key(&target_key) {
            return Err(TableError::DuplicateRule {
                source_key,
                target_key,
            });
        }
        targets.insert(target_key, rule);
        Ok(self)
    }

    pub fn linear(
        &mut self,
        source: &RouteKey,
        target: &RouteKey,
        factor: f64,
    ) -> TableResult<&mut Self> {
        self.insert(source, target, ConversionRule::Linear { factor })
    }

    pub fn unavailable(&mut self, source: &RouteKey, target: &RouteKey) -> TableResult<&mut Self> {
        self.insert(source, target, ConversionRule::Unavailable)
    }

    pub fn tiered(
        &mut self,
        source: &RouteKey,
        target: &RouteKey,
        tiers: Vec<Tier>,
        fallback_ratio: Option<f64>,
    ) -> TableResult<&mut Self> {
        let rule = ConversionRule::tiered(tiers, fallback_ratio).map_err(|error| {
            TableError::InvalidRule {
                source_key: source.clone(),
                target_key: target.clone(),
                error,
            }
        })?;
        self.insert(source, target, rule)
    }

    pub fn build(self) -> RuleTable {
        RuleTable { rules: self.rules }
    }

    fn known(&self, key: &RouteKey) -> TableResult<RouteKey> {
        self.catalog
            .canonical(key)
            .ok_or_else(|| TableError::UnknownRouteKey(key.clone()))
    }
}
