//! Registry of agents, their routes and each route's canonical dose unit.

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};
use thiserror::Error;

use crate::models::{DoseUnit, KeyParseError, Route, RouteKey};

/// Minimum similarity for an agent name suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.70;

/// Catalog errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Invalid route key: {0}")]
    KeyParse(#[from] KeyParseError),

    #[error(
        "Unknown agent: {name}{}",
        .suggestion.as_ref().map(|s| format!(" (did you mean {}?)", s)).unwrap_or_default()
    )]
    UnknownAgent {
        name: String,
        suggestion: Option<String>,
    },

    #[error("{agent} is not available by route {route}")]
    UnsupportedRoute { agent: String, route: Route },

    #[error("Agent name is empty")]
    EmptyAgentName,

    #[error("Agent {0} has no routes")]
    NoRoutes(String),

    #[error("Duplicate agent: {0}")]
    DuplicateAgent(String),

    #[error("Duplicate route {route} for {agent}")]
    DuplicateRoute { agent: String, route: Route },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// A supported route and the unit doses by that route are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub route: Route,
    pub unit: DoseUnit,
}

/// A single agent in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEntry {
    /// Registered spelling, e.g. "Morphine"
    pub name: String,
    /// Supported routes, in display order
    pub routes: Vec<RouteEntry>,
}

impl AgentEntry {
    pub fn new(name: impl Into<String>, routes: Vec<RouteEntry>) -> Self {
        Self {
            name: name.into(),
            routes,
        }
    }

    /// Check if this agent matches a name, ignoring case.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    /// Unit for a route, if the agent supports it.
    pub fn unit_for(&self, route: Route) -> Option<DoseUnit> {
        self.routes
            .iter()
            .find(|r| r.route == route)
            .map(|r| r.unit)
    }
}

/// Immutable registry of valid (agent, route) pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<AgentEntry>", into = "Vec<AgentEntry>")]
pub struct Catalog {
    agents: Vec<AgentEntry>,
}

impl TryFrom<Vec<AgentEntry>> for Catalog {
    type Error = CatalogError;

    fn try_from(agents: Vec<AgentEntry>) -> Result<Self, Self::Error> {
        Catalog::new(agents)
    }
}

impl From<Catalog> for Vec<AgentEntry> {
    fn from(catalog: Catalog) -> Self {
        catalog.agents
    }
}

impl Catalog {
    /// Build a catalog, rejecting empty names, duplicates and route-less agents.
    pub fn new(agents: Vec<AgentEntry>) -> CatalogResult<Self> {
        for (i, agent) in agents.iter().enumerate() {
            if agent.name.trim().is_empty() {
                return Err(CatalogError::EmptyAgentName);
            }
            if agent.routes.is_empty() {
                return Err(CatalogError::NoRoutes(agent.name.clone()));
            }
            if agents[..i].iter().any(|other| other.is_named(&agent.name)) {
                return Err(CatalogError::DuplicateAgent(agent.name.clone()));
            }
            for (j, entry) in agent.routes.iter().enumerate() {
                if agent.routes[..j].iter().any(|r| r.route == entry.route) {
                    return Err(CatalogError::DuplicateRoute {
                        agent: agent.name.clone(),
                        route: entry.route,
                    });
                }
            }
        }
        Ok(Self { agents })
    }

    /// All agents, in registration order.
    pub fn agents(&self) -> impl Iterator<Item = &AgentEntry> {
        self.agents.iter()
    }

    /// Look up an agent by name, ignoring case.
    pub fn agent(&self, name: &str) -> Option<&AgentEntry> {
        self.agents.iter().find(|a| a.is_named(name))
    }

    /// Routes supported by an agent, or `None` if the agent is unknown.
    pub fn routes_of(&self, agent: &str) -> Option<Vec<Route>> {
        self.agent(agent)
            .map(|a| a.routes.iter().map(|r| r.route).collect())
    }

    /// Canonical unit of a key, or `None` if the key is not registered.
    pub fn unit_of(&self, key: &RouteKey) -> Option<DoseUnit> {
        self.agent(key.agent())?.unit_for(key.route())
    }

    pub fn contains(&self, key: &RouteKey) -> bool {
        self.unit_of(key).is_some()
    }

    /// Key with the registered agent spelling, if the pair is valid.
    pub fn key(&self, agent: &str, route: Route) -> Option<RouteKey> {
        let entry = self.agent(agent)?;
        entry.unit_for(route)?;
        Some(RouteKey::new(entry.name.clone(), route))
    }

    /// Canonicalize an existing key.
    pub fn canonical(&self, key: &RouteKey) -> Option<RouteKey> {
        self.key(key.agent(), key.route())
    }

    /// Parse `"<agent> <route>"` and canonicalize it against the catalog.
    pub fn parse_key(&self, text: &str) -> CatalogResult<RouteKey> {
        let key: RouteKey = text.parse()?;
        self.resolve_key(key.agent(), key.route())
    }

    /// Canonicalize an (agent, route) pair, explaining any failure.
    pub fn resolve_key(&self, agent: &str, route: Route) -> CatalogResult<RouteKey> {
        let entry = self.agent(agent).ok_or_else(|| CatalogError::UnknownAgent {
            name: agent.to_string(),
            suggestion: self.suggest_agent(agent).map(str::to_string),
        })?;

        if entry.unit_for(route).is_none() {
            return Err(CatalogError::UnsupportedRoute {
                agent: entry.name.clone(),
                route,
            });
        }

        Ok(RouteKey::new(entry.name.clone(), route))
    }

    /// Every registered key, agent by agent.
    pub fn route_keys(&self) -> impl Iterator<Item = RouteKey> + '_ {
        self.agents.iter().flat_map(|a| {
            a.routes
                .iter()
                .map(move |r| RouteKey::new(a.name.clone(), r.route))
        })
    }

    /// Closest registered agent name to a misspelled one.
    pub fn suggest_agent(&self, name: &str) -> Option<&str> {
        let query = name.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }

        self.agents
            .iter()
            .map(|a| (a.name.as_str(), fuzzy_match(&query, &a.name.to_lowercase())))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(name, _)| name)
    }
}

/// Compute fuzzy string similarity using combined metrics.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    // Jaro-Winkler rewards shared prefixes, Levenshtein overall similarity
    let jw = jaro_winkler(a, b);
    let lev = normalized_levenshtein(a, b);
    jw * 0.6 + lev * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            AgentEntry::new(
                "Morphine",
                vec![
                    RouteEntry {
                        route: Route::Oral,
                        unit: DoseUnit::Mg,
                    },
                    RouteEntry {
                        route: Route::Subcutaneous,
                        unit: DoseUnit::Mg,
                    },
                ],
            ),
            AgentEntry::new(
                "Fentanyl",
                vec![
                    RouteEntry {
                        route: Route::Transdermal,
                        unit: DoseUnit::McgPerHour,
                    },
                    RouteEntry {
                        route: Route::Subcutaneous,
                        unit: DoseUnit::Mcg,
                    },
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_routes_of() {
        let catalog = catalog();
        assert_eq!(
            catalog.routes_of("Fentanyl"),
            Some(vec![Route::Transdermal, Route::Subcutaneous])
        );
        assert_eq!(
            catalog.routes_of("morphine"),
            Some(vec![Route::Oral, Route::Subcutaneous])
        );
        assert_eq!(catalog.routes_of("Pethidine"), None);
    }

    #[test]
    fn test_unit_of() {
        let catalog = catalog();
        assert_eq!(
            catalog.unit_of(&RouteKey::new("Fentanyl", Route::Transdermal)),
            Some(DoseUnit::McgPerHour)
        );
        assert_eq!(
            catalog.unit_of(&RouteKey::new("Fentanyl", Route::Subcutaneous)),
            Some(DoseUnit::Mcg)
        );
        assert_eq!(
            catalog.unit_of(&RouteKey::new("Morphine", Route::Transdermal)),
            None
        );
        assert_eq!(catalog.unit_of(&RouteKey::new("Nobody", Route::Oral)), None);
    }

    #[test]
    fn test_parse_key_canonicalizes() {
        let catalog = catalog();
        let key = catalog.parse_key("MORPHINE po").unwrap();
        assert_eq!(key, RouteKey::new("Morphine", Route::Oral));
    }

    #[test]
    fn test_parse_key_suggests_agent() {
        let catalog = catalog();
        let err = catalog.parse_key("Morfine PO").unwrap_err();
        assert_eq!(
            err,
            CatalogError::UnknownAgent {
                name: "Morfine".into(),
                suggestion: Some("Morphine".into()),
            }
        );
        assert_eq!(
            err.to_string(),
            "Unknown agent: Morfine (did you mean Morphine?)"
        );

        let err = catalog.parse_key("Zzz PO").unwrap_err();
        assert_eq!(err.to_string(), "Unknown agent: Zzz");
    }

    #[test]
    fn test_unsupported_route() {
        let catalog = catalog();
        assert_eq!(
            catalog.parse_key("Morphine Transdermal"),
            Err(CatalogError::UnsupportedRoute {
                agent: "Morphine".into(),
                route: Route::Transdermal,
            })
        );
    }

    #[test]
    fn test_rejects_duplicates() {
        let oral = RouteEntry {
            route: Route::Oral,
            unit: DoseUnit::Mg,
        };
        assert_eq!(
            Catalog::new(vec![
                AgentEntry::new("Codeine", vec![oral]),
                AgentEntry::new("codeine", vec![oral]),
            ]),
            Err(CatalogError::DuplicateAgent("codeine".into()))
        );
        assert!(matches!(
            Catalog::new(vec![AgentEntry::new("Codeine", vec![oral, oral])]),
            Err(CatalogError::DuplicateRoute { .. })
        ));
        assert_eq!(
            Catalog::new(vec![AgentEntry::new("Codeine", vec![])]),
            Err(CatalogError::NoRoutes("Codeine".into()))
        );
    }

    #[test]
    fn test_route_keys_in_order() {
        let keys: Vec<String> = catalog().route_keys().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "Morphine PO",
                "Morphine SC",
                "Fentanyl Transdermal",
                "Fentanyl SC"
            ]
        );
    }
}
