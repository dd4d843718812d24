//! Agent/route keys and dose units.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors parsing keys, routes and units from their canonical text form.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyParseError {
    #[error("Route key is empty")]
    Empty,

    #[error("Route key has no route: {0}")]
    MissingRoute(String),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Unknown dose unit: {0}")]
    UnknownUnit(String),
}

/// Administration route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Route {
    /// Oral
    #[serde(rename = "PO")]
    Oral,
    /// Subcutaneous injection or infusion
    #[serde(rename = "SC")]
    Subcutaneous,
    /// Skin patch
    #[serde(rename = "Transdermal")]
    Transdermal,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Oral, Route::Subcutaneous, Route::Transdermal];

    /// Canonical abbreviation as used in route keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Oral => "PO",
            Route::Subcutaneous => "SC",
            Route::Transdermal => "Transdermal",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Route {
    type Err = KeyParseError;

    /// Parses the canonical abbreviation, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| KeyParseError::UnknownRoute(s.to_string()))
    }
}

/// Canonical dose unit of a route key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoseUnit {
    #[serde(rename = "mg")]
    Mg,
    #[serde(rename = "mcg")]
    Mcg,
    /// Delivery rate of a transdermal patch
    #[serde(rename = "mcg/hour")]
    McgPerHour,
}

impl DoseUnit {
    pub const ALL: [DoseUnit; 3] = [DoseUnit::Mg, DoseUnit::Mcg, DoseUnit::McgPerHour];

    pub fn as_str(&self) -> &'static str {
        match self {
            DoseUnit::Mg => "mg",
            DoseUnit::Mcg => "mcg",
            DoseUnit::McgPerHour => "mcg/hour",
        }
    }

    /// Whether this unit measures a delivery rate rather than a mass.
    pub fn is_rate(&self) -> bool {
        matches!(self, DoseUnit::McgPerHour)
    }
}

impl fmt::Display for DoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoseUnit {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DoseUnit::ALL
            .into_iter()
            .find(|u| u.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| KeyParseError::UnknownUnit(s.to_string()))
    }
}

/// An (agent, route) pair, the index of the rule table.
///
/// The text form is `"<agent> <route>"`, e.g. `"Morphine PO"` or
/// `"Fentanyl Transdermal"`. Keys serialize to that text so they can be used
/// directly as JSON object keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RouteKey {
    agent: String,
    route: Route,
}

impl RouteKey {
    pub fn new(agent: impl Into<String>, route: Route) -> Self {
        Self {
            agent: agent.into(),
            route,
        }
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn route(&self) -> Route {
        self.route
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.agent, self.route)
    }
}

impl FromStr for RouteKey {
    type Err = KeyParseError;

    /// Splits on the last whitespace: everything before is the agent name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let (agent, route) = trimmed
            .rsplit_once(char::is_whitespace)
            .ok_or_else(|| KeyParseError::MissingRoute(trimmed.to_string()))?;

        let agent = agent.trim();
        if agent.is_empty() {
            return Err(KeyParseError::MissingRoute(trimmed.to_string()));
        }

        Ok(RouteKey::new(agent, route.parse()?))
    }
}

impl From<RouteKey> for String {
    fn from(key: RouteKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for RouteKey {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route_key() {
        let key: RouteKey = "Morphine PO".parse().unwrap();
        assert_eq!(key.agent(), "Morphine");
        assert_eq!(key.route(), Route::Oral);

        let key: RouteKey = "  Fentanyl   transdermal ".parse().unwrap();
        assert_eq!(key, RouteKey::new("Fentanyl", Route::Transdermal));
        assert_eq!(key.to_string(), "Fentanyl Transdermal");
    }

    #[test]
    fn test_parse_route_key_errors() {
        assert_eq!("".parse::<RouteKey>(), Err(KeyParseError::Empty));
        assert_eq!(
            "Morphine".parse::<RouteKey>(),
            Err(KeyParseError::MissingRoute("Morphine".into()))
        );
        assert_eq!(
            "Morphine IV".parse::<RouteKey>(),
            Err(KeyParseError::UnknownRoute("IV".into()))
        );
    }

    #[test]
    fn test_route_key_json_as_string() {
        let key = RouteKey::new("Oxycodone", Route::Subcutaneous);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"Oxycodone SC\"");

        let back: RouteKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_dose_unit_parse() {
        assert_eq!("MG".parse::<DoseUnit>(), Ok(DoseUnit::Mg));
        assert_eq!("mcg/hour".parse::<DoseUnit>(), Ok(DoseUnit::McgPerHour));
        assert!("grains".parse::<DoseUnit>().is_err());
        assert!(DoseUnit::McgPerHour.is_rate());
        assert!(!DoseUnit::Mcg.is_rate());
    }
}
