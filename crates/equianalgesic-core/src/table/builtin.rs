//! Compiled-in catalog and equivalence data.
//!
//! Ratios are written as the tabulated dose pair they come from where one is
//! known (e.g. `50.0 / 5.0`: 50 mcg fentanyl SC for 5 mg oral morphine).

use crate::catalog::{AgentEntry, Catalog, CatalogResult, RouteEntry};
use crate::models::{DoseUnit, Route, RouteKey, Tier, TierOutcome};

use super::{RuleTable, TableResult};

/// Linear equivalence ratios: (source, target, factor).
const LINEAR: &[(&str, &str, f64)] = &[
    // Morphine PO
    ("Morphine PO", "Morphine SC", 0.5),
    ("Morphine PO", "Oxycodone PO", 0.5),
    ("Morphine PO", "Oxycodone SC", 0.25),
    ("Morphine PO", "Hydromorphone PO", 0.13),
    ("Morphine PO", "Hydromorphone SC", 0.06),
    ("Morphine PO", "Fentanyl SC", 50.0 / 5.0),
    ("Morphine PO", "Alfentanil SC", 0.3 / 5.0),
    ("Morphine PO", "Buprenorphine Transdermal", 5.0 / 10.0),
    ("Morphine PO", "Tramadol PO", 10.0),
    ("Morphine PO", "Codeine PO", 10.0),
    // Morphine SC
    ("Morphine SC", "Morphine PO", 2.0),
    ("Morphine SC", "Oxycodone PO", 1.0),
    ("Morphine SC", "Oxycodone SC", 0.5),
    ("Morphine SC", "Hydromorphone PO", 0.25),
    ("Morphine SC", "Hydromorphone SC", 0.13),
    ("Morphine SC", "Fentanyl SC", 100.0 / 10.0),
    ("Morphine SC", "Alfentanil SC", 0.3 / 10.0),
    ("Morphine SC", "Buprenorphine Transdermal", 10.0 / 20.0),
    ("Morphine SC", "Tramadol PO", 20.0),
    ("Morphine SC", "Codeine PO", 20.0),
    // Oxycodone PO
    ("Oxycodone PO", "Morphine PO", 2.0),
    ("Oxycodone PO", "Morphine SC", 2.0),
    ("Oxycodone PO", "Oxycodone SC", 0.5),
    ("Oxycodone PO", "Hydromorphone PO", 0.13 / 0.5),
    ("Oxycodone PO", "Hydromorphone SC", 0.06 / 0.5),
    ("Oxycodone PO", "Fentanyl SC", 50.0 / 10.0),
    ("Oxycodone PO", "Alfentanil SC", 0.3 / 10.0),
    ("Oxycodone PO", "Buprenorphine Transdermal", 5.0 / 10.0),
    ("Oxycodone PO", "Tramadol PO", 10.0),
    ("Oxycodone PO", "Codeine PO", 10.0),
    // Oxycodone SC
    ("Oxycodone SC", "Morphine PO", 4.0),
    ("Oxycodone SC", "Morphine SC", 2.0),
    ("Oxycodone SC", "Oxycodone PO", 2.0),
    ("Oxycodone SC", "Hydromorphone PO", 0.13 / 2.5),
    ("Oxycodone SC", "Hydromorphone SC", 0.06 / 2.5),
    ("Oxycodone SC", "Fentanyl SC", 100.0 / 5.0),
    ("Oxycodone SC", "Alfentanil SC", 0.3 / 5.0),
    ("Oxycodone SC", "Buprenorphine Transdermal", 10.0 / 5.0),
    ("Oxycodone SC", "Tramadol PO", 20.0),
    ("Oxycodone SC", "Codeine PO", 20.0),
    // Hydromorphone PO
    ("Hydromorphone PO", "Morphine PO", 8.0),
    ("Hydromorphone PO", "Morphine SC", 4.0),
    ("Hydromorphone PO", "Oxycodone PO", 2.0),
    ("Hydromorphone PO", "Oxycodone SC", 1.0),
    ("Hydromorphone PO", "Hydromorphone SC", 0.5),
    ("Hydromorphone PO", "Fentanyl SC", 100.0 / 4.0),
    ("Hydromorphone PO", "Alfentanil SC", 0.3 / 4.0),
    ("Hydromorphone PO", "Buprenorphine Transdermal", 10.0 / 4.0),
    ("Hydromorphone PO", "Tramadol PO", 40.0),
    ("Hydromorphone PO", "Codeine PO", 40.0),
    // Hydromorphone SC
    ("Hydromorphone SC", "Morphine PO", 16.0),
    ("Hydromorphone SC", "Morphine SC", 8.0),
    ("Hydromorphone SC", "Oxycodone PO", 4.0),
    ("Hydromorphone SC", "Oxycodone SC", 2.0),
    ("Hydromorphone SC", "Hydromorphone PO", 2.0),
    ("Hydromorphone SC", "Fentanyl SC", 100.0 / 6.0),
    ("Hydromorphone SC", "Alfentanil SC", 0.3 / 6.0),
    ("Hydromorphone SC", "Buprenorphine Transdermal", 10.0 / 6.0),
    ("Hydromorphone SC", "Tramadol PO", 60.0),
    ("Hydromorphone SC", "Codeine PO", 60.0),
    // Fentanyl SC
    ("Fentanyl SC", "Morphine PO", 2.0),
    ("Fentanyl SC", "Morphine SC", 1.0),
    ("Fentanyl SC", "Oxycodone PO", 0.5),
    ("Fentanyl SC", "Oxycodone SC", 0.25),
    ("Fentanyl SC", "Hydromorphone PO", 0.1),
    ("Fentanyl SC", "Hydromorphone SC", 0.05),
    ("Fentanyl SC", "Alfentanil SC", 0.01),
    ("Fentanyl SC", "Tramadol PO", 0.02),
    ("Fentanyl SC", "Codeine PO", 0.02),
    // Alfentanil SC
    ("Alfentanil SC", "Morphine PO", 10.0),
    ("Alfentanil SC", "Morphine SC", 5.0),
    ("Alfentanil SC", "Oxycodone PO", 5.0),
    ("Alfentanil SC", "Oxycodone SC", 2.5),
    ("Alfentanil SC", "Hydromorphone PO", 1.25),
    ("Alfentanil SC", "Hydromorphone SC", 0.6),
    ("Alfentanil SC", "Fentanyl SC", 50.0),
    ("Alfentanil SC", "Buprenorphine Transdermal", 5.0),
    ("Alfentanil SC", "Tramadol PO", 50.0),
    ("Alfentanil SC", "Codeine PO", 50.0),
    // Buprenorphine Transdermal
    ("Buprenorphine Transdermal", "Morphine PO", 10.0),
    ("Buprenorphine Transdermal", "Morphine SC", 5.0),
    ("Buprenorphine Transdermal", "Oxycodone PO", 5.0),
    ("Buprenorphine Transdermal", "Oxycodone SC", 2.5),
    ("Buprenorphine Transdermal", "Hydromorphone PO", 1.25),
    ("Buprenorphine Transdermal", "Hydromorphone SC", 0.6),
    ("Buprenorphine Transdermal", "Fentanyl SC", 50.0),
    ("Buprenorphine Transdermal", "Alfentanil SC", 0.01),
    ("Buprenorphine Transdermal", "Tramadol PO", 50.0),
    ("Buprenorphine Transdermal", "Codeine PO", 50.0),
    // Tramadol PO (no Alfentanil SC entry: convert via the hub)
    ("Tramadol PO", "Morphine PO", 0.1),
    ("Tramadol PO", "Morphine SC", 0.05),
    ("Tramadol PO", "Oxycodone PO", 0.05),
    ("Tramadol PO", "Oxycodone SC", 0.025),
    ("Tramadol PO", "Hydromorphone PO", 0.01),
    ("Tramadol PO", "Hydromorphone SC", 0.005),
    ("Tramadol PO", "Fentanyl SC", 0.005),
    ("Tramadol PO", "Codeine PO", 1.0),
    // Codeine PO
    ("Codeine PO", "Morphine PO", 0.1),
    ("Codeine PO", "Morphine SC", 0.05),
    ("Codeine PO", "Oxycodone PO", 0.05),
    ("Codeine PO", "Oxycodone SC", 0.025),
    ("Codeine PO", "Hydromorphone PO", 0.01),
    ("Codeine PO", "Hydromorphone SC", 0.005),
    ("Codeine PO", "Fentanyl SC", 0.005),
    ("Codeine PO", "Alfentanil SC", 0.01),
    ("Codeine PO", "Tramadol PO", 1.0),
];

/// Pairs with no product at any dose.
const UNAVAILABLE: &[(&str, &str)] = &[
    // No low-dose patch
    ("Morphine SC", "Fentanyl Transdermal"),
    ("Oxycodone PO", "Fentanyl Transdermal"),
    ("Oxycodone SC", "Fentanyl Transdermal"),
    ("Hydromorphone PO", "Fentanyl Transdermal"),
    ("Hydromorphone SC", "Fentanyl Transdermal"),
    // No direct equivalent
    ("Fentanyl SC", "Fentanyl Transdermal"),
    ("Fentanyl SC", "Buprenorphine Transdermal"),
    ("Alfentanil SC", "Fentanyl Transdermal"),
    ("Buprenorphine Transdermal", "Fentanyl Transdermal"),
    ("Tramadol PO", "Fentanyl Transdermal"),
    ("Tramadol PO", "Buprenorphine Transdermal"),
    ("Codeine PO", "Fentanyl Transdermal"),
    ("Codeine PO", "Buprenorphine Transdermal"),
];

/// Oral morphine (mg/24h) to fentanyl patch strength.
const MORPHINE_PO_TO_FENTANYL_PATCH: &[(f64, &str)] = &[
    (30.0, "12mcg/hour"),
    (60.0, "25mcg/hour"),
    (120.0, "50mcg/hour"),
    (180.0, "75mcg/hour"),
    (240.0, "100mcg/hour"),
];

/// Fentanyl patch band (mcg/hour) to its tabulated patch strength; `None`
/// where no product exists.
const FENTANYL_PATCH_TO_MORPHINE_PO: &[(f64, Option<&str>)] = &[
    (6.0, None),
    (12.0, Some("25mcg/hour")),
    (25.0, Some("50mcg/hour")),
    (50.0, Some("75mcg/hour")),
    (75.0, Some("100mcg/hour")),
    (100.0, None),
];

const FENTANYL_PATCH_TO_MORPHINE_SC: &[(f64, Option<&str>)] = &[
    (6.0, None),
    (12.0, Some("25mcg/hour")),
    (25.0, Some("50mcg/hour")),
    (50.0, Some("75mcg/hour")),
    (75.0, None),
    (100.0, None),
];

/// 25 mcg/hour patch for 60 mg oral morphine.
const MORPHINE_PO_TO_FENTANYL_PATCH_RATIO: f64 = 5.0 / 12.0;

/// The built-in catalog: eight agents and their routes.
pub fn builtin_catalog() -> CatalogResult<Catalog> {
    let entry = |route, unit| RouteEntry { route, unit };
    let agents = vec![
        AgentEntry::new(
            "Morphine",
            vec![
                entry(Route::Oral, DoseUnit::Mg),
                entry(Route::Subcutaneous, DoseUnit::Mg),
            ],
        ),
        AgentEntry::new(
            "Oxycodone",
            vec![
                entry(Route::Oral, DoseUnit::Mg),
                entry(Route::Subcutaneous, DoseUnit::Mg),
            ],
        ),
        AgentEntry::new(
            "Hydromorphone",
            vec![
                entry(Route::Oral, DoseUnit::Mg),
                entry(Route::Subcutaneous, DoseUnit::Mg),
            ],
        ),
        AgentEntry::new(
            "Fentanyl",
            vec![
                entry(Route::Transdermal, DoseUnit::McgPerHour),
                entry(Route::Subcutaneous, DoseUnit::Mcg),
            ],
        ),
        AgentEntry::new("Alfentanil", vec![entry(Route::Subcutaneous, DoseUnit::Mg)]),
        AgentEntry::new(
            "Buprenorphine",
            vec![entry(Route::Transdermal, DoseUnit::McgPerHour)],
        ),
        AgentEntry::new("Tramadol", vec![entry(Route::Oral, DoseUnit::Mg)]),
        AgentEntry::new("Codeine", vec![entry(Route::Oral, DoseUnit::Mg)]),
    ];

    Catalog::new(agents)
}

fn patch_tiers(bands: &[(f64, Option<&str>)]) -> Vec<Tier> {
    bands
        .iter()
        .map(|&(band, patch)| {
            let outcome = match patch {
                Some(label) => TierOutcome::Label(label.to_string()),
                None => TierOutcome::NoProduct,
            };
            Tier::new(band, outcome)
        })
        .collect()
}

/// The built-in rule table, validated against `catalog`.
pub fn builtin_rules(catalog: &Catalog) -> TableResult<RuleTable> {
    let mut builder = RuleTable::builder(catalog);

    for &(source, target, factor) in LINEAR {
        builder.linear(&catalog.parse_key(source)?, &catalog.parse_key(target)?, factor)?;
    }
    for &(source, target) in UNAVAILABLE {
        builder.unavailable(&catalog.parse_key(source)?, &catalog.parse_key(target)?)?;
    }

    let morphine_po = RouteKey::new("Morphine", Route::Oral);
    let morphine_sc = RouteKey::new("Morphine", Route::Subcutaneous);
    let fentanyl_patch = RouteKey::new("Fentanyl", Route::Transdermal);

    builder.tiered(
        &morphine_po,
        &fentanyl_patch,
        MORPHINE_PO_TO_FENTANYL_PATCH
            .iter()
            .map(|&(mg, patch)| Tier::new(mg, TierOutcome::Label(patch.to_string())))
            .collect(),
        Some(MORPHINE_PO_TO_FENTANYL_PATCH_RATIO),
    )?;

    // Patch bands (mcg/hour) back to morphine; no ratio, nearest band wins.
    builder.tiered(
        &fentanyl_patch,
        &morphine_po,
        patch_tiers(FENTANYL_PATCH_TO_MORPHINE_PO),
        None,
    )?;
    builder.tiered(
        &fentanyl_patch,
        &morphine_sc,
        patch_tiers(FENTANYL_PATCH_TO_MORPHINE_SC),
        None,
    )?;

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConversionRule;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = builtin_catalog().unwrap();
        assert_eq!(catalog.agents().count(), 8);
        assert_eq!(catalog.route_keys().count(), 12);
    }

    #[test]
    fn test_builtin_rules_build() {
        let catalog = builtin_catalog().unwrap();
        let table = builtin_rules(&catalog).unwrap();
        assert_eq!(
            table.len(),
            LINEAR.len() + UNAVAILABLE.len() + 3
        );
    }

    #[test]
    fn test_morphine_to_patch_is_tiered_with_ratio() {
        let catalog = builtin_catalog().unwrap();
        let table = builtin_rules(&catalog).unwrap();
        let rule = table
            .rule(
                &RouteKey::new("Morphine", Route::Oral),
                &RouteKey::new("Fentanyl", Route::Transdermal),
            )
            .unwrap();

        match rule {
            ConversionRule::Tiered(tiered) => {
                assert_eq!(tiered.tiers().len(), 5);
                assert_eq!(tiered.fallback_ratio(), Some(5.0 / 12.0));
            }
            other => panic!("expected tiered rule, got {:?}", other),
        }
    }

    #[test]
    fn test_tramadol_to_alfentanil_absent() {
        let catalog = builtin_catalog().unwrap();
        let table = builtin_rules(&catalog).unwrap();
        assert!(table
            .rule(
                &RouteKey::new("Tramadol", Route::Oral),
                &RouteKey::new("Alfentanil", Route::Subcutaneous),
            )
            .is_none());
    }

    #[test]
    fn test_patch_bands_back_to_morphine() {
        let catalog = builtin_catalog().unwrap();
        let table = builtin_rules(&catalog).unwrap();
        let patch = RouteKey::new("Fentanyl", Route::Transdermal);

        let tiers = |target: &RouteKey| match table.rule(&patch, target) {
            Some(ConversionRule::Tiered(tiered)) => {
                assert_eq!(tiered.fallback_ratio(), None);
                tiered.tiers().to_vec()
            }
            other => panic!("expected tiered rule, got {:?}", other),
        };

        let po = tiers(&RouteKey::new("Morphine", Route::Oral));
        assert_eq!(
            po,
            vec![
                Tier::new(6.0, TierOutcome::NoProduct),
                Tier::new(12.0, TierOutcome::Label("25mcg/hour".into())),
                Tier::new(25.0, TierOutcome::Label("50mcg/hour".into())),
                Tier::new(50.0, TierOutcome::Label("75mcg/hour".into())),
                Tier::new(75.0, TierOutcome::Label("100mcg/hour".into())),
                Tier::new(100.0, TierOutcome::NoProduct),
            ]
        );

        let sc = tiers(&RouteKey::new("Morphine", Route::Subcutaneous));
        assert_eq!(sc[3].outcome, TierOutcome::Label("75mcg/hour".into()));
        assert_eq!(sc[4].outcome, TierOutcome::NoProduct);
        assert_eq!(sc[5].outcome, TierOutcome::NoProduct);
    }
}
