//! Golden tests for the conversion resolver.
//!
//! These tests verify resolution against the compiled-in formulary.

use equianalgesic_core::models::{ConversionOutcome, RouteKey, Severity};
use equianalgesic_core::resolver::ReductionCalculator;
use equianalgesic_core::Formulary;

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    source: &'static str,
    dose: f64,
    target: &'static str,
    expected: ConversionOutcome,
    expected_path: &'static str,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "morphine-oral-to-subcut",
            source: "Morphine PO",
            dose: 10.0,
            target: "Morphine SC",
            expected: ConversionOutcome::Value(5.0),
            expected_path: "linear",
        },
        GoldenCase {
            id: "oxycodone-to-morphine",
            source: "Oxycodone PO",
            dose: 15.0,
            target: "Morphine PO",
            expected: ConversionOutcome::Value(30.0),
            expected_path: "linear",
        },
        GoldenCase {
            id: "morphine-to-hydromorphone",
            source: "Morphine PO",
            dose: 30.0,
            target: "Hydromorphone PO",
            expected: ConversionOutcome::Value(3.9),
            expected_path: "linear",
        },
        GoldenCase {
            id: "fentanyl-to-alfentanil",
            source: "Fentanyl SC",
            dose: 100.0,
            target: "Alfentanil SC",
            expected: ConversionOutcome::Value(1.0),
            expected_path: "linear",
        },
        GoldenCase {
            id: "identity",
            source: "Codeine PO",
            dose: 30.0,
            target: "Codeine PO",
            expected: ConversionOutcome::Value(30.0),
            expected_path: "identity",
        },
        GoldenCase {
            id: "patch-exact-tier",
            source: "Morphine PO",
            dose: 60.0,
            target: "Fentanyl Transdermal",
            expected: ConversionOutcome::Label("25mcg/hour".into()),
            expected_path: "exact_tier",
        },
        GoldenCase {
            id: "patch-fallback-ratio",
            source: "Morphine PO",
            dose: 45.0,
            target: "Fentanyl Transdermal",
            expected: ConversionOutcome::Value(18.75),
            expected_path: "fallback_ratio_used",
        },
        GoldenCase {
            id: "patch-to-subcut-exact",
            source: "Fentanyl Transdermal",
            dose: 25.0,
            target: "Morphine SC",
            expected: ConversionOutcome::Label("50mcg/hour".into()),
            expected_path: "exact_tier",
        },
        GoldenCase {
            id: "patch-to-oral-top-band-no-product",
            source: "Fentanyl Transdermal",
            dose: 100.0,
            target: "Morphine PO",
            expected: ConversionOutcome::NoProductAvailable,
            expected_path: "exact_tier",
        },
        GoldenCase {
            id: "patch-to-subcut-closest-no-product",
            source: "Fentanyl Transdermal",
            dose: 80.0,
            target: "Morphine SC",
            expected: ConversionOutcome::NoProductAvailable,
            expected_path: "closest_dose_used",
        },
        GoldenCase {
            id: "oxycodone-to-patch-unavailable",
            source: "Oxycodone PO",
            dose: 10.0,
            target: "Fentanyl Transdermal",
            expected: ConversionOutcome::NoProductAvailable,
            expected_path: "rejected",
        },
        GoldenCase {
            id: "tramadol-to-alfentanil-via-hub",
            source: "Tramadol PO",
            dose: 50.0,
            target: "Alfentanil SC",
            expected: ConversionOutcome::NoDirectConversion {
                hub: RouteKey::new("Morphine", equianalgesic_core::Route::Oral),
            },
            expected_path: "rejected",
        },
    ]
}

#[test]
fn test_golden_cases() {
    let formulary = Formulary::builtin();
    let resolver = formulary.resolver();

    for case in get_golden_cases() {
        let source = formulary.catalog().parse_key(case.source).unwrap();
        let target = formulary.catalog().parse_key(case.target).unwrap();

        let resolution = resolver.resolve(&source, case.dose, &target).unwrap();

        assert_eq!(
            resolution.outcome, case.expected,
            "Case {}: outcome mismatch", case.id
        );
        assert_eq!(
            resolution.path.as_str(),
            case.expected_path,
            "Case {}: path mismatch",
            case.id
        );
    }
}

#[test]
fn test_warnings_only_on_approximation() {
    let formulary = Formulary::builtin();
    let resolver = formulary.resolver();

    for case in get_golden_cases() {
        let source = formulary.catalog().parse_key(case.source).unwrap();
        let target = formulary.catalog().parse_key(case.target).unwrap();
        let resolution = resolver.resolve(&source, case.dose, &target).unwrap();

        let approximated = matches!(
            case.expected_path,
            "fallback_ratio_used" | "closest_dose_used"
        );
        let expected = if approximated {
            Severity::Warning
        } else {
            Severity::None
        };
        assert_eq!(resolution.severity(), expected, "Case {}", case.id);
    }
}

#[test]
fn test_failure_messages() {
    let formulary = Formulary::builtin();
    let resolver = formulary.resolver();
    let catalog = formulary.catalog();

    let unavailable = resolver
        .resolve(
            &catalog.parse_key("Oxycodone PO").unwrap(),
            10.0,
            &catalog.parse_key("Fentanyl Transdermal").unwrap(),
        )
        .unwrap();
    assert_eq!(
        unavailable.outcome.to_string(),
        "No product available for the given dose and conversion."
    );

    let indirect = resolver
        .resolve(
            &catalog.parse_key("Tramadol PO").unwrap(),
            50.0,
            &catalog.parse_key("Alfentanil SC").unwrap(),
        )
        .unwrap();
    assert_eq!(
        indirect.outcome.to_string(),
        "Direct conversion not available. Please convert to Morphine PO first."
    );
}

#[test]
fn test_convert_then_reduce() {
    let formulary = Formulary::builtin();
    let resolver = formulary.resolver();
    let calc = ReductionCalculator::default();
    let catalog = formulary.catalog();

    // 200 mg oral morphine → 100 mg oral oxycodone, less 30%
    let converted = resolver
        .resolve(
            &catalog.parse_key("Morphine PO").unwrap(),
            200.0,
            &catalog.parse_key("Oxycodone PO").unwrap(),
        )
        .unwrap();
    assert_eq!(converted.outcome, ConversionOutcome::Value(100.0));
    assert_eq!(
        calc.reduce(&converted.outcome, 30).unwrap(),
        ConversionOutcome::Value(70.0)
    );

    // Patch labels are never reduced
    let patch = resolver
        .resolve(
            &catalog.parse_key("Morphine PO").unwrap(),
            120.0,
            &catalog.parse_key("Fentanyl Transdermal").unwrap(),
        )
        .unwrap();
    assert_eq!(
        calc.reduce(&patch.outcome, 50).unwrap(),
        ConversionOutcome::Label("50mcg/hour".into())
    );
}

#[test]
fn test_all_route_spellings_reach_the_same_key() {
    let formulary = Formulary::builtin();
    let catalog = formulary.catalog();

    let spellings = vec![
        ("morphine po", "Morphine PO"),
        ("MORPHINE SC", "Morphine SC"),
        ("fentanyl transdermal", "Fentanyl Transdermal"),
        ("Buprenorphine TRANSDERMAL", "Buprenorphine Transdermal"),
    ];

    for (input, expected) in spellings {
        let key = catalog.parse_key(input).unwrap();
        assert_eq!(key.to_string(), expected, "Spelling {}", input);
    }
}
