// Golden fixtures: every tests/fixtures/*.in must serialize to its *.out.
//
// Set CSYNTAX_BLESS=1 to rewrite the .out files from the current output.

use std::path::Path;

use csyntax::fixtures::{check_fixture, discover_fixtures, run_fixtures, FixtureOutcome};

const FIXTURES: &str = "tests/fixtures";

#[test]
fn golden_fixtures_match() {
    let bless = std::env::var("CSYNTAX_BLESS").is_ok_and(|v| v == "1");
    let summary = run_fixtures(Path::new(FIXTURES), bless).unwrap();
    assert!(summary.total() >= 5, "expected fixtures under {FIXTURES}");

    let mut failures = Vec::new();
    for (fixture, outcome) in &summary.results {
        match outcome {
            FixtureOutcome::Passed | FixtureOutcome::Blessed => {}
            FixtureOutcome::Failed { expected, actual } => failures.push(format!(
                "{}\n--- expected\n{expected}\n--- actual\n{actual}",
                fixture.name()
            )),
            FixtureOutcome::Errored(e) => failures.push(format!("{}: {e}", fixture.name())),
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n\n"));
}

#[test]
fn every_fixture_has_expected_output() {
    for fixture in discover_fixtures(Path::new(FIXTURES)).unwrap() {
        assert!(fixture.has_expected(), "{} has no .out", fixture.name());
    }
}

#[test]
fn declaration_fixture_passes_on_its_own() {
    let fixture = discover_fixtures(Path::new(FIXTURES))
        .unwrap()
        .into_iter()
        .find(|f| f.input.ends_with("declaration.in"))
        .unwrap();
    assert!(matches!(check_fixture(&fixture), FixtureOutcome::Passed));
}
