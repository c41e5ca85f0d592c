//! Handles all user-facing output for the CLI.
//!
//! Fixture reports are colorized with `termcolor`; mismatches are shown as line diffs of the
//! pretty-printed documents.

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::fixtures::{Fixture, FixtureOutcome, FixtureSummary};

// ============================================================================
// CORE OUTPUT FUNCTIONS: User-facing CLI output utilities
// ============================================================================

/// Prints one line per fixture, with a diff under each mismatch.
pub fn print_fixture_report(summary: &FixtureSummary) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    for (fixture, outcome) in &summary.results {
        print_outcome(&mut stdout, fixture, outcome);
    }
    print_summary(&mut stdout, summary);
}

fn print_outcome(stdout: &mut StandardStream, fixture: &Fixture, outcome: &FixtureOutcome) {
    let (tag, color) = match outcome {
        FixtureOutcome::Passed => ("PASS", Color::Green),
        FixtureOutcome::Blessed => ("BLESS", Color::Yellow),
        FixtureOutcome::Failed { .. } => ("FAIL", Color::Red),
        FixtureOutcome::Errored(_) => ("ERROR", Color::Red),
    };
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    print!("{tag:>5}");
    let _ = stdout.reset();
    println!(" {}", fixture.name());

    match outcome {
        FixtureOutcome::Failed { expected, actual } => {
            let changeset = Changeset::new(expected, actual, "\n");
            print_diff(stdout, &changeset.diffs);
            let _ = stdout.reset();
        }
        FixtureOutcome::Errored(e) => println!("      {e}"),
        FixtureOutcome::Passed | FixtureOutcome::Blessed => {}
    }
}

fn print_summary(stdout: &mut StandardStream, summary: &FixtureSummary) {
    let color = if summary.has_failures() {
        Color::Red
    } else {
        Color::Green
    };
    println!();
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    println!(
        "{} fixtures: {} passed, {} failed, {} errored, {} blessed",
        summary.total(),
        summary.passed,
        summary.failed,
        summary.errored,
        summary.blessed
    );
    let _ = stdout.reset();
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(ref x) => {
                let _ = stdout.reset();
                for line in x.lines() {
                    println!("       {line}");
                }
            }
            Difference::Add(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                for line in x.lines() {
                    println!("      +{line}");
                }
            }
            Difference::Rem(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                for line in x.lines() {
                    println!("      -{line}");
                }
            }
        }
    }
}
