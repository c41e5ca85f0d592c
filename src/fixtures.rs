//! Golden fixtures.
//!
//! A fixture is a C source file `name.in` next to the JSON document `name.out` its syntax tree
//! must serialize to. Documents are compared structurally, so either layout (pretty or compact)
//! is accepted in `.out` files. Blessing rewrites `.out` files from the current output.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::pipeline::{file_to_json, file_to_value, read_source, write_atomically, ConvertOptions};
use crate::serialize::{decode, encode};
use crate::{err_msg, CsyntaxError, ErrorContext, Result};

pub const INPUT_EXTENSION: &str = "in";
pub const EXPECTED_EXTENSION: &str = "out";

/// A source file paired with its expected serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub input: PathBuf,
    pub expected: PathBuf,
}

impl Fixture {
    pub fn from_input(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let expected = input.with_extension(EXPECTED_EXTENSION);
        Self { input, expected }
    }

    /// Input path without its extension, for reports.
    pub fn name(&self) -> String {
        self.input.with_extension("").display().to_string()
    }

    pub fn has_expected(&self) -> bool {
        self.expected.is_file()
    }
}

/// Result of checking or blessing one fixture.
#[derive(Debug)]
pub enum FixtureOutcome {
    Passed,
    /// Both sides rendered as pretty JSON.
    Failed {
        expected: String,
        actual: String,
    },
    /// The `.out` file was (re)written.
    Blessed,
    Errored(CsyntaxError),
}

impl FixtureOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FixtureOutcome::Passed | FixtureOutcome::Blessed)
    }
}

#[derive(Debug, Default)]
pub struct FixtureSummary {
    pub passed: usize,
    pub failed: usize,
    pub blessed: usize,
    pub errored: usize,
    pub results: Vec<(Fixture, FixtureOutcome)>,
}

impl FixtureSummary {
    fn record(&mut self, fixture: Fixture, outcome: FixtureOutcome) {
        match &outcome {
            FixtureOutcome::Passed => self.passed += 1,
            FixtureOutcome::Failed { .. } => self.failed += 1,
            FixtureOutcome::Blessed => self.blessed += 1,
            FixtureOutcome::Errored(_) => self.errored += 1,
        }
        self.results.push((fixture, outcome));
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.errored > 0
    }
}

/// Finds every `*.in` file under `root`, sorted by path.
///
/// A missing `.out` partner is not an error here; it is reported when the fixture is checked.
pub fn discover_fixtures(root: &Path) -> Result<Vec<Fixture>> {
    if !root.exists() {
        return Err(err_msg!(Io, "Fixture directory '{}' does not exist", root.display()));
    }

    let mut fixtures = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            err_msg!(Io, "Failed to walk '{}'", root.display()).with_cause(e)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == INPUT_EXTENSION) {
            fixtures.push(Fixture::from_input(path));
        }
    }
    fixtures.sort_by(|a, b| a.input.cmp(&b.input));
    debug!("discovered {} fixtures under {}", fixtures.len(), root.display());
    Ok(fixtures)
}

/// Serializes the fixture input and compares it with the expected document.
pub fn check_fixture(fixture: &Fixture) -> FixtureOutcome {
    match compare(fixture) {
        Ok(None) => FixtureOutcome::Passed,
        Ok(Some((expected, actual))) => FixtureOutcome::Failed { expected, actual },
        Err(e) => FixtureOutcome::Errored(e),
    }
}

fn compare(fixture: &Fixture) -> Result<Option<(String, String)>> {
    let actual = file_to_value(&fixture.input)?;

    if !fixture.has_expected() {
        return Err(missing_expected(fixture));
    }
    let text = read_source(&fixture.expected)?;
    let expected = decode(&text).map_err(|e| {
        err_msg!(Decode, "'{}' is not a serialized syntax tree", fixture.expected.display())
            .with_cause(e)
    })?;

    if expected == actual {
        return Ok(None);
    }
    Ok(Some((encode(&expected, true)?, encode(&actual, true)?)))
}

fn missing_expected(fixture: &Fixture) -> CsyntaxError {
    CsyntaxError::Io {
        message: format!("Missing expected output '{}'", fixture.expected.display()),
        ctx: ErrorContext::none().with_help("run the fixtures with --bless to create it"),
        source: None,
    }
}

/// Writes the current serialization of the fixture input to its `.out` file.
pub fn bless_fixture(fixture: &Fixture) -> Result<()> {
    let json = file_to_json(&fixture.input, ConvertOptions::default())?;
    write_atomically(&fixture.expected, &json)?;
    info!("blessed {}", fixture.expected.display());
    Ok(())
}

/// Checks every fixture under `root`. With `bless`, mismatching or missing `.out` files are
/// rewritten instead of failing; inputs that do not parse are still reported as errors.
pub fn run_fixtures(root: &Path, bless: bool) -> Result<FixtureSummary> {
    let mut summary = FixtureSummary::default();

    for fixture in discover_fixtures(root)? {
        let outcome = match check_fixture(&fixture) {
            FixtureOutcome::Failed { .. } if bless => bless_outcome(&fixture),
            FixtureOutcome::Errored(_) if bless && !fixture.has_expected() => {
                bless_outcome(&fixture)
            }
            outcome => outcome,
        };
        if !outcome.is_success() {
            warn!("fixture {} did not pass", fixture.name());
        }
        summary.record(fixture, outcome);
    }

    info!(
        "{} fixtures: {} passed, {} failed, {} errored, {} blessed",
        summary.total(),
        summary.passed,
        summary.failed,
        summary.errored,
        summary.blessed
    );
    Ok(summary)
}

fn bless_outcome(fixture: &Fixture) -> FixtureOutcome {
    match bless_fixture(fixture) {
        Ok(()) => FixtureOutcome::Blessed,
        Err(e) => FixtureOutcome::Errored(e),
    }
}
