//! The csyntax Command-Line Interface.
//!
//! Dispatches subcommands to the library pipeline and turns any error into a miette report
//! on stderr and exit status 1.

use std::path::Path;
use std::process;

use clap::Parser;
use log::debug;

use crate::cli::args::{Command, CsyntaxArgs};
use crate::diagnostics::print_error;
use crate::fixtures::run_fixtures;
use crate::pipeline::{convert_file, ConvertOptions, STDOUT_PATH};
use crate::Result;

pub mod args;
pub mod output;

/// Environment variable that turns on blessing for `csyntax test`.
pub const BLESS_ENV: &str = "CSYNTAX_BLESS";

/// The main entry point for the CLI.
pub fn run() {
    let args = CsyntaxArgs::parse();
    debug!("{args:?}");

    let result = match args.command {
        Command::Convert {
            input,
            output,
            compact,
        } => convert_file(&input, &output, options(compact)),
        Command::Tree { input, compact } => {
            convert_file(&input, Path::new(STDOUT_PATH), options(compact))
        }
        Command::Test { path, bless } => handle_test(&path, bless || bless_from_env()),
    };

    if let Err(e) = result {
        print_error(e);
        process::exit(1);
    }
}

fn options(compact: bool) -> ConvertOptions {
    if compact {
        ConvertOptions::compact()
    } else {
        ConvertOptions::default()
    }
}

fn bless_from_env() -> bool {
    std::env::var(BLESS_ENV).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Handles the `test` subcommand.
fn handle_test(path: &Path, bless: bool) -> Result<()> {
    let summary = run_fixtures(path, bless)?;
    output::print_fixture_report(&summary);
    if summary.has_failures() {
        process::exit(1);
    }
    Ok(())
}
