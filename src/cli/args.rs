//! Command-line arguments and subcommands for the csyntax CLI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "csyntax",
    version,
    about = "Parse C source into a concrete syntax tree and serialize it as JSON."
)]
pub struct CsyntaxArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a C source file into a JSON syntax tree file.
    Convert {
        /// The C source file to read.
        #[arg(default_value = "input.txt")]
        input: PathBuf,
        /// Where to write the JSON document; `-` writes to stdout.
        #[arg(short, long, default_value = "output.txt")]
        output: PathBuf,
        /// Emit compact JSON instead of four-space indentation.
        #[arg(long)]
        compact: bool,
    },
    /// Print the JSON syntax tree of a C source file to stdout.
    Tree {
        /// The C source file to read.
        #[arg(default_value = "input.txt")]
        input: PathBuf,
        /// Emit compact JSON instead of four-space indentation.
        #[arg(long)]
        compact: bool,
    },
    /// Check every `.in`/`.out` fixture pair under a directory.
    Test {
        /// The directory containing fixtures.
        #[arg(default_value = "tests/fixtures")]
        path: PathBuf,
        /// Rewrite mismatching or missing `.out` files instead of failing.
        #[arg(long)]
        bless: bool,
    },
}
