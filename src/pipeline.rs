//! Source-to-JSON conversion pipeline.
//!
//! `read -> parse -> serialize -> encode -> write`. Every stage either succeeds or returns a
//! [`CsyntaxError`](crate::CsyntaxError); an output file is only replaced once the whole
//! document has been produced.

use std::io::Write;
use std::path::Path;

use log::{debug, info};
use pest::iterators::Pair;
use tempfile::NamedTempFile;

use crate::diagnostics::to_error_source;
use crate::grammar::{parse_compilation_unit, CRuleNames, Rule};
use crate::serialize::{encode, serialize, SerializedValue};
use crate::{err_msg, Result};

/// Output path that selects standard output instead of a file.
pub const STDOUT_PATH: &str = "-";

/// How the JSON document is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Indent with four spaces; otherwise emit compact JSON.
    pub pretty: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl ConvertOptions {
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

/// Parses `source` from the `compilationUnit` rule. `name` identifies the source in
/// diagnostics.
pub fn parse_source<'i>(name: &str, source: &'i str) -> Result<Pair<'i, Rule>> {
    let origin = to_error_source(name, source);
    let root = parse_compilation_unit(source, &origin)?;
    debug!("parsed {name} ({} bytes)", source.len());
    Ok(root)
}

/// Parses `source` and serializes its syntax tree.
pub fn source_to_value(name: &str, source: &str) -> Result<SerializedValue> {
    Ok(serialize(parse_source(name, source)?, &CRuleNames))
}

/// Parses `source` and renders its syntax tree as JSON text.
pub fn source_to_json(name: &str, source: &str, options: ConvertOptions) -> Result<String> {
    encode(&source_to_value(name, source)?, options.pretty)
}

/// Reads a whole file as UTF-8 text.
pub fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        err_msg!(Io, "Failed to read '{}'", path.display()).with_cause(e)
    })
}

pub fn file_to_value(path: &Path) -> Result<SerializedValue> {
    let source = read_source(path)?;
    source_to_value(&path.display().to_string(), &source)
}

pub fn file_to_json(path: &Path, options: ConvertOptions) -> Result<String> {
    encode(&file_to_value(path)?, options.pretty)
}

/// Replaces `path` with `contents` without ever leaving a partially written file behind.
///
/// The text goes to a temporary file in the destination directory, which is then renamed over
/// the target.
pub fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let io_error = |e: std::io::Error| {
        err_msg!(Io, "Failed to write '{}'", path.display()).with_cause(e)
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(contents.as_bytes()).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

/// Converts the C source at `input` into JSON written to `output` (or stdout for `-`).
///
/// If reading, parsing or encoding fails, `output` is left untouched.
pub fn convert_file(input: &Path, output: &Path, options: ConvertOptions) -> Result<()> {
    let json = file_to_json(input, options)?;

    if output.as_os_str() == STDOUT_PATH {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}")
            .map_err(|e| err_msg!(Io, "Failed to write to stdout").with_cause(e))?;
        return Ok(());
    }

    write_atomically(output, &json)?;
    info!("wrote {} ({} bytes)", output.display(), json.len());
    Ok(())
}
