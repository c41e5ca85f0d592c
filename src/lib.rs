//! csyntax parses C source text into a concrete syntax tree and serializes that tree as JSON.
//!
//! A leaf becomes its token text, a node with one child becomes `{"rule": child}` and a node
//! with several children becomes `{"rule": [children...]}`.

pub use crate::diagnostics::{to_error_source, CsyntaxError, ErrorContext, ErrorType, Result};

pub mod cli;
pub mod diagnostics;
pub mod fixtures;
pub mod grammar;
pub mod pipeline;
pub mod serialize;
pub mod syntax;
