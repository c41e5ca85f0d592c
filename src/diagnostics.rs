//! # Overview
//!
//! This module defines the unified, `miette`-based diagnostic system for csyntax. Every failure
//! the pipeline can surface (reading a file, parsing C source, decoding an expected JSON
//! document, writing output) is represented by [`CsyntaxError`]. The serializer itself never
//! fails; it does not appear here.
//!
//! # Error Construction Macros
//!
//! - **Use `err_msg!` for message-only errors.**
//!   - `err_msg!(Io, "Failed to read '{}'", path.display())`
//!
//! - **Use `err_ctx!` for errors tied to a named source and span.**
//!   - `err_ctx!(Parse, "expected ';'", &source, span)`
//!   - `err_ctx!(Parse, "expected ';'", &source, span, "declarations end with ';'")`
//!
//! Pass `src` and `span` directly; the macros clone the `Arc` and fill in the context.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::syntax::Span;

/// Shared, named source text attached to diagnostics.
pub type SourceArc = Arc<NamedSource<String>>;

/// Crate-wide result alias.
pub type Result<T, E = CsyntaxError> = std::result::Result<T, E>;

/// Type-safe error classification that corresponds to [`CsyntaxError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// File could not be read or written
    Io,
    /// Source text rejected by the C grammar
    Parse,
    /// JSON text that no serializer output can have
    Decode,
    /// Broken invariant inside csyntax
    Internal,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Io => "Io",
            ErrorType::Parse => "Parse",
            ErrorType::Decode => "Decode",
            ErrorType::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The primary source for this error (if any).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Returns an empty error context (no source, span, or help).
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a context with both source and span.
    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }

    /// Attaches a help message.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Unified error type for every csyntax failure mode.
#[derive(Debug, Error)]
pub enum CsyntaxError {
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Decode error: {message}")]
    Decode {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl CsyntaxError {
    fn get_ctx(&self) -> &ErrorContext {
        match self {
            CsyntaxError::Io { ctx, .. }
            | CsyntaxError::Parse { ctx, .. }
            | CsyntaxError::Decode { ctx, .. }
            | CsyntaxError::Internal { ctx, .. } => ctx,
        }
    }

    fn message(&self) -> &str {
        match self {
            CsyntaxError::Io { message, .. }
            | CsyntaxError::Parse { message, .. }
            | CsyntaxError::Decode { message, .. }
            | CsyntaxError::Internal { message, .. } => message,
        }
    }

    /// Returns the type-safe error classification for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            CsyntaxError::Io { .. } => ErrorType::Io,
            CsyntaxError::Parse { .. } => ErrorType::Parse,
            CsyntaxError::Decode { .. } => ErrorType::Decode,
            CsyntaxError::Internal { .. } => ErrorType::Internal,
        }
    }

    /// The primary span, when the error points into a source.
    pub fn span(&self) -> Option<Span> {
        self.get_ctx().span
    }

    /// Attaches an underlying cause.
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        let slot = match &mut self {
            CsyntaxError::Io { source, .. }
            | CsyntaxError::Parse { source, .. }
            | CsyntaxError::Decode { source, .. }
            | CsyntaxError::Internal { source, .. } => source,
        };
        *slot = Some(Box::new(cause));
        self
    }
}

impl Diagnostic for CsyntaxError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match self.error_type() {
            ErrorType::Io => "csyntax::io",
            ErrorType::Parse => "csyntax::parse",
            ErrorType::Decode => "csyntax::decode",
            ErrorType::Internal => "csyntax::internal",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.get_ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.get_ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.get_ctx().span?;
        let len = span.end.saturating_sub(span.start);
        let label = LabeledSpan::new(Some(self.message().to_string()), span.start, len);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Converts a file name and its contents into a shared named source.
pub fn to_error_source(name: impl AsRef<str>, source: impl Into<String>) -> SourceArc {
    Arc::new(NamedSource::new(name.as_ref(), source.into()))
}

/// Prints a [`CsyntaxError`] with full miette diagnostics to stderr.
pub fn print_error(error: CsyntaxError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}

/// Constructs a CsyntaxError variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $msg:expr, $($arg:expr),+ $(,)?) => {
        $crate::CsyntaxError::$variant {
            message: format!($msg, $($arg),+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    ($variant:ident, $msg:expr) => {
        $crate::CsyntaxError::$variant {
            message: format!("{}", $msg),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a CsyntaxError variant with a message, a named source and a span, plus an
/// optional help text.
#[macro_export]
macro_rules! err_ctx {
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::CsyntaxError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            )
            .with_help(format!("{}", $help)),
            source: None,
        }
    };
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::CsyntaxError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
            source: None,
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn err_msg_formats_arguments() {
        let err = err_msg!(Io, "Failed to read '{}': {}", "a.c", "gone");
        assert_eq!(err.error_type(), ErrorType::Io);
        assert_eq!(err.to_string(), "I/O error: Failed to read 'a.c': gone");
        assert!(err.span().is_none());
    }

    #[test]
    fn err_ctx_carries_span_and_label() {
        let src = to_error_source("a.c", "int x");
        let err = err_ctx!(Parse, "expected ';'", &src, Span { start: 5, end: 5 }, "add ';'");
        assert_eq!(err.error_type(), ErrorType::Parse);
        assert_eq!(err.span(), Some(Span { start: 5, end: 5 }));

        let labels: Vec<_> = err.labels().expect("labels").collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 5);
        assert_eq!(labels[0].len(), 0);
        assert_eq!(err.help().map(|h| h.to_string()).as_deref(), Some("add ';'"));
        assert!(err.source_code().is_some());
    }

    #[test]
    fn with_cause_sets_error_source() {
        use std::error::Error as _;
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = err_msg!(Io, "Failed to read 'x'").with_cause(io);
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("missing"));
    }

    #[test]
    fn every_variant_starts_without_a_source() {
        use std::error::Error as _;
        for err in [
            err_msg!(Io, "io"),
            err_msg!(Parse, "parse"),
            err_msg!(Decode, "decode"),
            err_msg!(Internal, "internal"),
        ] {
            assert!(err.source().is_none(), "{err}");
            let cause = std::fmt::Error;
            assert!(err.with_cause(cause).source().is_some());
        }
    }
}
