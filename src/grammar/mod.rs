//! C Parser
//!
//! Turns C source text into a `pest` concrete syntax tree rooted at `compilationUnit`.
//! Nothing is discarded besides whitespace, comments and preprocessor lines: every token
//! survives as a leaf pair, and the end of input survives as an `EOI` pair.

use std::borrow::Cow;

use pest::error::{Error, InputLocation};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::diagnostics::SourceArc;
use crate::syntax::{RuleNames, Span};
use crate::{err_ctx, err_msg, Result};

#[derive(Parser)]
#[grammar = "grammar/c.pest"]
pub struct CParser;

/// Label used for the end-of-input leaf.
pub const EOF_LABEL: &str = "<EOF>";

/// Rule names as they appear in serialized trees.
///
/// Grammar rules keep their declared names; the end of input is rendered as [`EOF_LABEL`].
#[derive(Debug, Default, Clone, Copy)]
pub struct CRuleNames;

impl RuleNames<Rule> for CRuleNames {
    fn rule_name(&self, rule: Rule) -> Cow<'_, str> {
        match rule {
            Rule::EOI => Cow::Borrowed(EOF_LABEL),
            other => Cow::Owned(format!("{other:?}")),
        }
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses a whole C translation unit.
///
/// `origin` names the source in diagnostics; a rejected input becomes a `Parse` error
/// pointing at the position where the grammar gave up.
pub fn parse_compilation_unit<'i>(source: &'i str, origin: &SourceArc) -> Result<Pair<'i, Rule>> {
    let mut pairs = CParser::parse(Rule::compilationUnit, source)
        .map_err(|e| convert_parse_error(e, origin))?;

    pairs
        .next()
        .ok_or_else(|| err_msg!(Internal, "parser produced no compilationUnit"))
}

// ============================================================================
// ERROR CONVERSION
// ============================================================================

fn convert_parse_error(error: Error<Rule>, origin: &SourceArc) -> crate::CsyntaxError {
    let span = match error.location {
        InputLocation::Pos(pos) => Span {
            start: pos,
            end: pos,
        },
        InputLocation::Span((start, end)) => Span { start, end },
    };
    let (line, column) = match error.line_col {
        pest::error::LineColLocation::Pos(pos) => pos,
        pest::error::LineColLocation::Span(start, _) => start,
    };

    let renamed = error.renamed_rules(|rule| describe_rule(*rule));
    let message = format!(
        "{} at line {line}, column {column}",
        renamed.variant.message()
    );
    let help = if span.start >= origin.inner().len() {
        "the input ended before the construct was complete"
    } else {
        "check the token under the marker"
    };

    err_ctx!(Parse, message, origin, span, help)
}

/// Names a rule the way a reader of C would recognise it in an "expected ..." list.
fn describe_rule(rule: Rule) -> String {
    let token = match rule {
        Rule::EOI => return "end of input".to_string(),
        Rule::Identifier => return "identifier".to_string(),
        Rule::Constant => return "constant".to_string(),
        Rule::StringLiteral => return "string literal".to_string(),
        Rule::LeftParen => "(",
        Rule::RightParen => ")",
        Rule::LeftBracket => "[",
        Rule::RightBracket => "]",
        Rule::LeftBrace => "{",
        Rule::RightBrace => "}",
        Rule::Semi => ";",
        Rule::Comma => ",",
        Rule::Colon => ":",
        Rule::Assign => "=",
        Rule::Star => "*",
        _ => return format!("{rule:?}"),
    };
    format!("'{token}'")
}
