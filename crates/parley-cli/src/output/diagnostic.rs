//! Miette diagnostics for fixture files and sandbox expressions.
//!
//! Note: This module has an exception for `unused_assignments` because miette
//! derive macros read struct fields in generated code that rustc cannot track.
#![allow(unused_assignments)]

use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use parley_script::ParseError;
use thiserror::Error;

/// A fixture file that is not valid fixture JSON.
#[derive(Debug, Error, Diagnostic)]
#[error("invalid fixture: {message}")]
#[diagnostic(code(parley::fixture))]
pub struct FixtureDiagnostic {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    message: String,
}

impl FixtureDiagnostic {
    pub fn from_json_error(path: &Path, content: &str, err: &serde_json::Error) -> Self {
        FixtureDiagnostic {
            src: NamedSource::new(path.display().to_string(), content.to_string()),
            span: (offset(content, err.line(), err.column()), 1).into(),
            message: err.to_string(),
        }
    }
}

/// A sandbox expression that does not parse.
#[derive(Debug, Error, Diagnostic)]
#[error("syntax error: {message}")]
#[diagnostic(code(parley::eval::syntax))]
pub struct ScriptDiagnostic {
    #[source_code]
    src: NamedSource<String>,

    #[label("error here")]
    span: SourceSpan,

    message: String,

    #[help]
    help: Option<String>,
}

impl ScriptDiagnostic {
    /// `None` for parse errors that carry no position.
    pub fn from_parse_error(expression: &str, err: &ParseError) -> Option<Self> {
        let ParseError::Syntax {
            line,
            column,
            message,
        } = err
        else {
            return None;
        };
        let at = offset(expression, *line, *column);
        Some(ScriptDiagnostic {
            src: NamedSource::new("expression", expression.to_string()),
            span: (at, 1).into(),
            message: message.clone(),
            help: (at >= expression.trim_end().len())
                .then(|| "the expression ends early; check for a missing operand".to_string()),
        })
    }
}

/// Byte offset of a 1-based line and column, clamped to the content.
fn offset(content: &str, line: usize, column: usize) -> usize {
    let offset = content
        .lines()
        .take(line.saturating_sub(1))
        .map(|l| l.len() + 1)
        .sum::<usize>()
        + column.saturating_sub(1);
    offset.min(content.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_counts_previous_lines() {
        assert_eq!(offset("ab\ncd", 2, 2), 4);
        assert_eq!(offset("ab", 1, 1), 0);
        assert_eq!(offset("ab", 9, 9), 2);
    }
}
