//! Error types for schema and value parsing.

use ironidl_core::{EncodingError, SchemaError};
use thiserror::Error;

/// Syntax error in schema or value source.
///
/// Parsing is all-or-nothing: the first error aborts the parse and no
/// partial result is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "syntax error in {rule} at line {line}, column {column}: found {found}, expected {}",
    expected_list(.expected)
)]
pub struct GrammarError {
    /// Grammar rule being parsed.
    pub rule: &'static str,
    /// Byte offset of the offending token.
    pub offset: usize,
    /// 1-based line of the offending token.
    pub line: usize,
    /// 1-based column (in characters) of the offending token.
    pub column: usize,
    /// Description of the offending token.
    pub found: String,
    /// Sorted set of tokens acceptable at this position.
    pub expected: Vec<String>,
}

impl GrammarError {
    /// Creates an error at `offset` of `source`.
    pub fn at(
        source: &str,
        offset: usize,
        rule: &'static str,
        found: impl Into<String>,
        expected: Vec<String>,
    ) -> Self {
        let (line, column) = line_column(source, offset);
        Self {
            rule,
            offset,
            line,
            column,
            found: found.into(),
            expected,
        }
    }
}

fn expected_list(expected: &[String]) -> String {
    if expected.is_empty() {
        "nothing".to_string()
    } else {
        expected.join(" or ")
    }
}

/// Returns the 1-based line and column of a byte offset.
#[must_use]
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let prefix = source.get(..offset).unwrap_or(source);
    let line = prefix.matches('\n').count() + 1;
    let line_start = prefix.rfind('\n').map_or(0, |i| i + 1);
    let column = prefix[line_start..].chars().count() + 1;
    (line, column)
}

/// Error type for parsing and resolving IDL source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Syntax error.
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    /// Unresolvable or inconsistent type definitions.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A literal that cannot represent its annotated type.
    #[error("value error: {0}")]
    Encoding(#[from] EncodingError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        let source = "type A = nat;\ntype B = ?;";
        assert_eq!(line_column(source, 0), (1, 1));
        assert_eq!(line_column(source, 9), (1, 10));
        assert_eq!(line_column(source, 23), (2, 10));
        assert_eq!(line_column(source, 1000), (2, 12));
    }

    #[test]
    fn test_grammar_error_display() {
        let err = GrammarError::at(
            "x",
            0,
            "definition",
            "identifier `x`",
            vec!["`import`".to_string(), "`type`".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "syntax error in definition at line 1, column 1: found identifier `x`, expected `import` or `type`"
        );
    }
}
