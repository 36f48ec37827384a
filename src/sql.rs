//! SQL quoting for dynamically built administrative statements.
//!
//! Role and database names arrive from the command line and are spliced into
//! `CREATE ROLE` / `CREATE DATABASE` text, so this module is the single
//! injection boundary: every dynamic fragment must pass through
//! [`escape_literal`] or [`escape_identifier`] before it reaches SQL text.
//!
//! The two output types are deliberately distinct. A value escaped for a
//! literal position is never valid in an identifier position and vice versa,
//! and the private interiors mean no other module can construct a fragment
//! from a raw string.

use std::fmt;

/// A string safe to splice into SQL in a *literal* position (`'...'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralFragment(String);

/// A string safe to splice into SQL in an *identifier* position (`"..."`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierFragment(String);

/// Escape an arbitrary string for use as a SQL string literal.
///
/// Doubles every single quote and wraps the result in single quotes.
/// Total over all inputs: empty strings, quote-only strings, and multibyte
/// content all pass through without truncation.
///
/// ```
/// use postgis_bootstrap::sql::escape_literal;
///
/// assert_eq!(escape_literal("a'b").as_str(), "'a''b'");
/// assert_eq!(escape_literal("").as_str(), "''");
/// ```
pub fn escape_literal(raw: &str) -> LiteralFragment {
    let mut escaped = raw.replace('\'', "''");
    escaped.insert(0, '\'');
    escaped.push('\'');
    LiteralFragment(escaped)
}

/// Escape an arbitrary string for use as a SQL identifier.
///
/// Doubles every double quote and wraps the result in double quotes. Single
/// quotes need no treatment inside a double-quoted identifier.
///
/// ```
/// use postgis_bootstrap::sql::escape_identifier;
///
/// assert_eq!(escape_identifier("O'Brien").as_str(), "\"O'Brien\"");
/// assert_eq!(escape_identifier("naughty\"name").as_str(), "\"naughty\"\"name\"");
/// ```
pub fn escape_identifier(raw: &str) -> IdentifierFragment {
    let mut escaped = raw.replace('"', "\"\"");
    escaped.insert(0, '"');
    escaped.push('"');
    IdentifierFragment(escaped)
}

impl LiteralFragment {
    /// The quoted fragment, ready for splicing.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl IdentifierFragment {
    /// The quoted fragment, ready for splicing.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LiteralFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for IdentifierFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
