//! Table identifiers derived from logical store names.

use std::fmt;

/// Sanitize a logical store name into a table-safe token.
///
/// Every character outside `[a-zA-Z0-9]` becomes `_` and the result is
/// lowercased. Distinct names may collide (`"Foo!"` and `"Foo@"` both
/// become `"foo_"`); callers own that risk.
#[must_use]
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Sanitized table name - newtype for type safety.
///
/// Only constructible through [`TableName::from_logical`], so the inner
/// string is guaranteed to contain `[a-z0-9_]` only and can be spliced into
/// SQL as a quoted identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Derive the table name for a logical store name.
    pub fn from_logical(name: &str) -> Self {
        Self(sanitize(name))
    }

    /// Get the table name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form for use in SQL text.
    #[must_use]
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
