//! Encoding of map values into the single `value` text column.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::key::canonical_number;
use crate::error::{Error, Result};

/// How values are written to and read back from the `value` column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueEncoding {
    /// Every value, scalars included, is stored as JSON text.
    ///
    /// Decoding is total for rows written in this mode and numbers and
    /// booleans keep their type across a reload.
    #[default]
    Json,
    /// Legacy layout: strings stored raw, other scalars as their literal
    /// text, `null`/arrays/objects as JSON.
    ///
    /// On load, only values starting with `[` or `{` are parsed; everything
    /// else comes back as a string. A string that itself starts with `[` or
    /// `{` cannot be told apart from JSON and fails to decode.
    Sniffed,
}

impl ValueEncoding {
    /// Encode a value for storage.
    ///
    /// # Errors
    /// Returns [`Error::Json`] if the value cannot be serialized.
    pub fn encode(self, value: &Value) -> Result<String> {
        match (self, value) {
            (Self::Json, v) => Ok(serde_json::to_string(v)?),
            (Self::Sniffed, Value::String(s)) => Ok(s.clone()),
            (Self::Sniffed, Value::Number(n)) => Ok(canonical_number(n).to_string()),
            (Self::Sniffed, Value::Bool(b)) => Ok(b.to_string()),
            (Self::Sniffed, v) => Ok(serde_json::to_string(v)?),
        }
    }

    /// Decode a stored column value. SQL `NULL` decodes to JSON `null`.
    ///
    /// # Errors
    /// Returns [`Error::Decode`] naming `key` when the stored text should be
    /// JSON under this encoding but does not parse.
    pub fn decode(self, key: &str, raw: Option<&str>) -> Result<Value> {
        let Some(raw) = raw else {
            return Ok(Value::Null);
        };

        let parse = |text: &str| {
            serde_json::from_str(text).map_err(|source| Error::Decode {
                key: key.to_owned(),
                source,
            })
        };

        match self {
            Self::Json => parse(raw),
            Self::Sniffed if raw.starts_with('[') || raw.starts_with('{') => parse(raw),
            Self::Sniffed => Ok(Value::String(raw.to_owned())),
        }
    }
}
