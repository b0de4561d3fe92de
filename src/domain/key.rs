//! Map keys accepted by the persistent store.

use std::fmt;

use serde_json::{Number, Value};

use crate::error::{Error, Result};

/// A key for a persisted map entry: either text or a number.
///
/// Keys are stored in a `TEXT` column, so numbers are persisted in their
/// decimal text form and come back as strings on load.
#[derive(Debug, Clone, PartialEq)]
pub enum MapKey {
    Text(String),
    Number(Number),
}

/// Collapse a whole-number float into an integer `Number`.
///
/// Keeps `1.0` and `1` on the same text form (`"1"`), as a single numeric
/// type would. Floats with a fraction or outside the 64-bit range pass
/// through unchanged.
#[must_use]
pub fn canonical_number(n: &Number) -> Number {
    let Some(f) = n.as_f64().filter(|_| n.is_f64()) else {
        return n.clone();
    };
    if !f.is_finite() || f.fract() != 0.0 {
        return n.clone();
    }
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Number::from(f as i64)
    } else if f >= 0.0 && f < u64::MAX as f64 {
        Number::from(f as u64)
    } else {
        n.clone()
    }
}

impl MapKey {
    /// Validate the key and render it in its stored column form.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] for an empty text key.
    pub fn to_column(&self) -> Result<String> {
        match self {
            Self::Text(s) if s.is_empty() => Err(Error::InvalidKey {
                reason: "keys must not be empty",
            }),
            Self::Text(s) => Ok(s.clone()),
            Self::Number(n) => Ok(canonical_number(n).to_string()),
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{}", canonical_number(n)),
        }
    }
}

impl From<String> for MapKey {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<&String> for MapKey {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

macro_rules! integer_keys {
    ($($t:ty),*) => {
        $(
            impl From<$t> for MapKey {
                fn from(n: $t) -> Self {
                    Self::Number(Number::from(n))
                }
            }
        )*
    };
}

integer_keys!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl TryFrom<f64> for MapKey {
    type Error = Error;

    fn try_from(n: f64) -> Result<Self> {
        Number::from_f64(n)
            .map(|n| Self::Number(canonical_number(&n)))
            .ok_or(Error::InvalidKey {
                reason: "numeric keys must be finite",
            })
    }
}

impl TryFrom<&Value> for MapKey {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Number(n) => Ok(Self::Number(canonical_number(n))),
            _ => Err(Error::InvalidKey {
                reason: "keys must be strings or numbers",
            }),
        }
    }
}
