//! Key Part Module
//!
//! A key part is a single argument value that enters a rendered key string.

use std::fmt;

// == Key Part ==
/// A call argument value, convertible to its key-string text.
///
/// Key material is restricted to values with a stable textual form; the
/// `Display` output is exactly what ends up in the rendered key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyPart {
    /// Text, rendered as-is
    Str(String),
    /// Signed integer, rendered in decimal
    Int(i64),
    /// Boolean, rendered as `true` / `false`
    Bool(bool),
}

impl KeyPart {
    // == As Bool ==
    /// Returns the boolean value if this part is a `Bool`.
    ///
    /// Used when popping reserved invocation flags out of keyword arguments.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            KeyPart::Bool(b) => Some(*b),
            _ => None,
        }
    }

    // == As Int ==
    /// Returns the integer value if this part is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            KeyPart::Int(i) => Some(*i),
            _ => None,
        }
    }

    // == As Str ==
    /// Returns the text if this part is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyPart::Str(s) => Some(s),
            _ => None,
        }
    }
}

// == Display Implementation ==
impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Str(s) => f.write_str(s),
            KeyPart::Int(i) => write!(f, "{}", i),
            KeyPart::Bool(b) => write!(f, "{}", b),
        }
    }
}

// == From Conversions ==
impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<i32> for KeyPart {
    fn from(value: i32) -> Self {
        KeyPart::Int(value as i64)
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        KeyPart::Int(value as i64)
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}
