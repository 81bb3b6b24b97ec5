//! Identifier and bounded-text types
//! ---------------------------------
//! Single source of truth for the textual fields the engine stores. Length
//! limits are enforced when a value is constructed, so by the time a value
//! reaches an engine operation it is already known to fit its column.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

macro_rules! bounded_text {
    ($(#[$meta:meta])* $name:ident, $field:literal, $max:expr, $allow_empty:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub const MAX_CHARS: usize = $max;

            pub fn new(value: impl Into<String>) -> Result<Self, FieldError> {
                let value = value.into();
                check_bounds($field, &value, Self::MAX_CHARS, $allow_empty)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl FromStr for $name {
            type Err = FieldError;
            fn from_str(s: &str) -> Result<Self, Self::Err> { Self::new(s) }
        }

        impl TryFrom<String> for $name {
            type Error = FieldError;
            fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
        }

        impl TryFrom<&str> for $name {
            type Error = FieldError;
            fn try_from(value: &str) -> Result<Self, Self::Error> { Self::new(value) }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self { value.0 }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str { &self.0 }
        }
    };
}

fn check_bounds(field: &'static str, value: &str, max: usize, allow_empty: bool) -> Result<(), FieldError> {
    if !allow_empty && value.is_empty() {
        return Err(FieldError::Empty { field });
    }
    let len = value.chars().count();
    if len > max {
        return Err(FieldError::TooLong { field, max, len });
    }
    Ok(())
}

bounded_text!(
    /// Namespace key for entities and for records inside an entity.
    Handle, "handle", 64, false
);
bounded_text!(Title, "title", 256, true);
bounded_text!(Summary, "summary", 500, true);
bounded_text!(Category, "category", 64, true);
bounded_text!(
    /// Free text attached to a ledger event.
    Memo, "memo", 500, true
);

impl Memo {
    /// Build a memo from engine-generated text, cutting it at the column limit.
    pub fn truncated(text: impl Into<String>) -> Self {
        let text = text.into();
        match text.char_indices().nth(Self::MAX_CHARS) {
            Some((cut, _)) => Self(text[..cut].to_string()),
            None => Self(text),
        }
    }
}

/// Identity of a caller as supplied by the execution environment.
///
/// The engine never authenticates actors; it only compares identifiers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

impl From<String> for ActorId {
    fn from(value: String) -> Self { Self(value) }
}
