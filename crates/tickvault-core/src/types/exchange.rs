//! Exchange (venue) identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange or venue code (e.g. `BINANCE`, `SSE`, `NYSE`).
///
/// The value is opaque to this crate; the storage layer validates it before
/// it becomes part of a key.
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Exchange(String);

impl Exchange {
    /// Create a new exchange code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Exchange {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Exchange {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
