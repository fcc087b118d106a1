//! Stable item identity.

use std::fmt;

/// Opaque, stable handle to a persisted entity (status, notification).
///
/// Wraps the server-assigned id string. Equality is identity equality, not
/// value equality of the entity it names; an id is never reused for two
/// logically different entities. Ordering follows the server's id scheme
/// (ids sort chronologically when zero-padded, which Mastodon snowflakes
/// are within a single server), but the engine never relies on it for
/// display order — store order is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusId(String);

impl StatusId {
    /// Wrap a server-assigned id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StatusId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StatusId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
