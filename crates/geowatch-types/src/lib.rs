//! Shared record types for the geowatch hazard-feed bot.
//!
//! This crate provides the canonical representations of feed entities
//! ([`QuakeRecord`], [`VolcanoRecord`]) together with the small value types
//! that travel between the normalizer, the reconciliation engine, and the
//! notification layer: [`ThreadHandle`], [`ChangeKind`], [`Quality`], and
//! [`AlertDirection`].
//!
//! No crate in the workspace defines its own copy of these types; everything
//! cross-cutting lives here so the dependency graph stays a simple tree.

use serde::{Deserialize, Serialize};

mod quake;
mod volcano;

pub use quake::QuakeRecord;
pub use volcano::{AlertDirection, VolcanoRecord};

/// Opaque reference to a posted notification.
///
/// Returned by a notification sink after a successful post and handed back
/// to it as the `in_reply_to` target so that updates continue the same
/// conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadHandle(String);

impl ThreadHandle {
    /// Wraps a sink-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ThreadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a keyed entity differs from its retained counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// First sighting of the identifier.
    New,
    /// One of the compared fields changed since the last poll.
    Updated,
}

impl ChangeKind {
    /// Returns the canonical label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Updated => "UPDATED",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data quality reported by the seismic feed.
///
/// GeoNet publishes a small, open-ended set of quality strings. Known values
/// get their own variant; anything else is preserved verbatim in
/// [`Quality::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Quality {
    /// Reviewed by a seismologist.
    Best,
    /// Reviewed but subject to change.
    Preliminary,
    /// Automatic solution, not yet reviewed.
    Automatic,
    /// Event was retracted upstream.
    Deleted,
    /// Unrecognised quality label.
    Other(String),
}

impl Quality {
    /// Returns the feed's label for this quality.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Best => "best",
            Self::Preliminary => "preliminary",
            Self::Automatic => "automatic",
            Self::Deleted => "deleted",
            Self::Other(s) => s,
        }
    }

    /// Whether the upstream feed has retracted the event.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl From<&str> for Quality {
    fn from(s: &str) -> Self {
        match s {
            "best" => Self::Best,
            "preliminary" => Self::Preliminary,
            "automatic" => Self::Automatic,
            "deleted" => Self::Deleted,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Quality {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Quality> for String {
    fn from(q: Quality) -> Self {
        q.as_str().to_string()
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
