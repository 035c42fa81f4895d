//! Error types for feed fetching and normalization.

/// A snapshot could not be obtained.
///
/// Every variant is recoverable once the bot is running: the cycle is
/// skipped and retained state is left as it was.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Transport failure: connection, TLS, timeout, or body read.
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed answered with a non-2xx status.
    #[error("feed returned HTTP {0}")]
    Status(u16),

    /// The payload is not a GeoJSON feature collection.
    #[error("feed payload has unexpected shape: {0}")]
    Shape(String),
}

/// One feed row could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedEntry {
    /// A required property is absent or null.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A property that must be text holds something else.
    #[error("field `{field}` is not a string: {value}")]
    NotText {
        /// Property name.
        field: &'static str,
        /// Offending JSON value.
        value: String,
    },

    /// A property that must be a number holds something else.
    #[error("field `{field}` is not a number: {value}")]
    NotNumeric {
        /// Property name.
        field: &'static str,
        /// Offending JSON value.
        value: String,
    },

    /// The origin time is not a valid ISO-8601 timestamp.
    #[error("invalid timestamp {value:?}: {reason}")]
    BadTimestamp {
        /// Raw timestamp text.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// The alert level is numeric but not a non-negative integer.
    #[error("alert level must be a non-negative integer, got {0}")]
    BadLevel(String),

    /// The identifier already appeared earlier in the same snapshot.
    #[error("duplicate identifier {0}")]
    DuplicateId(String),
}
