//! GeoNet feed access for geowatch.
//!
//! Two concerns live here: fetching raw GeoJSON payloads through the
//! [`FeedSource`] trait (with [`GeoNetClient`] as the HTTP implementation),
//! and normalizing those payloads into canonical records.
//!
//! Normalization is row-tolerant: a malformed feature is reported in
//! [`Normalized::skipped`] and the rest of the snapshot is kept. Only a
//! payload that is not a feature collection at all fails as a whole.
//!
//! ```rust,ignore
//! let client = GeoNetClient::new(DEFAULT_BASE_URL, Duration::from_secs(20), "geowatch")?;
//! let raw = client.fetch_quakes(3).await?;
//! let snapshot = normalize_quakes(&raw, chrono_tz::Pacific::Auckland)?;
//! for row in &snapshot.skipped {
//!     tracing::warn!(index = row.index, "{}", row.reason);
//! }
//! ```

mod client;
mod error;
mod normalize;

pub use client::{FeedSource, GeoNetClient, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use error::{FeedError, MalformedEntry};
pub use normalize::{
    normalize_quake_entry, normalize_quakes, normalize_volcano_entry, normalize_volcanoes,
    round1, Normalized, SkippedRow,
};
