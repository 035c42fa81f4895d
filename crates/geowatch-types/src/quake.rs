use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{Quality, ThreadHandle};

/// Canonical form of one seismic event from the quake feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuakeRecord {
    /// Stable, externally assigned public ID (e.g. `2020p516546`).
    pub id: String,
    /// Raw GeoJSON coordinates: longitude, latitude and optionally depth.
    pub coordinates: Vec<f64>,
    /// Origin time, converted to the configured display offset.
    pub time: DateTime<FixedOffset>,
    /// Depth in kilometres, rounded to one decimal place.
    pub depth: f64,
    /// Magnitude, rounded to one decimal place.
    pub magnitude: f64,
    /// Modified Mercalli intensity (1–12), absent when not yet computed.
    pub intensity: Option<u8>,
    /// Human-readable locality description.
    pub locality: String,
    /// Upstream data quality.
    pub quality: Quality,
    /// Thread of the last successful post about this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadHandle>,
}

impl QuakeRecord {
    /// Returns `true` when any field that warrants a notification differs.
    ///
    /// Only magnitude, time, depth and locality are compared. Coordinates,
    /// intensity, quality and the thread handle are descriptive and never
    /// trigger an update on their own.
    pub fn differs_materially(&self, other: &QuakeRecord) -> bool {
        self.magnitude != other.magnitude
            || self.time != other.time
            || self.depth != other.depth
            || self.locality != other.locality
    }

    /// Public GeoNet page for the event.
    pub fn url(&self) -> String {
        format!("https://www.geonet.org.nz/earthquake/{}", self.id)
    }
}
