//! Mapping of raw GeoJSON features into canonical records.
//!
//! Only the properties geowatch consumes are read; everything else in the
//! payload is ignored. The entry-level functions are pure and report a
//! [`MalformedEntry`] for the first problem found in a row.

use std::collections::HashSet;

use chrono::DateTime;
use chrono_tz::Tz;
use geowatch_types::{Quality, QuakeRecord, VolcanoRecord};
use serde_json::{Map, Value};

use crate::error::{FeedError, MalformedEntry};

/// A row that was dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// Position of the feature in the payload.
    pub index: usize,
    /// Why it was dropped.
    pub reason: MalformedEntry,
}

/// A normalized snapshot plus the rows that could not be normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    /// Records in feed order.
    pub records: Vec<T>,
    /// Rows dropped as malformed, in feed order.
    pub skipped: Vec<SkippedRow>,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Normalized<T> {
    /// Returns `true` when no usable records were found.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lays the records out by their position in the payload, with `None`
    /// where a row was skipped.
    pub fn aligned(&self) -> Vec<Option<&T>> {
        let total = self.records.len() + self.skipped.len();
        let mut records = self.records.iter();
        let mut skipped = self.skipped.iter().map(|row| row.index).peekable();
        (0..total)
            .map(|index| {
                if skipped.next_if_eq(&index).is_some() {
                    None
                } else {
                    records.next()
                }
            })
            .collect()
    }
}

/// Rounds to one decimal place, halves away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Normalizes a quake feed payload.
///
/// Origin times are converted to the local time of `tz`, daylight saving
/// included. Rows repeating an earlier
/// public ID are skipped as [`MalformedEntry::DuplicateId`].
///
/// # Errors
///
/// Returns [`FeedError::Shape`] if the payload is not JSON or has no
/// `features` array.
pub fn normalize_quakes(
    payload: &str,
    tz: Tz,
) -> Result<Normalized<QuakeRecord>, FeedError> {
    normalize_features(payload, |feature| normalize_quake_entry(feature, tz), |q| &q.id)
}

/// Normalizes a volcanic alert level payload.
///
/// # Errors
///
/// Returns [`FeedError::Shape`] if the payload is not JSON or has no
/// `features` array.
pub fn normalize_volcanoes(payload: &str) -> Result<Normalized<VolcanoRecord>, FeedError> {
    normalize_features(payload, normalize_volcano_entry, |v| &v.id)
}

fn normalize_features<T>(
    payload: &str,
    entry: impl Fn(&Value) -> Result<T, MalformedEntry>,
    id_of: impl Fn(&T) -> &String,
) -> Result<Normalized<T>, FeedError> {
    let root: Value =
        serde_json::from_str(payload).map_err(|e| FeedError::Shape(e.to_string()))?;
    let features = root
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| FeedError::Shape("missing `features` array".to_string()))?;

    let mut out = Normalized::default();
    let mut seen = HashSet::new();
    for (index, feature) in features.iter().enumerate() {
        let result = entry(feature).and_then(|record| {
            if seen.insert(id_of(&record).clone()) {
                Ok(record)
            } else {
                Err(MalformedEntry::DuplicateId(id_of(&record).clone()))
            }
        });
        match result {
            Ok(record) => out.records.push(record),
            Err(reason) => out.skipped.push(SkippedRow { index, reason }),
        }
    }
    Ok(out)
}

/// Maps one quake feature to a [`QuakeRecord`].
///
/// Required properties: `publicID`, `time`, `depth`, `magnitude`,
/// `locality`, `quality`. `mmi` is optional; values outside 1–12 are
/// treated as absent. Coordinates default to empty when no geometry is
/// present.
pub fn normalize_quake_entry(
    feature: &Value,
    tz: Tz,
) -> Result<QuakeRecord, MalformedEntry> {
    let props = properties(feature)?;

    let id = text(props, "publicID")?;
    let raw_time = text(props, "time")?;
    let time = DateTime::parse_from_rfc3339(&raw_time)
        .map_err(|e| MalformedEntry::BadTimestamp {
            value: raw_time.clone(),
            reason: e.to_string(),
        })?
        .with_timezone(&tz)
        .fixed_offset();
    let depth = round1(number(props, "depth")?);
    let magnitude = round1(number(props, "magnitude")?);
    let intensity = match props.get("mmi") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let mmi = v.as_f64().ok_or_else(|| MalformedEntry::NotNumeric {
                field: "mmi",
                value: v.to_string(),
            })?;
            (1.0..=12.0).contains(&mmi).then(|| mmi.round() as u8)
        }
    };
    let locality = text(props, "locality")?;
    let quality = Quality::from(text(props, "quality")?);
    let coordinates = feature
        .pointer("/geometry/coordinates")
        .and_then(Value::as_array)
        .map(|coords| coords.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default();

    Ok(QuakeRecord {
        id,
        coordinates,
        time,
        depth,
        magnitude,
        intensity,
        locality,
        quality,
        thread: None,
    })
}

/// Maps one volcano feature to a [`VolcanoRecord`].
///
/// Required properties: `volcanoID`, `volcanoTitle`, `level`, `activity`.
pub fn normalize_volcano_entry(feature: &Value) -> Result<VolcanoRecord, MalformedEntry> {
    let props = properties(feature)?;

    let id = text(props, "volcanoID")?;
    let title = text(props, "volcanoTitle")?;
    let raw_level = required(props, "level")?;
    if !raw_level.is_number() {
        return Err(MalformedEntry::NotNumeric {
            field: "level",
            value: raw_level.to_string(),
        });
    }
    let level = raw_level
        .as_u64()
        .and_then(|l| u32::try_from(l).ok())
        .ok_or_else(|| MalformedEntry::BadLevel(raw_level.to_string()))?;
    let activity = text(props, "activity")?;

    Ok(VolcanoRecord {
        id,
        title,
        level,
        activity,
    })
}

fn properties(feature: &Value) -> Result<&Map<String, Value>, MalformedEntry> {
    feature
        .get("properties")
        .and_then(Value::as_object)
        .ok_or(MalformedEntry::MissingField("properties"))
}

fn required<'a>(props: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, MalformedEntry> {
    match props.get(field) {
        None | Some(Value::Null) => Err(MalformedEntry::MissingField(field)),
        Some(v) => Ok(v),
    }
}

fn text(props: &Map<String, Value>, field: &'static str) -> Result<String, MalformedEntry> {
    let value = required(props, field)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| MalformedEntry::NotText {
            field,
            value: value.to_string(),
        })
}

fn number(props: &Map<String, Value>, field: &'static str) -> Result<f64, MalformedEntry> {
    let value = required(props, field)?;
    value.as_f64().ok_or_else(|| MalformedEntry::NotNumeric {
        field,
        value: value.to_string(),
    })
}
