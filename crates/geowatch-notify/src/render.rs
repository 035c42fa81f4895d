//! Notification text.

use std::fmt::Write;

use geowatch_types::{AlertDirection, ChangeKind, QuakeRecord, VolcanoRecord};

use crate::tables::{intensity_description, volcano_display_name, volcano_hashtag};

/// Optional parts of a quake notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuakeDisplay {
    /// Describe the shaking intensity when known.
    pub show_intensity: bool,
    /// Append the upstream data quality.
    pub show_quality: bool,
}

impl Default for QuakeDisplay {
    fn default() -> Self {
        Self {
            show_intensity: true,
            show_quality: false,
        }
    }
}

/// Renders a new or updated quake.
///
/// ```text
/// M3.4 quake, light intensity, 10 km north of Whakatane.
/// 5.1 km deep, 8:32 PM, 10 July 2020.
/// https://www.geonet.org.nz/earthquake/2020p516546 #eqnz
/// ```
///
/// Updates are prefixed with `Updated:`.
pub fn render_quake(record: &QuakeRecord, kind: ChangeKind, display: QuakeDisplay) -> String {
    let mut text = String::new();
    if kind == ChangeKind::Updated {
        text.push_str("Updated: ");
    }
    let _ = write!(text, "M{:.1} quake", record.magnitude);
    if display.show_intensity {
        if let Some(desc) = record.intensity.and_then(intensity_description) {
            let _ = write!(text, ", {desc} intensity");
        }
    }
    let _ = write!(
        text,
        ", {}.\n{:.1} km deep, {}.",
        record.locality,
        record.depth,
        record.time.format("%-I:%M %p, %-d %B %Y")
    );
    if display.show_quality {
        let _ = write!(text, " Quality: {}.", record.quality);
    }
    let _ = write!(text, "\n{} #eqnz", record.url());
    text
}

/// Renders an alert-level transition.
pub fn render_level_change(
    record: &VolcanoRecord,
    old_level: u32,
    direction: AlertDirection,
) -> String {
    format!(
        "Volcanic alert level for {} {} from {} to {}. {}\n{} #{} #VolcanoNZ",
        volcano_display_name(&record.id, &record.title),
        direction,
        old_level,
        record.level,
        record.activity,
        record.url(),
        volcano_hashtag(&record.id, &record.title),
    )
}

/// Renders one aggregated message for all volcanoes at or above `threshold`.
///
/// Returns `None` if `records` is empty.
pub fn render_volcano_summary(records: &[&VolcanoRecord], threshold: u32) -> Option<String> {
    if records.is_empty() {
        return None;
    }
    let mut text = format!("Volcanic alert levels at {threshold} and above:");
    for record in records {
        let _ = write!(
            text,
            "\n{}: level {}",
            volcano_display_name(&record.id, &record.title),
            record.level
        );
    }
    text.push_str("\nhttps://www.geonet.org.nz/volcano #VolcanoNZ");
    Some(text)
}
