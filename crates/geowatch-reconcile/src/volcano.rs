//! Alert-level reconciliation for the volcano feed.
//!
//! The volcano feed has no retained per-entity state: the previous poll's
//! full snapshot is compared against the new one and then discarded. Two
//! pairing strategies are offered. [`Pairing::Positional`] matches entries
//! by array index and only compares pairs whose IDs agree, which assumes
//! the feed keeps a stable order between polls. [`Pairing::ById`] matches
//! entries by volcano ID and reports entries that appear or disappear.

use std::collections::{HashMap, HashSet};

use geowatch_types::{AlertDirection, VolcanoRecord};
use serde::Deserialize;

/// How entries of consecutive volcano snapshots are matched up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pairing {
    /// Pair `previous[i]` with `incoming[i]`.
    #[default]
    Positional,
    /// Pair entries with equal volcano IDs.
    ById,
}

/// A volcano whose alert level should be announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChange {
    /// The volcano as reported by the latest poll.
    pub record: VolcanoRecord,
    /// Level in the previous snapshot.
    pub old_level: u32,
    /// Wording for the transition.
    pub direction: AlertDirection,
}

impl LevelChange {
    fn new(record: VolcanoRecord, old_level: u32) -> Self {
        let direction = AlertDirection::between(old_level, record.level);
        Self {
            record,
            old_level,
            direction,
        }
    }
}

/// Outcome of comparing two volcano snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolcanoDiff {
    /// Level changes in incoming feed order.
    pub changes: Vec<LevelChange>,
    /// Incoming volcanoes with no previous counterpart (by-id pairing only).
    pub added: Vec<VolcanoRecord>,
    /// Previous volcanoes missing from the incoming snapshot (by-id pairing only).
    pub removed: Vec<VolcanoRecord>,
}

/// One snapshot laid out by raw feed position.
///
/// `None` marks a feature that failed to normalize, so a bad row occupies
/// its own position instead of shifting every later entry.
pub type FeedRows<'a> = [Option<&'a VolcanoRecord>];

/// Compares two snapshots index by index.
///
/// Only the first `min(previous.len(), incoming.len())` positions are
/// examined. A position that is malformed on either side, or whose IDs
/// disagree, is skipped. A matching pair yields a [`LevelChange`] when the
/// levels differ, or unconditionally when `force_all` is set.
pub fn reconcile_positional(
    previous: &FeedRows<'_>,
    incoming: &FeedRows<'_>,
    force_all: bool,
) -> Vec<LevelChange> {
    previous
        .iter()
        .zip(incoming)
        .enumerate()
        .filter_map(|(index, (old, new))| {
            let (Some(old), Some(new)) = (*old, *new) else {
                tracing::debug!(index, "malformed row at position, skipping");
                return None;
            };
            if old.id != new.id {
                tracing::debug!(
                    index,
                    previous_id = %old.id,
                    incoming_id = %new.id,
                    "volcano IDs disagree at position, skipping"
                );
                return None;
            }
            (force_all || old.level != new.level).then(|| LevelChange::new(new.clone(), old.level))
        })
        .collect()
}

/// Compares two snapshots by volcano ID.
///
/// Malformed rows are ignored. Matched volcanoes follow the same level
/// rule as [`reconcile_positional`]. Unmatched entries are reported in
/// [`VolcanoDiff::added`] and [`VolcanoDiff::removed`] rather than being
/// compared against unrelated neighbours.
pub fn reconcile_by_id(
    previous: &FeedRows<'_>,
    incoming: &FeedRows<'_>,
    force_all: bool,
) -> VolcanoDiff {
    let by_id: HashMap<&str, &VolcanoRecord> = previous
        .iter()
        .flatten()
        .map(|v| (v.id.as_str(), *v))
        .collect();
    let incoming_ids: HashSet<&str> = incoming.iter().flatten().map(|v| v.id.as_str()).collect();

    let mut diff = VolcanoDiff::default();
    for new in incoming.iter().flatten() {
        match by_id.get(new.id.as_str()) {
            Some(old) if force_all || old.level != new.level => {
                diff.changes.push(LevelChange::new((*new).clone(), old.level));
            }
            Some(_) => {}
            None => diff.added.push((*new).clone()),
        }
    }
    diff.removed = previous
        .iter()
        .flatten()
        .filter(|v| !incoming_ids.contains(v.id.as_str()))
        .map(|v| (*v).clone())
        .collect();
    diff
}

/// Dispatches to the reconciliation strategy selected by `pairing`.
pub fn reconcile_volcanoes(
    pairing: Pairing,
    previous: &FeedRows<'_>,
    incoming: &FeedRows<'_>,
    force_all: bool,
) -> VolcanoDiff {
    match pairing {
        Pairing::Positional => VolcanoDiff {
            changes: reconcile_positional(previous, incoming, force_all),
            ..VolcanoDiff::default()
        },
        Pairing::ById => reconcile_by_id(previous, incoming, force_all),
    }
}

/// Selects volcanoes at or above `threshold`, in feed order.
pub fn select_summary(incoming: &[VolcanoRecord], threshold: u32) -> Vec<&VolcanoRecord> {
    incoming.iter().filter(|v| v.level >= threshold).collect()
}
