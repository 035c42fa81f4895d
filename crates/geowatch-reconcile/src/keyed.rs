//! Keyed reconciliation for the seismic feed.
//!
//! Retained state is a map from public ID to the last materially distinct
//! version of each event. Each poll is merged into it in feed order, and
//! the map is then trimmed back to its retention limit by evicting the
//! events with the earliest origin time.

use std::collections::HashMap;

use geowatch_types::{ChangeKind, QuakeRecord, ThreadHandle};

/// Maximum number of seismic events retained between polls.
pub const DEFAULT_RETAIN_LIMIT: usize = 500;

/// One notification-worthy change to a seismic event.
#[derive(Debug, Clone, PartialEq)]
pub struct QuakeChange {
    /// The event as now retained.
    pub record: QuakeRecord,
    /// Whether the event is new or updated.
    pub kind: ChangeKind,
    /// Thread of the last successful post about this event, if any.
    ///
    /// Always `None` for [`ChangeKind::New`].
    pub prior_thread: Option<ThreadHandle>,
}

/// Result of merging one poll into retained state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuakeChangeSet {
    /// Changes in feed order.
    pub changes: Vec<QuakeChange>,
    /// Events seen again with no material difference.
    pub unchanged: usize,
    /// Rows ignored because the feed marks them deleted.
    pub skipped_deleted: usize,
    /// IDs evicted to respect the retention limit, oldest first.
    pub evicted: Vec<String>,
}

impl QuakeChangeSet {
    /// Returns `true` when nothing needs to be posted.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Retained seismic events, keyed by public ID.
#[derive(Debug, Clone)]
pub struct QuakeState {
    records: HashMap<String, QuakeRecord>,
    limit: usize,
}

impl Default for QuakeState {
    fn default() -> Self {
        Self::new()
    }
}

impl QuakeState {
    /// Creates empty state with the default retention limit.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_RETAIN_LIMIT)
    }

    /// Creates empty state retaining at most `limit` events (minimum 1).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            records: HashMap::new(),
            limit: limit.max(1),
        }
    }

    /// The retention limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no events are retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a retained event.
    pub fn get(&self, id: &str) -> Option<&QuakeRecord> {
        self.records.get(id)
    }

    /// Whether `id` is currently retained.
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Iterates over retained events in arbitrary order.
    pub fn records(&self) -> impl Iterator<Item = &QuakeRecord> {
        self.records.values()
    }

    /// Merges a freshly normalized snapshot into retained state.
    ///
    /// Deleted-quality rows are ignored outright. Unseen IDs are inserted
    /// and reported as [`ChangeKind::New`]; retained IDs whose magnitude,
    /// time, depth or locality changed are replaced and reported as
    /// [`ChangeKind::Updated`], keeping their existing thread handle. After
    /// the merge, the oldest events are evicted until the state fits its
    /// retention limit.
    pub fn reconcile(&mut self, incoming: impl IntoIterator<Item = QuakeRecord>) -> QuakeChangeSet {
        let mut set = QuakeChangeSet::default();

        for mut record in incoming {
            if record.quality.is_deleted() {
                tracing::debug!(id = %record.id, "ignoring deleted event");
                set.skipped_deleted += 1;
                continue;
            }

            match self.records.get_mut(&record.id) {
                None => {
                    record.thread = None;
                    self.records.insert(record.id.clone(), record.clone());
                    set.changes.push(QuakeChange {
                        record,
                        kind: ChangeKind::New,
                        prior_thread: None,
                    });
                }
                Some(existing) if existing.differs_materially(&record) => {
                    let prior_thread = existing.thread.clone();
                    record.thread = prior_thread.clone();
                    *existing = record.clone();
                    set.changes.push(QuakeChange {
                        record,
                        kind: ChangeKind::Updated,
                        prior_thread,
                    });
                }
                Some(_) => set.unchanged += 1,
            }
        }

        set.evicted = self.evict_oldest();
        set
    }

    /// Records the thread handle of a confirmed post.
    ///
    /// Returns `false` if `id` is no longer retained (for example because it
    /// was evicted in the same poll that reported it).
    pub fn commit_thread(&mut self, id: &str, handle: ThreadHandle) -> bool {
        match self.records.get_mut(id) {
            Some(record) => {
                record.thread = Some(handle);
                true
            }
            None => false,
        }
    }

    fn evict_oldest(&mut self) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.records.len() > self.limit {
            let oldest = self
                .records
                .values()
                .min_by(|a, b| a.time.cmp(&b.time).then_with(|| a.id.cmp(&b.id)))
                .map(|r| r.id.clone());
            let Some(id) = oldest else { break };
            self.records.remove(&id);
            tracing::debug!(id = %id, "evicted oldest retained event");
            evicted.push(id);
        }
        evicted
    }
}
