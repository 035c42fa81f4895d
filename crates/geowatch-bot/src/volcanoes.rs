//! Volcanic alert level watcher.
//!
//! The previous snapshot lives on disk, not in memory: every cycle reads
//! it back, compares it with the fresh payload, posts level changes, and
//! overwrites it. Without a readable previous snapshot the cycle only
//! reseeds the file.
//!
//! The broadcast modes (`summary` and `emit_all`) apply to the first cycle
//! only; every later cycle posts level changes alone.

use std::sync::Arc;

use async_trait::async_trait;
use geowatch_feed::{normalize_volcanoes, FeedError, FeedSource, Normalized};
use geowatch_notify::{render_level_change, render_volcano_summary, NotificationSink};
use geowatch_reconcile::{reconcile_volcanoes, select_summary};
use geowatch_types::VolcanoRecord;

use crate::config::VolcanoConfig;
use crate::scheduler::{CycleReport, PollError, PollTask};
use crate::snapshot::SnapshotStore;

const FEED: &str = "volcanoes";

/// Poll task for the volcanic alert level feed.
pub struct VolcanoWatcher {
    source: Arc<dyn FeedSource>,
    sink: Arc<dyn NotificationSink>,
    config: VolcanoConfig,
    store: SnapshotStore,
}

impl VolcanoWatcher {
    pub fn new(
        source: Arc<dyn FeedSource>,
        sink: Arc<dyn NotificationSink>,
        config: VolcanoConfig,
    ) -> Self {
        let store = SnapshotStore::new(&config.snapshot_path);
        Self {
            source,
            sink,
            config,
            store,
        }
    }

    async fn fetch(&self) -> Result<(String, Normalized<VolcanoRecord>), FeedError> {
        let raw = self.source.fetch_volcanoes().await?;
        let snapshot = normalize_volcanoes(&raw)?;
        for row in &snapshot.skipped {
            tracing::warn!(feed = FEED, index = row.index, reason = %row.reason, "skipping malformed row");
        }
        Ok((raw, snapshot))
    }

    /// Reconciles and posts, then persists `raw` as the new snapshot.
    ///
    /// `broadcast` enables the configured summary or emit-all behaviour.
    async fn process(
        &self,
        raw: &str,
        snapshot: Normalized<VolcanoRecord>,
        broadcast: bool,
    ) -> CycleReport {
        let mut report = CycleReport {
            fetched: snapshot.records.len(),
            skipped_rows: snapshot.skipped.len(),
            ..CycleReport::default()
        };

        if broadcast && self.config.summary {
            self.post_summary(&snapshot.records, &mut report).await;
        } else if let Some(previous) = self.load_previous().await {
            let force_all = broadcast && self.config.emit_all;
            self.post_changes(&previous, &snapshot, force_all, &mut report)
                .await;
        }

        if let Err(e) = self.store.save(raw).await {
            tracing::error!(feed = FEED, error = %e, "failed to persist volcano snapshot");
        }
        report
    }

    /// Reads the previous snapshot, treating any failure as "no prior state".
    async fn load_previous(&self) -> Option<Normalized<VolcanoRecord>> {
        let path = self.store.path().display();
        let raw = match self.store.load().await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!(feed = FEED, path = %path, "no previous snapshot, seeding");
                return None;
            }
            Err(e) => {
                tracing::warn!(feed = FEED, error = %e, "previous snapshot unreadable, reseeding");
                return None;
            }
        };
        match normalize_volcanoes(&raw) {
            Ok(previous) => Some(previous),
            Err(e) => {
                tracing::warn!(feed = FEED, path = %path, error = %e, "previous snapshot corrupt, reseeding");
                None
            }
        }
    }

    async fn post_changes(
        &self,
        previous: &Normalized<VolcanoRecord>,
        incoming: &Normalized<VolcanoRecord>,
        force_all: bool,
        report: &mut CycleReport,
    ) {
        let diff = reconcile_volcanoes(
            self.config.pairing,
            &previous.aligned(),
            &incoming.aligned(),
            force_all,
        );
        for added in &diff.added {
            tracing::info!(feed = FEED, id = %added.id, level = added.level, "volcano added to feed");
        }
        for removed in &diff.removed {
            tracing::info!(feed = FEED, id = %removed.id, "volcano dropped from feed");
        }

        report.changes = diff.changes.len();
        for change in &diff.changes {
            let text = render_level_change(&change.record, change.old_level, change.direction);
            self.post(&text, &change.record.id, report).await;
        }
    }

    async fn post_summary(&self, incoming: &[VolcanoRecord], report: &mut CycleReport) {
        let threshold = self.config.summary_threshold;
        let selected = select_summary(incoming, threshold);
        report.changes = selected.len();
        match render_volcano_summary(&selected, threshold) {
            Some(text) => self.post(&text, "summary", report).await,
            None => tracing::info!(feed = FEED, threshold, "no volcanoes at or above threshold"),
        }
    }

    async fn post(&self, text: &str, subject: &str, report: &mut CycleReport) {
        match self.sink.post(text, None).await {
            Ok(_) => report.posted += 1,
            Err(e) => {
                report.post_failures += 1;
                tracing::warn!(feed = FEED, subject, error = %e, "failed to post notification");
            }
        }
    }
}

#[async_trait]
impl PollTask for VolcanoWatcher {
    fn name(&self) -> &'static str {
        FEED
    }

    async fn seed(&mut self) -> Result<CycleReport, PollError> {
        let (raw, snapshot) = self
            .fetch()
            .await
            .map_err(|source| PollError::Fetch { feed: FEED, source })?;
        if snapshot.is_empty() {
            return Err(PollError::EmptySeed { feed: FEED });
        }
        Ok(self.process(&raw, snapshot, true).await)
    }

    async fn cycle(&mut self) -> Result<CycleReport, FeedError> {
        let (raw, snapshot) = self.fetch().await?;
        if snapshot.is_empty() {
            // Keep the stored snapshot rather than diffing against nothing next time.
            tracing::warn!(feed = FEED, skipped_rows = snapshot.skipped.len(), "feed returned no usable records");
            return Ok(CycleReport {
                skipped_rows: snapshot.skipped.len(),
                ..CycleReport::default()
            });
        }
        Ok(self.process(&raw, snapshot, false).await)
    }
}
