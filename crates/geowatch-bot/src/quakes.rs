//! Seismic feed watcher.
//!
//! Each cycle fetches the quake feed, merges it into the retained
//! [`QuakeState`], and posts every new or revised event. Revisions are
//! posted as replies to the event's previous post. A thread handle is only
//! recorded once the sink confirms the post; if posting fails the event
//! keeps whatever handle it had before.
//!
//! An event that is evicted in the same poll that reported it is not
//! posted. It falls outside the retention window, so posting it would
//! repeat on every poll that still carries it.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use geowatch_feed::{normalize_quakes, FeedError, FeedSource, Normalized};
use geowatch_notify::{render_quake, NotificationSink};
use geowatch_reconcile::QuakeState;
use geowatch_types::{ChangeKind, QuakeRecord};

use crate::config::QuakeConfig;
use crate::scheduler::{CycleReport, PollError, PollTask};

const FEED: &str = "quakes";

/// Poll task for the seismic feed.
pub struct QuakeWatcher {
    source: Arc<dyn FeedSource>,
    sink: Arc<dyn NotificationSink>,
    config: QuakeConfig,
    tz: Tz,
    state: QuakeState,
}

impl QuakeWatcher {
    pub fn new(
        source: Arc<dyn FeedSource>,
        sink: Arc<dyn NotificationSink>,
        config: QuakeConfig,
        tz: Tz,
    ) -> Self {
        let state = QuakeState::with_limit(config.retain_limit);
        Self {
            source,
            sink,
            config,
            tz,
            state,
        }
    }

    /// Retained events.
    pub fn state(&self) -> &QuakeState {
        &self.state
    }

    async fn fetch(&self) -> Result<Normalized<QuakeRecord>, FeedError> {
        let raw = self.source.fetch_quakes(self.config.min_intensity).await?;
        let snapshot = normalize_quakes(&raw, self.tz)?;
        for row in &snapshot.skipped {
            tracing::warn!(feed = FEED, index = row.index, reason = %row.reason, "skipping malformed row");
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl PollTask for QuakeWatcher {
    fn name(&self) -> &'static str {
        FEED
    }

    /// Fills retained state from the first poll without posting.
    ///
    /// Everything in the initial snapshot is already public, so announcing
    /// it would only flood the account.
    async fn seed(&mut self) -> Result<CycleReport, PollError> {
        let snapshot = self
            .fetch()
            .await
            .map_err(|source| PollError::Fetch { feed: FEED, source })?;
        if snapshot.is_empty() {
            return Err(PollError::EmptySeed { feed: FEED });
        }

        let fetched = snapshot.records.len();
        let set = self.state.reconcile(snapshot.records);
        Ok(CycleReport {
            fetched,
            skipped_rows: snapshot.skipped.len(),
            evicted: set.evicted.len(),
            ..CycleReport::default()
        })
    }

    async fn cycle(&mut self) -> Result<CycleReport, FeedError> {
        let snapshot = self.fetch().await?;
        let mut report = CycleReport {
            fetched: snapshot.records.len(),
            skipped_rows: snapshot.skipped.len(),
            ..CycleReport::default()
        };

        let set = self.state.reconcile(snapshot.records);
        report.changes = set.changes.len();
        report.evicted = set.evicted.len();

        let evicted: HashSet<&str> = set.evicted.iter().map(String::as_str).collect();
        for change in set.changes {
            if evicted.contains(change.record.id.as_str()) {
                tracing::warn!(
                    feed = FEED,
                    id = %change.record.id,
                    retain_limit = self.config.retain_limit,
                    "event older than the retention window, not posting"
                );
                report.suppressed += 1;
                continue;
            }
            if change.kind == ChangeKind::Updated && !self.config.post_updates {
                report.suppressed += 1;
                continue;
            }

            let text = render_quake(&change.record, change.kind, self.config.display());
            match self.sink.post(&text, change.prior_thread.as_ref()).await {
                Ok(handle) => {
                    report.posted += 1;
                    if !self.state.commit_thread(&change.record.id, handle) {
                        tracing::debug!(
                            feed = FEED,
                            id = %change.record.id,
                            "event evicted before its thread could be recorded"
                        );
                    }
                }
                Err(e) => {
                    report.post_failures += 1;
                    tracing::warn!(
                        feed = FEED,
                        id = %change.record.id,
                        kind = %change.kind,
                        error = %e,
                        "failed to post notification"
                    );
                }
            }
        }

        Ok(report)
    }
}
