//! Fixed-interval polling.
//!
//! Each feed is a [`PollTask`]. The first cycle ([`PollTask::seed`]) must
//! succeed with a non-empty snapshot or the bot refuses to start; every
//! later cycle ([`PollTask::cycle`]) may fail, in which case the failure is
//! logged, retained state is left untouched, and the next attempt happens
//! one interval later. There is no backoff and no jitter.
//!
//! Sleeping goes through `tokio::time`, so tests drive the loop with a
//! paused clock instead of waiting in real time.

use async_trait::async_trait;
use geowatch_feed::FeedError;
use std::time::Duration;
use tokio::time::sleep;

/// Errors that stop a poll task.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The first poll produced no usable records.
    #[error("{feed} feed returned no usable records on the first poll")]
    EmptySeed { feed: &'static str },

    /// The first poll could not be fetched or parsed.
    #[error("{feed} feed could not be fetched on the first poll: {source}")]
    Fetch {
        feed: &'static str,
        #[source]
        source: FeedError,
    },
}

/// What one cycle did, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Records normalized from the payload.
    pub fetched: usize,
    /// Rows dropped as malformed.
    pub skipped_rows: usize,
    /// Changes found by reconciliation.
    pub changes: usize,
    /// Changes not posted because the configuration suppresses them.
    pub suppressed: usize,
    /// Successful posts.
    pub posted: usize,
    /// Posts the sink rejected or failed to deliver.
    pub post_failures: usize,
    /// Retained entries evicted this cycle.
    pub evicted: usize,
}

/// One feed driven by [`run_poll_loop`].
#[async_trait]
pub trait PollTask: Send {
    /// Feed name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Runs the first cycle. Failure here is fatal.
    async fn seed(&mut self) -> Result<CycleReport, PollError>;

    /// Runs a steady-state cycle.
    async fn cycle(&mut self) -> Result<CycleReport, FeedError>;
}

/// Seeds `task`, then runs a cycle every `interval` forever.
///
/// # Errors
///
/// Returns the seed error if the first cycle fails. Once seeded, this
/// function never returns.
pub async fn run_poll_loop<T: PollTask>(mut task: T, interval: Duration) -> Result<(), PollError> {
    let feed = task.name();
    let report = task.seed().await?;
    log_report(feed, "seeded", &report);

    tracing::info!(
        feed,
        interval_secs = interval.as_secs(),
        "starting poll loop"
    );

    loop {
        sleep(interval).await;

        match task.cycle().await {
            Ok(report) => log_report(feed, "cycle complete", &report),
            Err(e) => {
                tracing::warn!(feed, error = %e, "poll failed, retrying next cycle");
            }
        }
    }
}

/// Runs only the first cycle of `task`.
///
/// # Errors
///
/// Same as [`PollTask::seed`].
pub async fn run_once<T: PollTask>(mut task: T) -> Result<CycleReport, PollError> {
    let report = task.seed().await?;
    log_report(task.name(), "single cycle complete", &report);
    Ok(report)
}

fn log_report(feed: &'static str, message: &'static str, report: &CycleReport) {
    tracing::info!(
        feed,
        fetched = report.fetched,
        skipped_rows = report.skipped_rows,
        changes = report.changes,
        suppressed = report.suppressed,
        posted = report.posted,
        post_failures = report.post_failures,
        evicted = report.evicted,
        "{}",
        message
    );
}
