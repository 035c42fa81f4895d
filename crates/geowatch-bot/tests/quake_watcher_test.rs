mod common;

use std::sync::Arc;

use common::{nz, quake_payload, QuakeRow, RecordingSink, ScriptedSource};
use geowatch_bot::config::QuakeConfig;
use geowatch_bot::quakes::QuakeWatcher;
use geowatch_bot::scheduler::{PollError, PollTask};
use geowatch_feed::FeedError;

fn watcher(source: &Arc<ScriptedSource>, sink: &Arc<RecordingSink>) -> QuakeWatcher {
    watcher_with(source, sink, QuakeConfig::default())
}

fn watcher_with(
    source: &Arc<ScriptedSource>,
    sink: &Arc<RecordingSink>,
    config: QuakeConfig,
) -> QuakeWatcher {
    QuakeWatcher::new(source.clone(), sink.clone(), config, nz())
}

#[tokio::test]
async fn seed_fetch_failure_is_fatal() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(RecordingSink::new());
    source.push_quakes(Err(FeedError::Status(500)));

    let mut task = watcher(&source, &sink);
    let err = task.seed().await.unwrap_err();

    assert!(matches!(err, PollError::Fetch { feed: "quakes", .. }));
    assert!(sink.posts().is_empty());
}

#[tokio::test]
async fn seed_with_empty_snapshot_is_fatal() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(RecordingSink::new());
    source.push_quakes(Ok(quake_payload(&[])));

    let mut task = watcher(&source, &sink);
    let err = task.seed().await.unwrap_err();

    assert!(matches!(err, PollError::EmptySeed { feed: "quakes" }));
}

#[tokio::test]
async fn seed_with_only_deleted_rows_retains_nothing() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(RecordingSink::new());
    source.push_quakes(Ok(quake_payload(&[
        QuakeRow::new("2024p000001", 3.1).quality("deleted")
    ])));

    let mut task = watcher(&source, &sink);
    // Deleted rows normalize fine but never enter retained state.
    let report = task.seed().await.unwrap();
    assert_eq!(report.fetched, 1);
    assert!(task.state().is_empty());
}

#[tokio::test]
async fn seed_fills_state_without_posting() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(RecordingSink::new());
    source.push_quakes(Ok(quake_payload(&[
        QuakeRow::new("2024p000001", 3.1),
        QuakeRow::new("2024p000002", 4.6),
    ])));

    let mut task = watcher(&source, &sink);
    let report = task.seed().await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.posted, 0);
    assert_eq!(task.state().len(), 2);
    assert!(sink.posts().is_empty());
}

#[tokio::test]
async fn new_quake_is_posted_and_threaded() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(RecordingSink::new());
    source.push_quakes(Ok(quake_payload(&[QuakeRow::new("2024p000001", 3.1)])));
    source.push_quakes(Ok(quake_payload(&[
        QuakeRow::new("2024p000001", 3.1),
        QuakeRow::new("2024p000002", 4.6),
    ])));

    let mut task = watcher(&source, &sink);
    task.seed().await.unwrap();
    let report = task.cycle().await.unwrap();

    assert_eq!(report.changes, 1);
    assert_eq!(report.posted, 1);

    let posts = sink.posts();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].text.starts_with("M4.6 quake"));
    assert!(posts[0].text.contains("https://www.geonet.org.nz/earthquake/2024p000002"));
    assert_eq!(posts[0].in_reply_to, None);

    let stored = task.state().get("2024p000002").unwrap();
    assert_eq!(stored.thread.as_ref().map(|t| t.as_str()), Some("post-1"));
}

#[tokio::test]
async fn update_replies_to_previous_post() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(RecordingSink::new());
    source.push_quakes(Ok(quake_payload(&[QuakeRow::new("2024p000001", 3.1)])));
    source.push_quakes(Ok(quake_payload(&[
        QuakeRow::new("2024p000001", 3.1),
        QuakeRow::new("2024p000002", 4.6),
    ])));
    source.push_quakes(Ok(quake_payload(&[
        QuakeRow::new("2024p000001", 3.1),
        QuakeRow::new("2024p000002", 4.9),
    ])));

    let mut task = watcher(&source, &sink);
    task.seed().await.unwrap();
    task.cycle().await.unwrap();
    let report = task.cycle().await.unwrap();

    assert_eq!(report.changes, 1);
    let posts = sink.posts();
    assert_eq!(posts.len(), 2);
    assert!(posts[1].text.starts_with("Updated: M4.9 quake"));
    assert_eq!(posts[1].in_reply_to.as_deref(), Some("post-1"));

    let stored = task.state().get("2024p000002").unwrap();
    assert_eq!(stored.magnitude, 4.9);
    assert_eq!(stored.thread.as_ref().map(|t| t.as_str()), Some("post-2"));
}

#[tokio::test]
async fn quality_only_revision_is_not_posted() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(RecordingSink::new());
    source.push_quakes(Ok(quake_payload(&[QuakeRow::new("2024p000001", 3.1)])));
    source.push_quakes(Ok(quake_payload(&[
        QuakeRow::new("2024p000001", 3.1).quality("best")
    ])));

    let mut task = watcher(&source, &sink);
    task.seed().await.unwrap();
    let report = task.cycle().await.unwrap();

    assert_eq!(report.changes, 0);
    assert!(sink.posts().is_empty());
}

#[tokio::test]
async fn failed_post_leaves_thread_unset() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(RecordingSink::new());
    source.push_quakes(Ok(quake_payload(&[QuakeRow::new("2024p000001", 3.1)])));
    source.push_quakes(Ok(quake_payload(&[
        QuakeRow::new("2024p000001", 3.1),
        QuakeRow::new("2024p000002", 4.6),
    ])));
    source.push_quakes(Ok(quake_payload(&[
        QuakeRow::new("2024p000001", 3.1),
        QuakeRow::new("2024p000002", 4.8),
    ])));

    let mut task = watcher(&source, &sink);
    task.seed().await.unwrap();

    sink.fail_next(1);
    let report = task.cycle().await.unwrap();
    assert_eq!(report.post_failures, 1);
    assert_eq!(report.posted, 0);
    assert!(task.state().get("2024p000002").unwrap().thread.is_none());

    // The record is retained, so the next revision is an update posted
    // without a parent.
    let report = task.cycle().await.unwrap();
    assert_eq!(report.posted, 1);
    let posts = sink.posts();
    assert!(posts[1].text.starts_with("Updated: "));
    assert_eq!(posts[1].in_reply_to, None);
}

#[tokio::test]
async fn failed_update_post_keeps_prior_thread() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(RecordingSink::new());
    source.push_quakes(Ok(quake_payload(&[QuakeRow::new("2024p000001", 3.1)])));
    source.push_quakes(Ok(quake_payload(&[QuakeRow::new("2024p000001", 3.4)])));
    source.push_quakes(Ok(quake_payload(&[QuakeRow::new("2024p000001", 3.6)])));

    let mut task = watcher(&source, &sink);
    task.seed().await.unwrap();

    // Seeded records have no thread yet; the first update posts unthreaded.
    task.cycle().await.unwrap();
    assert_eq!(
        task.state()
            .get("2024p000001")
            .and_then(|r| r.thread.as_ref())
            .map(|t| t.as_str()),
        Some("post-1")
    );

    sink.fail_next(1);
    task.cycle().await.unwrap();
    let stored = task.state().get("2024p000001").unwrap();
    assert_eq!(stored.magnitude, 3.6);
    assert_eq!(stored.thread.as_ref().map(|t| t.as_str()), Some("post-1"));
}

#[tokio::test]
async fn updates_can_be_suppressed() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(RecordingSink::new());
    source.push_quakes(Ok(quake_payload(&[QuakeRow::new("2024p000001", 3.1)])));
    source.push_quakes(Ok(quake_payload(&[
        QuakeRow::new("2024p000001", 3.3),
        QuakeRow::new("2024p000002", 4.6),
    ])));

    let config = QuakeConfig {
        post_updates: false,
        ..QuakeConfig::default()
    };
    let mut task = watcher_with(&source, &sink, config);
    task.seed().await.unwrap();
    let report = task.cycle().await.unwrap();

    assert_eq!(report.changes, 2);
    assert_eq!(report.suppressed, 1);
    assert_eq!(report.posted, 1);
    let posts = sink.posts();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].text.starts_with("M4.6 quake"));
    // Suppressed updates still refresh the retained fields.
    assert_eq!(task.state().get("2024p000001").unwrap().magnitude, 3.3);
}

#[tokio::test]
async fn later_fetch_failure_leaves_state_untouched() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(RecordingSink::new());
    source.push_quakes(Ok(quake_payload(&[
        QuakeRow::new("2024p000001", 3.1),
        QuakeRow::new("2024p000002", 4.6),
    ])));
    source.push_quakes(Err(FeedError::Status(502)));
    source.push_quakes(Ok("not json".to_string()));

    let mut task = watcher(&source, &sink);
    task.seed().await.unwrap();

    assert!(matches!(task.cycle().await, Err(FeedError::Status(502))));
    assert!(matches!(task.cycle().await, Err(FeedError::Shape(_))));
    assert_eq!(task.state().len(), 2);
    assert!(sink.posts().is_empty());
    assert_eq!(source.quake_fetches(), 3);
}

#[tokio::test]
async fn retained_state_is_bounded() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(RecordingSink::new());
    source.push_quakes(Ok(quake_payload(&[
        QuakeRow::new("2024p000001", 3.1).at("2024-03-01T08:00:00Z"),
        QuakeRow::new("2024p000002", 3.2).at("2024-03-01T09:00:00Z"),
    ])));
    source.push_quakes(Ok(quake_payload(&[
        QuakeRow::new("2024p000003", 3.3).at("2024-03-01T10:00:00Z")
    ])));

    let config = QuakeConfig {
        retain_limit: 2,
        ..QuakeConfig::default()
    };
    let mut task = watcher_with(&source, &sink, config);
    task.seed().await.unwrap();
    let report = task.cycle().await.unwrap();

    assert_eq!(report.evicted, 1);
    assert_eq!(task.state().len(), 2);
    assert!(!task.state().contains("2024p000001"));
    assert!(task.state().contains("2024p000003"));
}

#[tokio::test]
async fn event_evicted_on_arrival_is_not_posted() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(RecordingSink::new());
    source.push_quakes(Ok(quake_payload(&[
        QuakeRow::new("2024p000002", 3.2).at("2024-03-01T09:00:00Z"),
        QuakeRow::new("2024p000003", 3.3).at("2024-03-01T10:00:00Z"),
    ])));
    let late_arrival = || {
        quake_payload(&[
            QuakeRow::new("2024p000001", 3.1).at("2024-03-01T08:00:00Z"),
            QuakeRow::new("2024p000002", 3.2).at("2024-03-01T09:00:00Z"),
            QuakeRow::new("2024p000003", 3.3).at("2024-03-01T10:00:00Z"),
        ])
    };
    source.push_quakes(Ok(late_arrival()));
    source.push_quakes(Ok(late_arrival()));

    let config = QuakeConfig {
        retain_limit: 2,
        ..QuakeConfig::default()
    };
    let mut task = watcher_with(&source, &sink, config);
    task.seed().await.unwrap();

    for _ in 0..2 {
        let report = task.cycle().await.unwrap();
        assert_eq!(report.changes, 1);
        assert_eq!(report.evicted, 1);
        assert_eq!(report.suppressed, 1);
        assert_eq!(report.posted, 0);
    }
    assert!(sink.posts().is_empty());
    assert!(!task.state().contains("2024p000001"));
}
