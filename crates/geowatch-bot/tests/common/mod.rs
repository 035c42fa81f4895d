//! Scripted feed source, recording sink, and payload builders shared by
//! the watcher tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono_tz::Tz;
use geowatch_feed::{FeedError, FeedSource};
use geowatch_notify::{NotificationSink, PostError};
use geowatch_types::ThreadHandle;
use serde_json::{json, Value};

pub fn nz() -> Tz {
    chrono_tz::Pacific::Auckland
}

/// Feed source that replays queued responses, one per fetch.
///
/// Once a queue is drained every further fetch fails with HTTP 503.
#[derive(Default)]
pub struct ScriptedSource {
    quakes: Mutex<VecDeque<Result<String, FeedError>>>,
    volcanoes: Mutex<VecDeque<Result<String, FeedError>>>,
    quake_fetches: AtomicUsize,
    volcano_fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_quakes(&self, response: Result<String, FeedError>) {
        self.quakes.lock().unwrap().push_back(response);
    }

    pub fn push_volcanoes(&self, response: Result<String, FeedError>) {
        self.volcanoes.lock().unwrap().push_back(response);
    }

    pub fn quake_fetches(&self) -> usize {
        self.quake_fetches.load(Ordering::SeqCst)
    }

    pub fn volcano_fetches(&self) -> usize {
        self.volcano_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch_quakes(&self, _min_intensity: i32) -> Result<String, FeedError> {
        self.quake_fetches.fetch_add(1, Ordering::SeqCst);
        self.quakes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(FeedError::Status(503)))
    }

    async fn fetch_volcanoes(&self) -> Result<String, FeedError> {
        self.volcano_fetches.fetch_add(1, Ordering::SeqCst);
        self.volcanoes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(FeedError::Status(503)))
    }
}

/// One post seen by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub text: String,
    pub in_reply_to: Option<String>,
    pub handle: Option<String>,
}

/// Sink that records every post and can be told to fail.
#[derive(Default)]
pub struct RecordingSink {
    posts: Mutex<Vec<Post>>,
    fail_next: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` posts fail.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn post(
        &self,
        text: &str,
        in_reply_to: Option<&ThreadHandle>,
    ) -> Result<ThreadHandle, PostError> {
        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        let mut posts = self.posts.lock().unwrap();
        let handle = (!failing).then(|| format!("post-{}", posts.len() + 1));
        posts.push(Post {
            text: text.to_string(),
            in_reply_to: in_reply_to.map(|h| h.as_str().to_string()),
            handle: handle.clone(),
        });

        match handle {
            Some(id) => Ok(ThreadHandle::new(id)),
            None => Err(PostError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            }),
        }
    }
}

/// Minimal quake row for payload building.
pub struct QuakeRow<'a> {
    pub id: &'a str,
    pub magnitude: f64,
    pub time: &'a str,
    pub quality: &'a str,
}

impl<'a> QuakeRow<'a> {
    pub fn new(id: &'a str, magnitude: f64) -> Self {
        Self {
            id,
            magnitude,
            time: "2024-03-01T10:00:00.000Z",
            quality: "preliminary",
        }
    }

    pub fn at(mut self, time: &'a str) -> Self {
        self.time = time;
        self
    }

    pub fn quality(mut self, quality: &'a str) -> Self {
        self.quality = quality;
        self
    }

    fn to_feature(&self) -> Value {
        json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [174.78, -41.29] },
            "properties": {
                "publicID": self.id,
                "time": self.time,
                "depth": 22.4,
                "magnitude": self.magnitude,
                "mmi": 3,
                "locality": "15 km south-east of Wellington",
                "quality": self.quality
            }
        })
    }
}

pub fn quake_payload(rows: &[QuakeRow<'_>]) -> String {
    json!({
        "type": "FeatureCollection",
        "features": rows.iter().map(QuakeRow::to_feature).collect::<Vec<_>>()
    })
    .to_string()
}

pub fn volcano_payload(levels: &[(&str, &str, u32)]) -> String {
    let rows: Vec<_> = levels.iter().copied().map(Some).collect();
    volcano_payload_rows(&rows)
}

/// Like [`volcano_payload`], with `None` producing a feature that has no
/// title and so fails to normalize.
pub fn volcano_payload_rows(rows: &[Option<(&str, &str, u32)>]) -> String {
    let features: Vec<Value> = rows
        .iter()
        .map(|row| {
            let (id, title, level) = match row {
                Some((id, title, level)) => (*id, Value::from(*title), *level),
                None => ("aucklandvolcanicfield", Value::Null, 0),
            };
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [175.5, -39.2] },
                "properties": {
                    "acc": "Green",
                    "activity": "Minor volcanic unrest.",
                    "hazards": "Volcanic unrest hazards.",
                    "level": level,
                    "volcanoID": id,
                    "volcanoTitle": title
                }
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features }).to_string()
}
