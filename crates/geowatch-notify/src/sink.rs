use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use geowatch_types::ThreadHandle;

use crate::error::PostError;

/// Destination for rendered notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Posts `text`, optionally as a reply to an earlier post.
    ///
    /// Returns the handle of the new post, which continues the thread.
    async fn post(
        &self,
        text: &str,
        in_reply_to: Option<&ThreadHandle>,
    ) -> Result<ThreadHandle, PostError>;
}

/// Dry-run sink that writes notifications to the log.
///
/// Hands out sequential `dry-run-N` handles so threading can be followed
/// in the log output.
#[derive(Debug, Default)]
pub struct LogSink {
    next: AtomicU64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    async fn post(
        &self,
        text: &str,
        in_reply_to: Option<&ThreadHandle>,
    ) -> Result<ThreadHandle, PostError> {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = ThreadHandle::new(format!("dry-run-{n}"));
        tracing::info!(
            handle = %handle,
            in_reply_to = in_reply_to.map(ThreadHandle::as_str),
            "dry run post:\n{}",
            text
        );
        Ok(handle)
    }
}
