//! Mastodon status posting.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use geowatch_types::ThreadHandle;
use serde::{Deserialize, Serialize};

use crate::error::PostError;
use crate::sink::NotificationSink;

/// Timeout for a single status post.
const POST_TIMEOUT: Duration = Duration::from_secs(30);

/// Mastodon status visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
    Direct,
}

#[derive(Serialize)]
struct StatusRequest<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_reply_to_id: Option<&'a str>,
    visibility: Visibility,
}

#[derive(Deserialize)]
struct StatusResponse {
    id: String,
}

/// Posts notifications as statuses on a Mastodon instance.
#[derive(Clone)]
pub struct MastodonSink {
    http: reqwest::Client,
    statuses_url: String,
    access_token: String,
    visibility: Visibility,
}

impl fmt::Debug for MastodonSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MastodonSink")
            .field("statuses_url", &self.statuses_url)
            .field("access_token", &"[REDACTED]")
            .field("visibility", &self.visibility)
            .finish()
    }
}

impl MastodonSink {
    /// Creates a sink for `instance_url` authenticated with `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Config`] if the token is empty, or
    /// [`PostError::Http`] if the HTTP client cannot be built.
    pub fn new(
        instance_url: &str,
        access_token: impl Into<String>,
        visibility: Visibility,
        user_agent: &str,
    ) -> Result<Self, PostError> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(PostError::Config("mastodon access token is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(POST_TIMEOUT)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            http,
            statuses_url: format!("{}/api/v1/statuses", instance_url.trim_end_matches('/')),
            access_token,
            visibility,
        })
    }
}

#[async_trait]
impl NotificationSink for MastodonSink {
    async fn post(
        &self,
        text: &str,
        in_reply_to: Option<&ThreadHandle>,
    ) -> Result<ThreadHandle, PostError> {
        let body = StatusRequest {
            status: text,
            in_reply_to_id: in_reply_to.map(ThreadHandle::as_str),
            visibility: self.visibility,
        };
        let resp = self
            .http
            .post(&self.statuses_url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PostError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        let created: StatusResponse = resp.json().await?;
        tracing::debug!(id = %created.id, "posted status");
        Ok(ThreadHandle::new(created.id))
    }
}
