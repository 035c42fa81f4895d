//! Raw feed retrieval.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::FeedError;

/// Production GeoNet API root.
pub const DEFAULT_BASE_URL: &str = "https://api.geonet.org.nz";

/// User agent sent with every feed request.
pub const DEFAULT_USER_AGENT: &str = "geowatch/0.0.1 (hazard notification bot)";

const GEOJSON_ACCEPT: &str = "application/vnd.geo+json;version=2";

/// A source of raw hazard-feed payloads.
///
/// Implementations return the response body untouched so that callers can
/// persist exactly what the feed published.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetches the quake feed, limited to events at or above `min_intensity`.
    async fn fetch_quakes(&self, min_intensity: i32) -> Result<String, FeedError>;

    /// Fetches the volcanic alert level feed.
    async fn fetch_volcanoes(&self) -> Result<String, FeedError>;
}

/// HTTP client for the GeoNet API.
#[derive(Debug, Clone)]
pub struct GeoNetClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeoNetClient {
    /// Builds a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the TLS backend cannot be initialised.
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the quake endpoint.
    pub fn quake_url(&self, min_intensity: i32) -> String {
        format!("{}/quake?MMI={}", self.base_url, min_intensity)
    }

    /// URL of the volcanic alert level endpoint.
    pub fn volcano_url(&self) -> String {
        format!("{}/volcano/val", self.base_url)
    }

    async fn get_text(&self, url: &str) -> Result<String, FeedError> {
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, GEOJSON_ACCEPT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        tracing::debug!(url, bytes = body.len(), "fetched feed payload");
        Ok(body)
    }
}

#[async_trait]
impl FeedSource for GeoNetClient {
    async fn fetch_quakes(&self, min_intensity: i32) -> Result<String, FeedError> {
        self.get_text(&self.quake_url(min_intensity)).await
    }

    async fn fetch_volcanoes(&self) -> Result<String, FeedError> {
        self.get_text(&self.volcano_url()).await
    }
}
