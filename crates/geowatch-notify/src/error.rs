use thiserror::Error;

/// A notification could not be posted.
///
/// Post failures are never fatal: the caller logs them and moves on
/// without a thread handle for the affected entity.
#[derive(Error, Debug)]
pub enum PostError {
    #[error("post request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("post rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid sink configuration: {0}")]
    Config(String),
}
