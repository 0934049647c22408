/// Error types shared across the grant viewer crates.
///
/// These errors describe failures while reaching the dataset artifact (HTTP transport,
/// local filesystem, timeouts). Application-specific errors are defined in each binary
/// crate and wrap `CommonError` via `#[from]`.
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error! status: {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}
