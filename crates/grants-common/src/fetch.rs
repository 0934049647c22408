use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::error::CommonError;

/// Where the dataset artifact lives. Anything that is not an `http(s)` URL is
/// treated as a local filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Http(String),
    File(PathBuf),
}

impl DataSource {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            DataSource::Http(trimmed.to_string())
        } else {
            DataSource::File(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Http(url) => f.write_str(url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FetchClientConfig {
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub max_error_body_bytes: usize,
}

impl Default for FetchClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            max_error_body_bytes: 8 * 1024,
        }
    }
}

/// One-shot fetcher for the dataset artifact. Never retries: a failed fetch is
/// reported to the caller, who decides whether to try again.
#[derive(Clone)]
pub struct FetchClient {
    config: FetchClientConfig,
    http: reqwest::Client,
}

impl FetchClient {
    pub fn new(config: FetchClientConfig) -> Result<Self, CommonError> {
        let http = reqwest::Client::builder()
            .user_agent("grant-viewer")
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &FetchClientConfig {
        &self.config
    }

    /// Fetch the raw bytes of `source`.
    pub async fn fetch(&self, source: &DataSource) -> Result<Vec<u8>, CommonError> {
        let work = async {
            match source {
                DataSource::Http(url) => self.fetch_http(url).await,
                DataSource::File(path) => read_file(path).await,
            }
        };
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| CommonError::Timeout(limit))?,
            None => work.await,
        }
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, CommonError> {
        debug!(url, "fetching dataset over http");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = read_limited_text(resp, self.config.max_error_body_bytes).await;
            return Err(CommonError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, CommonError> {
    debug!(path = %path.display(), "reading dataset from disk");
    tokio::fs::read(path).await.map_err(|source| CommonError::Io {
        path: path.display().to_string(),
        source,
    })
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    let mut stream = resp.bytes_stream();
    let mut buf: Vec<u8> = Vec::new();
    while let Some(next) = stream.next().await {
        match next {
            Ok(chunk) => {
                let room = max_bytes.saturating_sub(buf.len());
                buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
                if buf.len() >= max_bytes {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to read error body");
                return "<failed to read error body>".to_string();
            }
        }
    }
    let text = String::from_utf8_lossy(&buf).trim().to_string();
    if text.is_empty() {
        "<empty body>".to_string()
    } else {
        text
    }
}
