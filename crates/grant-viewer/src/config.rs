use std::time::Duration;

use grants_common::fetch::{DataSource, FetchClientConfig};

use crate::error::AppError;

const DEFAULT_DATA_SOURCE: &str = "docs/grants_data.json";
const DEFAULT_GRANT: &str = "nsf-cssi";
const DEFAULT_MAX_ERROR_BODY_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Tcp(String),
    Http(String),
}

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path or `http(s)` URL of the grants JSON artifact.
    pub data_source: String,
    /// Grant opened when none is requested; falls back to the first grant.
    pub default_grant: String,
    /// `None` waits indefinitely for the artifact.
    pub fetch_timeout: Option<Duration>,
    pub max_error_body_bytes: usize,
    pub transport: Transport,
}

impl Config {
    /// Optional:
    /// - `GRANTS_DATA_SOURCE` (default: "docs/grants_data.json")
    /// - `GRANTS_DEFAULT_GRANT` (default: "nsf-cssi")
    /// - `GRANTS_FETCH_TIMEOUT_SECS` (default: no timeout)
    /// - `GRANTS_MAX_ERROR_BODY_BYTES` (default: 8192)
    /// - `MCP_TCP_LISTEN_ADDR` or `MCP_HTTP_LISTEN_ADDR` (default: stdio)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_source = var("GRANTS_DATA_SOURCE").unwrap_or_else(|| DEFAULT_DATA_SOURCE.to_string());
        let default_grant = var("GRANTS_DEFAULT_GRANT").unwrap_or_else(|| DEFAULT_GRANT.to_string());

        let fetch_timeout = match var("GRANTS_FETCH_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(parse_positive("GRANTS_FETCH_TIMEOUT_SECS", &raw)?)),
            None => None,
        };

        let max_error_body_bytes = match var("GRANTS_MAX_ERROR_BODY_BYTES") {
            Some(raw) => parse_positive("GRANTS_MAX_ERROR_BODY_BYTES", &raw)? as usize,
            None => DEFAULT_MAX_ERROR_BODY_BYTES,
        };

        let transport = match (var("MCP_TCP_LISTEN_ADDR"), var("MCP_HTTP_LISTEN_ADDR")) {
            (Some(_), Some(_)) => {
                return Err(AppError::Config(
                    "set only one of MCP_TCP_LISTEN_ADDR and MCP_HTTP_LISTEN_ADDR".to_string(),
                ))
            }
            (Some(addr), None) => Transport::Tcp(addr),
            (None, Some(addr)) => Transport::Http(addr),
            (None, None) => Transport::Stdio,
        };

        Ok(Self {
            data_source,
            default_grant,
            fetch_timeout,
            max_error_body_bytes,
            transport,
        })
    }

    pub fn data_source(&self) -> DataSource {
        DataSource::parse(&self.data_source)
    }

    pub fn fetch_config(&self) -> FetchClientConfig {
        FetchClientConfig {
            timeout: self.fetch_timeout,
            max_error_body_bytes: self.max_error_body_bytes,
        }
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, AppError> {
    raw.parse::<u64>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| AppError::Config(format!("{key} must be a positive integer (got '{raw}')")))
}
