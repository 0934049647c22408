use grants_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("grant not found: {0}")]
    NotFound(String),

    #[error("response not found: {response_key} in grant {grant_id}")]
    ResponseNotFound {
        grant_id: String,
        response_key: String,
    },

    #[error("no grants in dataset")]
    EmptyDataset,
}

/// Failure to produce a repository from the dataset artifact. Nothing is exposed
/// to readers when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to fetch grants data: {0}")]
    Fetch(#[from] CommonError),

    #[error("grants data is not valid: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate grant id: {0}")]
    DuplicateGrant(String),

    #[error("grant under key '{key}' declares id '{id}'")]
    IdMismatch { key: String, id: String },

    #[error("grant {grant_id} has invalid config: {message}")]
    InvalidConfig { grant_id: String, message: String },
}

impl LoadError {
    /// Message shown to the user in place of the dataset.
    pub fn user_message(&self) -> String {
        format!(
            "Failed to load grants data ({self}). Make sure the dataset has been built and is valid JSON, then reload."
        )
    }
}

/// Malformed counts or limits on a single response. This is a defect in the
/// dataset and is reported per response, never coerced into a status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMetricError {
    #[error("{field} must not be negative (got {value})")]
    NegativeCount { field: &'static str, value: i64 },

    #[error("{field} must be positive when set (got {value})")]
    NonPositiveLimit { field: &'static str, value: i64 },
}
