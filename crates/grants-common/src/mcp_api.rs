use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetGrantParams {
    /// Grant identifier such as "nsf-cssi". Omit to open the default grant.
    pub grant_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetResponseParams {
    /// Grant identifier such as "nsf-cssi".
    pub grant_id: String,
    /// Response key within the grant, as listed by get_grant.
    pub response_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GrantSummaryView {
    pub id: String,
    pub name: String,
    pub foundation: String,
    pub status: String,
    pub response_count: usize,
    pub over_limit_count: usize,
    pub needs_completion_count: usize,
    pub invalid_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListGrantsResponse {
    /// Grants in dataset order.
    pub grants: Vec<GrantSummaryView>,
    /// The grant opened when no identifier is given. `None` for an empty dataset.
    pub default_grant: Option<String>,
    /// SHA-256 of the loaded artifact.
    pub fingerprint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GrantHeaderView {
    pub name: String,
    pub foundation: String,
    pub program: Option<String>,
    /// e.g. "$1,250,000"
    pub amount_requested: Option<String>,
    /// e.g. "3 years"
    pub duration: Option<String>,
    pub deadline: Option<String>,
    pub status: String,
    pub status_label: String,
    /// One of "done", "active", "idle", "pending".
    pub status_tone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExternalLinksView {
    pub solicitation_url: Option<String>,
    pub repository_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseCardView {
    pub key: String,
    pub title: String,
    /// "over_limit", "needs_completion", "complete", or "invalid".
    pub status: String,
    pub status_label: String,
    /// e.g. "450 / 500 words", "200 / 1,000 chars", "10 words".
    pub limit_text: String,
    /// Unclamped percentage of the governing limit; 0 when no limit applies.
    pub percentage: f64,
    /// e.g. "104.0%". `None` when no limit applies.
    pub percentage_text: Option<String>,
    /// Progress bar fill in [0, 100].
    pub progress_width: f64,
    /// One of "normal", "warning", "over". `None` when no limit applies.
    pub progress_tier: Option<String>,
    pub over_limit: bool,
    pub needs_completion: bool,
    /// "application" or "report" when the dataset records it.
    pub kind: Option<String>,
    pub report_period: Option<String>,
    /// Set when the response's metrics are malformed in the dataset.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GrantDetailResponse {
    pub id: String,
    pub header: GrantHeaderView,
    pub links: ExternalLinksView,
    pub responses: Vec<ResponseCardView>,
    pub report_periods: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseDetailResponse {
    pub grant_id: String,
    pub card: ResponseCardView,
    pub question: Option<String>,
    /// Text to place on the clipboard.
    pub plain_text: String,
    pub file: Option<String>,
    /// Export format to path, e.g. "pdf" -> "exports/nsf-cssi/summary.pdf".
    pub exports: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReloadGrantsResponse {
    pub grant_count: usize,
    pub fingerprint: String,
    pub default_grant: Option<String>,
}
