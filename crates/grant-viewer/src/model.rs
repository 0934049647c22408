use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ordered::OrderedMap;

/// One funding application as written by the dataset builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    /// Stable identifier; equals the key the grant is stored under. Filled from
    /// that key when the record omits it.
    #[serde(default)]
    pub id: String,
    pub config: GrantConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GrantMetadata>,
    /// `None` means the record carries no responses to render.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<OrderedMap<Response>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<ResponseGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports: Option<Vec<ReportPeriod>>,
}

impl Grant {
    /// Responses in dataset order.
    pub fn responses(&self) -> impl Iterator<Item = (&str, &Response)> {
        self.responses.iter().flat_map(|r| r.iter())
    }

    pub fn response(&self, key: &str) -> Option<&Response> {
        self.responses.as_ref()?.get(key)
    }

    pub fn response_count(&self) -> usize {
        self.responses.as_ref().map_or(0, OrderedMap::len)
    }

    /// `solicitation_url`, falling back to `portal_url`.
    pub fn solicitation_url(&self) -> Option<&str> {
        let meta = self.metadata.as_ref()?.metadata.as_ref()?;
        string_field(meta, "solicitation_url").or_else(|| string_field(meta, "portal_url"))
    }

    pub fn repository_url(&self) -> Option<&str> {
        let links = self.metadata.as_ref()?.links.as_ref()?;
        string_field(links, "repo")
    }

    pub fn report_periods(&self) -> Vec<String> {
        self.reports
            .iter()
            .flatten()
            .map(|r| r.period.clone())
            .collect()
    }
}

fn string_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantConfig {
    pub name: String,
    pub foundation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_requested: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_duration_years: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub status: GrantStatus,
}

impl GrantConfig {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(amount) = self.amount_requested {
            if !amount.is_finite() || amount < 0.0 {
                return Err(format!("amount_requested must be non-negative (got {amount})"));
            }
        }
        if let Some(years) = self.grant_duration_years {
            if !years.is_finite() || years <= 0.0 {
                return Err(format!("grant_duration_years must be positive (got {years})"));
            }
        }
        Ok(())
    }
}

/// Lifecycle label of a grant. Labels outside the known set are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    Draft,
    InProgress,
    Submitted,
    Active,
    Completed,
    #[serde(untagged)]
    Other(String),
}

impl GrantStatus {
    pub fn as_str(&self) -> &str {
        match self {
            GrantStatus::Draft => "draft",
            GrantStatus::InProgress => "in_progress",
            GrantStatus::Submitted => "submitted",
            GrantStatus::Active => "active",
            GrantStatus::Completed => "completed",
            GrantStatus::Other(label) => label,
        }
    }
}

/// Free-form descriptive info from the grant's own metadata file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GrantMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Map<String, Value>>,
}

/// Application questions kept apart from reporting periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<OrderedMap<Response>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<OrderedMap<Response>>,
}

/// One answer to an application question.
///
/// Derived values the builder also writes (`overLimit`, `wordPercentage`, ...)
/// are ignored on read; the classifier recomputes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub plain_text: String,
    pub word_count: i64,
    pub char_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_limit: Option<i64>,
    /// Explicit completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_completion: Option<bool>,
    /// Status label as written by the builder, e.g. "needs_input".
    #[serde(default, rename = "status", skip_serializing_if = "Option::is_none")]
    pub status_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ResponseKind>,
    #[serde(default, rename = "report_period", skip_serializing_if = "Option::is_none")]
    pub report_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<BTreeMap<String, String>>,
}

impl Response {
    /// The prompt, treating an empty string as absent.
    pub fn question(&self) -> Option<&str> {
        self.question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    /// Word and character counts of `plain_text`, measured the way the builder
    /// measures them: whitespace-separated words and Unicode scalar values.
    pub fn measured_counts(&self) -> (usize, usize) {
        (
            self.plain_text.split_whitespace().count(),
            self.plain_text.chars().count(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Application,
    Report,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Application => "application",
            ResponseKind::Report => "report",
        }
    }
}
