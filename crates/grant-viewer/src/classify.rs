/// Response status model.
///
/// A response is judged against at most one limit. The word limit governs when
/// present, otherwise the character limit, otherwise nothing does. Over-limit
/// beats needs-completion, which beats complete.
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::InvalidMetricError;
use crate::model::Response;

/// Placeholders the builder leaves in unfinished drafts.
static DRAFT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:NEEDS )?TO BE COMPLETED\]").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoverningUnit {
    Words,
    Characters,
}

impl GoverningUnit {
    pub fn label(&self) -> &'static str {
        match self {
            GoverningUnit::Words => "words",
            GoverningUnit::Characters => "chars",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoverningLimit {
    pub unit: GoverningUnit,
    pub count: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    OverLimit,
    NeedsCompletion,
    Complete,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::OverLimit => "over_limit",
            ResponseStatus::NeedsCompletion => "needs_completion",
            ResponseStatus::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSignal {
    Done,
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub governing: Option<GoverningLimit>,
    pub word_count: u64,
    pub char_count: u64,
    /// 0 when no word limit is set.
    pub word_percentage: f64,
    /// 0 when no character limit is set.
    pub char_percentage: f64,
    /// Percentage of the governing limit, unclamped.
    pub percentage: f64,
    pub status: ResponseStatus,
}

impl Classification {
    pub fn over_limit(&self) -> bool {
        self.status == ResponseStatus::OverLimit
    }

    pub fn needs_completion(&self) -> bool {
        self.status == ResponseStatus::NeedsCompletion
    }
}

pub fn classify(response: &Response) -> Result<Classification, InvalidMetricError> {
    let word_count = count("wordCount", response.word_count)?;
    let char_count = count("charCount", response.char_count)?;
    let word_limit = response
        .word_limit
        .map(|v| limit("wordLimit", v))
        .transpose()?;
    let char_limit = response
        .char_limit
        .map(|v| limit("charLimit", v))
        .transpose()?;

    let governing = match (word_limit, char_limit) {
        (Some(limit), _) => Some(GoverningLimit {
            unit: GoverningUnit::Words,
            count: word_count,
            limit,
        }),
        (None, Some(limit)) => Some(GoverningLimit {
            unit: GoverningUnit::Characters,
            count: char_count,
            limit,
        }),
        (None, None) => None,
    };

    let over_limit = governing.is_some_and(|g| g.count > g.limit);
    let status = if over_limit {
        ResponseStatus::OverLimit
    } else if completion_signal(response) == CompletionSignal::Incomplete {
        ResponseStatus::NeedsCompletion
    } else {
        ResponseStatus::Complete
    };

    Ok(Classification {
        governing,
        word_count,
        char_count,
        word_percentage: word_limit.map_or(0.0, |l| percent(word_count, l)),
        char_percentage: char_limit.map_or(0.0, |l| percent(char_count, l)),
        percentage: governing.map_or(0.0, |g| percent(g.count, g.limit)),
        status,
    })
}

/// The dataset's own verdict on whether an answer is finished. Checked in order:
/// the explicit flag, the builder's status label, then draft placeholders in the
/// text. Never derived from length.
pub fn completion_signal(response: &Response) -> CompletionSignal {
    if let Some(flag) = response.needs_completion {
        return if flag {
            CompletionSignal::Incomplete
        } else {
            CompletionSignal::Done
        };
    }
    match response.status_label.as_deref().map(str::trim) {
        Some("needs_completion") | Some("needs_input") => return CompletionSignal::Incomplete,
        Some("complete") => return CompletionSignal::Done,
        _ => {}
    }
    if DRAFT_MARKER.is_match(&response.plain_text) {
        CompletionSignal::Incomplete
    } else {
        CompletionSignal::Done
    }
}

fn count(field: &'static str, value: i64) -> Result<u64, InvalidMetricError> {
    u64::try_from(value).map_err(|_| InvalidMetricError::NegativeCount { field, value })
}

fn limit(field: &'static str, value: i64) -> Result<u64, InvalidMetricError> {
    if value <= 0 {
        return Err(InvalidMetricError::NonPositiveLimit { field, value });
    }
    Ok(value as u64)
}

fn percent(count: u64, limit: u64) -> f64 {
    (count as f64 * 100.0) / limit as f64
}
