use tracing::warn;

use grants_common::mcp_api::{
    ExternalLinksView, GrantDetailResponse, GrantHeaderView, GrantSummaryView,
    ResponseCardView, ResponseDetailResponse,
};

use crate::classify::{classify, Classification};
use crate::model::{Grant, GrantConfig, GrantStatus, Response};
use crate::repository::GrantSummary;

const WARNING_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTier {
    Normal,
    Warning,
    Over,
}

impl ProgressTier {
    pub fn for_percentage(percentage: f64) -> Self {
        if percentage > 100.0 {
            ProgressTier::Over
        } else if percentage > WARNING_THRESHOLD {
            ProgressTier::Warning
        } else {
            ProgressTier::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressTier::Normal => "normal",
            ProgressTier::Warning => "warning",
            ProgressTier::Over => "over",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Done,
    Active,
    Idle,
    Pending,
}

impl StatusTone {
    pub fn for_status(status: &GrantStatus) -> Self {
        match status {
            GrantStatus::Submitted | GrantStatus::Completed => StatusTone::Done,
            GrantStatus::Active => StatusTone::Active,
            GrantStatus::Draft => StatusTone::Idle,
            GrantStatus::InProgress | GrantStatus::Other(_) => StatusTone::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTone::Done => "done",
            StatusTone::Active => "active",
            StatusTone::Idle => "idle",
            StatusTone::Pending => "pending",
        }
    }
}

/// `1234567` -> `"1,234,567"`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_amount(amount: f64) -> String {
    let whole = amount.trunc();
    let cents = ((amount - whole) * 100.0).round() as u64;
    if cents == 0 {
        format!("${}", format_count(whole as u64))
    } else if cents == 100 {
        format!("${}", format_count(whole as u64 + 1))
    } else {
        format!("${}.{cents:02}", format_count(whole as u64))
    }
}

pub fn format_duration(years: f64) -> String {
    if years == 1.0 {
        "1 year".to_string()
    } else {
        format!("{years} years")
    }
}

/// `"in_progress"` -> `"in progress"`.
pub fn humanize(label: &str) -> String {
    label.replace('_', " ")
}

/// `"450 / 500 words"`, `"200 / 1,000 chars"`, or `"10 words"` when nothing governs.
pub fn limit_text(classification: &Classification) -> String {
    match classification.governing {
        Some(g) => format!(
            "{} / {} {}",
            format_count(g.count),
            format_count(g.limit),
            g.unit.label()
        ),
        None => format!("{} words", format_count(classification.word_count)),
    }
}

/// One decimal place, unclamped. `None` when no limit governs.
pub fn percentage_text(classification: &Classification) -> Option<String> {
    classification
        .governing
        .map(|_| format!("{:.1}%", classification.percentage))
}

/// Fill width for a progress bar; the only place a percentage is clamped.
pub fn progress_width(percentage: f64) -> f64 {
    percentage.clamp(0.0, 100.0)
}

pub fn response_card(key: &str, response: &Response) -> ResponseCardView {
    let kind = response.kind.map(|k| k.as_str().to_string());
    let report_period = response.report_period.clone();
    match classify(response) {
        Ok(c) => ResponseCardView {
            key: key.to_string(),
            title: response.title.clone(),
            status: c.status.as_str().to_string(),
            status_label: humanize(c.status.as_str()),
            limit_text: limit_text(&c),
            percentage: c.percentage,
            percentage_text: percentage_text(&c),
            progress_width: progress_width(c.percentage),
            progress_tier: c
                .governing
                .map(|_| ProgressTier::for_percentage(c.percentage).as_str().to_string()),
            over_limit: c.over_limit(),
            needs_completion: c.needs_completion(),
            kind,
            report_period,
            error: None,
        },
        Err(e) => {
            warn!(response_key = key, error = %e, "invalid response metrics");
            ResponseCardView {
                key: key.to_string(),
                title: response.title.clone(),
                status: "invalid".to_string(),
                status_label: "invalid".to_string(),
                limit_text: "metrics unavailable".to_string(),
                percentage: 0.0,
                percentage_text: None,
                progress_width: 0.0,
                progress_tier: None,
                over_limit: false,
                needs_completion: false,
                kind,
                report_period,
                error: Some(e.to_string()),
            }
        }
    }
}

pub fn grant_header(config: &GrantConfig) -> GrantHeaderView {
    GrantHeaderView {
        name: config.name.clone(),
        foundation: config.foundation.clone(),
        program: config.program.clone(),
        amount_requested: config.amount_requested.map(format_amount),
        duration: config.grant_duration_years.map(format_duration),
        deadline: config.deadline.clone(),
        status: config.status.as_str().to_string(),
        status_label: humanize(config.status.as_str()),
        status_tone: StatusTone::for_status(&config.status).as_str().to_string(),
    }
}

pub fn grant_detail(grant: &Grant) -> GrantDetailResponse {
    GrantDetailResponse {
        id: grant.id.clone(),
        header: grant_header(&grant.config),
        links: ExternalLinksView {
            solicitation_url: grant.solicitation_url().map(str::to_string),
            repository_url: grant.repository_url().map(str::to_string),
        },
        responses: grant
            .responses()
            .map(|(key, response)| response_card(key, response))
            .collect(),
        report_periods: grant.report_periods(),
    }
}

pub fn response_detail(grant_id: &str, key: &str, response: &Response) -> ResponseDetailResponse {
    ResponseDetailResponse {
        grant_id: grant_id.to_string(),
        card: response_card(key, response),
        question: response.question().map(str::to_string),
        plain_text: response.plain_text.clone(),
        file: response.file.clone(),
        exports: response.exports.clone().unwrap_or_default(),
    }
}

pub fn grant_summary(summary: GrantSummary) -> GrantSummaryView {
    GrantSummaryView {
        id: summary.id,
        name: summary.name,
        foundation: summary.foundation,
        status: summary.status.as_str().to_string(),
        response_count: summary.response_count,
        over_limit_count: summary.over_limit,
        needs_completion_count: summary.needs_completion,
        invalid_count: summary.invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;

    #[test]
    fn counts_get_thousands_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn amounts_and_durations() {
        assert_eq!(format_amount(600000.0), "$600,000");
        assert_eq!(format_amount(1250.5), "$1,250.50");
        assert_eq!(format_amount(0.0), "$0");
        assert_eq!(format_duration(3.0), "3 years");
        assert_eq!(format_duration(1.0), "1 year");
        assert_eq!(format_duration(1.5), "1.5 years");
    }

    #[test]
    fn limit_text_per_unit() {
        let words = classify(&fixtures::response(450, Some(500))).expect("valid");
        assert_eq!(limit_text(&words), "450 / 500 words");
        assert_eq!(percentage_text(&words).as_deref(), Some("90.0%"));

        let mut r = fixtures::response(40, None);
        r.char_count = 200;
        r.char_limit = Some(1000);
        let chars = classify(&r).expect("valid");
        assert_eq!(limit_text(&chars), "200 / 1,000 chars");
        assert_eq!(percentage_text(&chars).as_deref(), Some("20.0%"));

        let none = classify(&fixtures::response(1200, None)).expect("valid");
        assert_eq!(limit_text(&none), "1,200 words");
        assert_eq!(percentage_text(&none), None);
    }

    #[test]
    fn over_limit_card_shows_unclamped_number() {
        let mut r = fixtures::response(0, None);
        r.char_count = 1423;
        r.char_limit = Some(1000);
        let card = response_card("summary", &r);
        assert_eq!(card.status, "over_limit");
        assert_eq!(card.status_label, "over limit");
        assert_eq!(card.percentage_text.as_deref(), Some("142.3%"));
        assert_eq!(card.progress_width, 100.0);
        assert_eq!(card.progress_tier.as_deref(), Some("over"));
        assert!(card.over_limit);
        assert!(!card.needs_completion);
    }

    #[test]
    fn progress_tiers() {
        assert_eq!(ProgressTier::for_percentage(80.0), ProgressTier::Normal);
        assert_eq!(ProgressTier::for_percentage(80.1), ProgressTier::Warning);
        assert_eq!(ProgressTier::for_percentage(100.0), ProgressTier::Warning);
        assert_eq!(ProgressTier::for_percentage(104.0), ProgressTier::Over);
        assert_eq!(progress_width(42.5), 42.5);
    }

    #[test]
    fn invalid_metrics_render_distinctly() {
        let card = response_card("broken", &fixtures::response(-5, Some(100)));
        assert_eq!(card.status, "invalid");
        assert!(card.error.as_deref().is_some_and(|e| e.contains("wordCount")));
        assert_ne!(card.status, "complete");
        assert!(!card.over_limit && !card.needs_completion);
    }

    #[test]
    fn header_labels_and_tones() {
        let mut config = fixtures::grant("g", "G").config;
        config.status = GrantStatus::InProgress;
        config.amount_requested = Some(1_250_000.0);
        config.grant_duration_years = Some(2.0);
        let header = grant_header(&config);
        assert_eq!(header.status_label, "in progress");
        assert_eq!(header.status_tone, "pending");
        assert_eq!(header.amount_requested.as_deref(), Some("$1,250,000"));
        assert_eq!(header.duration.as_deref(), Some("2 years"));

        assert_eq!(StatusTone::for_status(&GrantStatus::Submitted), StatusTone::Done);
        assert_eq!(StatusTone::for_status(&GrantStatus::Completed), StatusTone::Done);
        assert_eq!(StatusTone::for_status(&GrantStatus::Active), StatusTone::Active);
        assert_eq!(StatusTone::for_status(&GrantStatus::Draft), StatusTone::Idle);

        config.status = GrantStatus::Other("under_review".to_string());
        let header = grant_header(&config);
        assert_eq!(header.status, "under_review");
        assert_eq!(header.status_label, "under review");
        assert_eq!(header.status_tone, "pending");
    }

    #[test]
    fn response_detail_carries_copy_text() {
        let mut r = fixtures::response(3, Some(500));
        r.plain_text = "We build tools.".to_string();
        r.question = Some("Summarize the project.".to_string());
        let detail = response_detail("nsf-cssi", "summary", &r);
        assert_eq!(detail.plain_text, "We build tools.");
        assert_eq!(detail.question.as_deref(), Some("Summarize the project."));
        assert!(detail.exports.is_empty());
        assert_eq!(detail.card.status, "complete");
    }
}
