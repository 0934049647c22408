use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use grants_common::fetch::{DataSource, FetchClient};

use crate::classify::classify;
use crate::error::LoadError;
use crate::model::Grant;
use crate::ordered::OrderedMap;
use crate::repository::GrantRepository;

/// A fully validated dataset together with the digest of the bytes it came from.
#[derive(Debug)]
pub struct LoadedDataset {
    pub repository: GrantRepository,
    pub fingerprint: String,
}

/// Observable outcome of the one-shot load.
#[derive(Debug, Clone)]
pub enum LoadState {
    Pending,
    Loaded(Arc<LoadedDataset>),
    /// User-facing message.
    Failed(String),
}

/// Data-quality findings that do not stop a load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AuditReport {
    pub invalid_metrics: usize,
    pub count_drift: usize,
}

pub struct DatasetLoader {
    client: FetchClient,
    source: DataSource,
}

impl DatasetLoader {
    pub fn new(client: FetchClient, source: DataSource) -> Self {
        Self { client, source }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub async fn load(&self) -> Result<LoadedDataset, LoadError> {
        info!(source = %self.source, "loading grants data");
        let bytes = self.client.fetch(&self.source).await?;
        let dataset = parse_dataset(&bytes)?;
        let report = audit(&dataset.repository);
        info!(
            grants = dataset.repository.len(),
            fingerprint = %dataset.fingerprint,
            invalid_metrics = report.invalid_metrics,
            count_drift = report.count_drift,
            "grants data loaded"
        );
        if dataset.repository.is_empty() {
            warn!(source = %self.source, "grants data contains no grants");
        }
        Ok(dataset)
    }
}

/// Parse and validate the artifact. Either every grant is accepted or none is.
pub fn parse_dataset(bytes: &[u8]) -> Result<LoadedDataset, LoadError> {
    let raw: OrderedMap<Grant> = serde_json::from_slice(bytes)?;

    let mut grants = Vec::with_capacity(raw.len());
    for (key, mut grant) in raw.into_entries() {
        if grant.id.is_empty() {
            grant.id = key;
        } else if grant.id != key {
            return Err(LoadError::IdMismatch { key, id: grant.id });
        }
        grant
            .config
            .validate()
            .map_err(|message| LoadError::InvalidConfig {
                grant_id: grant.id.clone(),
                message,
            })?;
        grants.push(grant);
    }

    Ok(LoadedDataset {
        repository: GrantRepository::new(grants)?,
        fingerprint: fingerprint(bytes),
    })
}

pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Flag responses whose metrics are malformed or disagree with their text, so
/// they can be corrected where the dataset is built.
pub fn audit(repository: &GrantRepository) -> AuditReport {
    let mut report = AuditReport::default();
    for grant in repository.iter() {
        for (key, response) in grant.responses() {
            if let Err(e) = classify(response) {
                report.invalid_metrics += 1;
                warn!(grant_id = %grant.id, response_key = key, error = %e, "invalid response metrics in dataset");
                continue;
            }
            let (words, chars) = response.measured_counts();
            if words as i64 != response.word_count || chars as i64 != response.char_count {
                report.count_drift += 1;
                warn!(
                    grant_id = %grant.id,
                    response_key = key,
                    stored_words = response.word_count,
                    measured_words = words,
                    stored_chars = response.char_count,
                    measured_chars = chars,
                    "stored counts disagree with response text"
                );
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use grants_common::fetch::FetchClientConfig;

    const DATASET: &str = r#"{
        "pbif": {
            "id": "pbif",
            "config": {"name": "Public Benefit Innovation Fund", "foundation": "PBIF", "status": "submitted"},
            "responses": {
                "impact": {
                    "title": "Impact",
                    "plainText": "one two three",
                    "wordCount": 3,
                    "charCount": 13,
                    "wordLimit": 500,
                    "needsCompletion": false
                }
            }
        },
        "arnold": {
            "config": {"name": "Arnold Ventures", "foundation": "Arnold", "status": "draft"}
        }
    }"#;

    #[test]
    fn parses_in_artifact_order() {
        let dataset = parse_dataset(DATASET.as_bytes()).expect("valid dataset");
        let ids: Vec<&str> = dataset.repository.ids().collect();
        assert_eq!(ids, ["pbif", "arnold"]);
        assert_eq!(dataset.repository.default_selection(Some("nsf-cssi")), Some("pbif"));
    }

    #[test]
    fn missing_id_takes_map_key() {
        let dataset = parse_dataset(DATASET.as_bytes()).expect("valid dataset");
        let arnold = dataset.repository.get("arnold").expect("present");
        assert_eq!(arnold.id, "arnold");
        assert!(arnold.responses.is_none());
    }

    #[test]
    fn stored_grant_equals_input_record() {
        let dataset = parse_dataset(DATASET.as_bytes()).expect("valid dataset");
        let doc: serde_json::Value = serde_json::from_str(DATASET).expect("json");
        let expected: Grant = serde_json::from_value(doc["pbif"].clone()).expect("grant");
        assert_eq!(dataset.repository.get("pbif").expect("present"), &expected);
    }

    #[test]
    fn fingerprint_is_sha256_of_bytes() {
        let dataset = parse_dataset(b"{}").expect("empty dataset is valid");
        assert!(dataset.repository.is_empty());
        assert_eq!(
            dataset.fingerprint,
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn unrecognised_grant_status_keeps_dataset() {
        let json = r#"{
            "nsf-cssi": {"config": {"name": "CSSI", "foundation": "NSF", "status": "in_progress"}},
            "pbif": {"config": {"name": "PBIF", "foundation": "PBIF", "status": "under_review"}}
        }"#;
        let dataset = parse_dataset(json.as_bytes()).expect("unknown status is not fatal");
        assert_eq!(dataset.repository.len(), 2);
        let pbif = dataset.repository.get("pbif").expect("present");
        assert_eq!(pbif.config.status.as_str(), "under_review");
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = parse_dataset(b"{\"a\": ").expect_err("truncated json");
        assert!(matches!(err, LoadError::Parse(_)));
        assert!(err.user_message().starts_with("Failed to load grants data"));
    }

    #[test]
    fn duplicate_grant_keys_fail_whole_load() {
        let json = r#"{
            "a": {"config": {"name": "A", "foundation": "F", "status": "draft"}},
            "a": {"config": {"name": "B", "foundation": "F", "status": "draft"}}
        }"#;
        let err = parse_dataset(json.as_bytes()).expect_err("duplicate keys");
        assert!(err.to_string().contains("duplicate key `a`"), "{err}");
    }

    #[test]
    fn id_mismatch_fails_load() {
        let json = r#"{"a": {"id": "b", "config": {"name": "A", "foundation": "F", "status": "draft"}}}"#;
        let err = parse_dataset(json.as_bytes()).expect_err("mismatch");
        assert!(matches!(err, LoadError::IdMismatch { ref key, ref id } if key == "a" && id == "b"));
    }

    #[test]
    fn invalid_config_fails_load() {
        let json = r#"{"a": {"config": {"name": "A", "foundation": "F", "status": "draft", "amount_requested": -5}}}"#;
        let err = parse_dataset(json.as_bytes()).expect_err("negative amount");
        assert!(matches!(err, LoadError::InvalidConfig { ref grant_id, .. } if grant_id == "a"));
    }

    #[test]
    fn invalid_metrics_do_not_fail_load_but_are_audited() {
        let json = r#"{"a": {
            "config": {"name": "A", "foundation": "F", "status": "draft"},
            "responses": {
                "bad": {"title": "Bad", "plainText": "x", "wordCount": -1, "charCount": 1},
                "drift": {"title": "Drift", "plainText": "two words", "wordCount": 5, "charCount": 9},
                "ok": {"title": "Ok", "plainText": "two words", "wordCount": 2, "charCount": 9}
            }
        }}"#;
        let dataset = parse_dataset(json.as_bytes()).expect("load succeeds");
        let report = audit(&dataset.repository);
        assert_eq!(
            report,
            AuditReport {
                invalid_metrics: 1,
                count_drift: 1
            }
        );
    }

    #[tokio::test]
    async fn load_from_file() {
        let path = std::env::temp_dir().join(format!("grant-viewer-loader-{}.json", std::process::id()));
        tokio::fs::write(&path, DATASET).await.expect("write fixture");
        let loader = DatasetLoader::new(
            FetchClient::new(FetchClientConfig::default()).expect("client"),
            DataSource::File(path.clone()),
        );
        let result = loader.load().await;
        let _ = tokio::fs::remove_file(&path).await;
        let dataset = result.expect("load succeeds");
        assert_eq!(dataset.repository.len(), 2);
    }

    #[tokio::test]
    async fn load_http_failure_is_load_error() {
        let app = axum::Router::new();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });

        let loader = DatasetLoader::new(
            FetchClient::new(FetchClientConfig::default()).expect("client"),
            DataSource::parse(&format!("http://{addr}/grants_data.json")),
        );
        let err = loader.load().await.expect_err("404 should fail");
        assert!(matches!(err, LoadError::Fetch(_)));
        assert!(err.to_string().contains("404"), "{err}");
    }
}
