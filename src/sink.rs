//! Decision sinks: where batch results go once processing is done.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::SinkError;
use crate::pipeline::BatchReport;

/// Destination for a finished batch report.
#[async_trait]
pub trait DecisionSink: Send + Sync {
    async fn write(&self, report: &BatchReport) -> Result<(), SinkError>;
}

/// Writes the successful decisions as a pretty-printed JSON array.
///
/// Parent directories are created as needed. Failures are not written; the
/// caller reports them.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl DecisionSink for JsonFileSink {
    async fn write(&self, report: &BatchReport) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&report.decisions)?;
        tokio::fs::write(&self.path, json).await?;

        info!(
            path = %self.path.display(),
            count = report.decisions.len(),
            "Wrote decisions"
        );
        Ok(())
    }
}

/// Keeps reports in memory. Useful for tests and embedding.
#[derive(Default)]
pub struct MemorySink {
    reports: Mutex<Vec<BatchReport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports written so far, oldest first.
    pub async fn reports(&self) -> Vec<BatchReport> {
        self.reports.lock().await.clone()
    }
}

#[async_trait]
impl DecisionSink for MemorySink {
    async fn write(&self, report: &BatchReport) -> Result<(), SinkError> {
        self.reports.lock().await.push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;

    use crate::pipeline::{BatchDecision, BatchFailure, Decision, ExtractedFields};
    use crate::taxonomy::FieldKind;

    fn sample_report() -> BatchReport {
        let mut fields = ExtractedFields::new();
        fields.insert(FieldKind::Amount, Some("$500".into()));
        fields.insert(FieldKind::DealName, None);

        BatchReport {
            decisions: vec![BatchDecision {
                id: "a.eml".into(),
                decision: Decision {
                    request_type: "AU Transfer".into(),
                    request_type_confidence: 0.9,
                    sub_request_type: None,
                    sub_request_type_confidence: None,
                    extracted_fields: fields,
                    duplicate: false,
                    assigned_team: "Team B".into(),
                    source_text: "Transfer $500".into(),
                    attachment_count: 0,
                    processed_at: Utc::now(),
                },
            }],
            failures: vec![BatchFailure {
                id: "b.eml".into(),
                error: "Email is empty".into(),
            }],
        }
    }

    #[tokio::test]
    async fn json_sink_creates_parent_dirs_and_writes_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result").join("output.json");
        let sink = JsonFileSink::new(&path);
        assert_eq!(sink.path(), path.as_path());

        sink.write(&sample_report()).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], "a.eml");
        assert_eq!(items[0]["assigned_team"], "Team B");
        assert_eq!(items[0]["extracted_fields"]["amount"], "$500");
        assert!(items[0]["extracted_fields"]["deal_name"].is_null());
        assert!(items[0]["sub_request_type"].is_null());
    }

    #[tokio::test]
    async fn json_sink_overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, "stale").unwrap();

        JsonFileSink::new(&path)
            .write(&BatchReport::default())
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn memory_sink_keeps_reports() {
        let sink = MemorySink::new();
        sink.write(&sample_report()).await.unwrap();
        sink.write(&BatchReport::default()).await.unwrap();

        let reports = sink.reports().await;
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].total(), 2);
        assert_eq!(reports[1].total(), 0);
    }
}
