//! Zero-shot NLI classifier over HTTP.
//!
//! Speaks the Hugging Face inference API contract for zero-shot
//! classification:
//!
//! ```text
//! POST {endpoint}
//! {"inputs": "...", "parameters": {"candidate_labels": [...], "multi_label": false}}
//! ```
//!
//! The response is either `{"labels": [...], "scores": [...]}` or a list of
//! `{"label": ..., "score": ...}` objects. The highest score wins.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ClassificationResult, IntentClassifier, ensure_candidates};
use crate::error::ClassifierError;

/// Provider name used in logs and errors.
pub const PROVIDER: &str = "zero-shot";

/// Default inference endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-mnli";

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Classifier backed by a remote zero-shot inference endpoint.
pub struct ZeroShotClassifier {
    endpoint: String,
    token: SecretString,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
    multi_label: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Ranked { labels: Vec<String>, scores: Vec<f32> },
    Scored(Vec<LabelScore>),
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

impl ZeroShotClassifier {
    pub fn new(
        endpoint: impl Into<String>,
        token: SecretString,
        timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Unavailable {
                provider: PROVIDER.into(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            endpoint: endpoint.into(),
            token,
            timeout,
            client,
        })
    }
}

#[async_trait]
impl IntentClassifier for ZeroShotClassifier {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> Result<ClassificationResult, ClassifierError> {
        ensure_candidates(candidate_labels)?;

        let body = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters {
                candidate_labels,
                multi_label: false,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout {
                        provider: PROVIDER.into(),
                        timeout: self.timeout,
                    }
                } else {
                    ClassifierError::RequestFailed {
                        provider: PROVIDER.into(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            let reason = response.text().await.unwrap_or_default();
            warn!(status = %status, "Zero-shot model unavailable");
            return Err(ClassifierError::Unavailable {
                provider: PROVIDER.into(),
                reason,
            });
        }
        if !status.is_success() {
            let reason = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClassifierError::RequestFailed {
                provider: PROVIDER.into(),
                reason: format!("HTTP {status}: {reason}"),
            });
        }

        let parsed: ZeroShotResponse =
            response
                .json()
                .await
                .map_err(|e| ClassifierError::InvalidResponse {
                    provider: PROVIDER.into(),
                    reason: e.to_string(),
                })?;

        let result = pick_top(parsed, candidate_labels)?;
        debug!(label = %result.label, confidence = result.confidence, "Zero-shot classification");
        Ok(result)
    }
}

/// Select the highest-scoring label and check it is one of the candidates.
fn pick_top(
    response: ZeroShotResponse,
    candidate_labels: &[String],
) -> Result<ClassificationResult, ClassifierError> {
    let pairs: Vec<(String, f32)> = match response {
        ZeroShotResponse::Ranked { labels, scores } => {
            if labels.len() != scores.len() {
                return Err(ClassifierError::InvalidResponse {
                    provider: PROVIDER.into(),
                    reason: format!(
                        "{} labels but {} scores",
                        labels.len(),
                        scores.len()
                    ),
                });
            }
            labels.into_iter().zip(scores).collect()
        }
        ZeroShotResponse::Scored(items) => items.into_iter().map(|i| (i.label, i.score)).collect(),
    };

    let mut best: Option<(String, f32)> = None;
    for (label, score) in pairs {
        if best.as_ref().is_none_or(|(_, s)| score > *s) {
            best = Some((label, score));
        }
    }

    let (label, score) = best.ok_or_else(|| ClassifierError::InvalidResponse {
        provider: PROVIDER.into(),
        reason: "response contained no labels".into(),
    })?;

    if !candidate_labels.iter().any(|c| *c == label) {
        return Err(ClassifierError::UnknownLabel {
            provider: PROVIDER.into(),
            label,
        });
    }

    Ok(ClassificationResult::new(label, score))
}
