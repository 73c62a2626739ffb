//! Intent classification capability.
//!
//! Supports:
//! - **Zero-shot**: remote NLI model (e.g. `facebook/bart-large-mnli`) over HTTP
//! - **Keyword**: deterministic offline scorer, no model required
//!
//! The pipeline only depends on the `IntentClassifier` trait; providers are
//! constructed once at startup and injected as `Arc<dyn IntentClassifier>`.

pub mod keyword;
pub mod zero_shot;

pub use keyword::KeywordClassifier;
pub use zero_shot::ZeroShotClassifier;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, ConfigError};

/// Single-label classification outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    /// Score of the winning label, in `[0, 1]`.
    pub confidence: f32,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence: if confidence.is_nan() {
                0.0
            } else {
                confidence.clamp(0.0, 1.0)
            },
        }
    }
}

/// Picks exactly one label from a non-empty candidate list.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Return the top-ranked candidate for `text`.
    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> Result<ClassificationResult, ClassifierError>;
}

/// Supported classifier backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierBackend {
    Keyword,
    ZeroShot,
}

impl std::str::FromStr for ClassifierBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "zero-shot" | "zero_shot" | "zeroshot" => Ok(Self::ZeroShot),
            other => Err(ConfigError::InvalidValue {
                key: "LOAN_TRIAGE_CLASSIFIER".into(),
                message: format!("unknown classifier backend {other:?} (expected keyword or zero-shot)"),
            }),
        }
    }
}

/// Configuration for creating a classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub backend: ClassifierBackend,
    pub endpoint: String,
    pub api_token: Option<secrecy::SecretString>,
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::Keyword,
            endpoint: zero_shot::DEFAULT_ENDPOINT.to_string(),
            api_token: None,
            timeout: Duration::from_secs(zero_shot::DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Create a classifier from configuration.
pub fn create_classifier(
    config: &ClassifierConfig,
) -> Result<Arc<dyn IntentClassifier>, ClassifierError> {
    match config.backend {
        ClassifierBackend::Keyword => {
            tracing::info!("Using keyword classifier");
            Ok(Arc::new(KeywordClassifier::loan_servicing()))
        }
        ClassifierBackend::ZeroShot => {
            let token = config
                .api_token
                .clone()
                .ok_or_else(|| ClassifierError::Unavailable {
                    provider: zero_shot::PROVIDER.into(),
                    reason: "HF_API_TOKEN not set".into(),
                })?;
            let classifier = ZeroShotClassifier::new(&config.endpoint, token, config.timeout)?;
            tracing::info!(endpoint = %config.endpoint, "Using zero-shot classifier");
            Ok(Arc::new(classifier))
        }
    }
}

/// Reject empty candidate lists before any provider work.
pub(crate) fn ensure_candidates(candidate_labels: &[String]) -> Result<(), ClassifierError> {
    if candidate_labels.is_empty() {
        Err(ClassifierError::EmptyCandidates)
    } else {
        Ok(())
    }
}
