//! Error types for loan triage.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Inbox error: {0}")]
    Inbox(#[from] InboxError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse taxonomy: {0}")]
    ParseError(String),

    #[error("Inconsistent taxonomy for request type {request_type}: {reason}")]
    Inconsistent {
        request_type: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised only when the input cannot be read as a message at all.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Email payload is empty")]
    Empty,

    #[error("Email payload could not be interpreted as a message")]
    Unreadable,
}

/// Classification provider errors.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Classifier {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Classifier {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from classifier {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Classifier {provider} is unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    #[error("Classifier {provider} returned label {label:?} outside the candidate set")]
    UnknownLabel { provider: String, label: String },

    #[error("No candidate labels supplied")]
    EmptyCandidates,
}

/// Which of the two classification calls failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationStage {
    RequestType,
    SubRequestType,
}

impl std::fmt::Display for ClassificationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestType => f.write_str("request type"),
            Self::SubRequestType => f.write_str("sub-request type"),
        }
    }
}

/// Per-message pipeline errors. Parse and classification failures stay distinct.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Classification of {stage} failed: {source}")]
    Classification {
        stage: ClassificationStage,
        #[source]
        source: ClassifierError,
    },
}

/// Batch source errors.
#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    #[error("Failed to read inbox directory {path}: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read email file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Results sink errors.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
