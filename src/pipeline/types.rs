//! Shared types for the intake-and-decision pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::taxonomy::FieldKind;

// ── Inbound email ───────────────────────────────────────────────────

/// A raw internet message plus the caller's identity for it (file name, upload id).
#[derive(Debug, Clone)]
pub struct RawEmail {
    pub id: String,
    pub bytes: Vec<u8>,
}

impl RawEmail {
    pub fn new(id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            bytes: bytes.into(),
        }
    }
}

/// Result of decoding a raw email.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEmail {
    /// Decoded subject, empty when the header is missing.
    pub subject: String,
    /// Concatenation of every `text/plain` part in structural order.
    pub body: String,
    /// Decoded bytes of every `application/pdf` part, in encounter order.
    pub attachments: Vec<Vec<u8>>,
}

impl ParsedEmail {
    /// Text used for classification, duplicate checks and storage.
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.subject, self.body)
    }
}

// ── Extracted fields ────────────────────────────────────────────────

/// Field values keyed by the request type's configured field list.
///
/// Every configured field is present; a field not found in the text is `None`
/// (serialized as `null`), never an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedFields(BTreeMap<FieldKind, Option<String>>);

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: FieldKind, value: Option<String>) {
        self.0.insert(field, value);
    }

    /// Extracted value, `None` if the field is absent or was not found.
    pub fn value(&self, field: FieldKind) -> Option<&str> {
        self.0.get(&field).and_then(|v| v.as_deref())
    }

    pub fn contains(&self, field: FieldKind) -> bool {
        self.0.contains_key(&field)
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKind> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Decision ────────────────────────────────────────────────────────

/// Terminal record for one processed email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub request_type: String,
    pub request_type_confidence: f32,
    /// `None` when the request type has no sub-type vocabulary.
    pub sub_request_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_request_type_confidence: Option<f32>,
    pub extracted_fields: ExtractedFields,
    pub duplicate: bool,
    pub assigned_team: String,
    pub source_text: String,
    pub attachment_count: usize,
    pub processed_at: DateTime<Utc>,
}

// ── Batch results ───────────────────────────────────────────────────

/// A processed email together with the caller's id for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDecision {
    pub id: String,
    #[serde(flatten)]
    pub decision: Decision,
}

/// A message that failed processing; the batch continued without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    pub id: String,
    pub error: String,
}

/// Outcome of a batch run, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub decisions: Vec<BatchDecision>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.decisions.len() + self.failures.len()
    }
}
