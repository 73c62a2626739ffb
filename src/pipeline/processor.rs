//! Pipeline orchestrator — one raw email in, one `Decision` out.
//!
//! Flow:
//! 1. Parse → subject, body, PDF attachments
//! 2. Combine → `subject + " " + body`
//! 3. Classify request type, then sub-type when the type has a vocabulary
//! 4. Extract the type's configured fields
//! 5. Duplicate check against history as it was before this message
//! 6. Route to a team
//! 7. Append the combined text to history
//!
//! History is only touched after the decision is complete, so a failed message
//! leaves it unchanged. The history lock is held for the whole call.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::classifier::{ClassificationResult, IntentClassifier};
use crate::error::{ClassificationStage, ClassifierError, PipelineError};
use crate::pipeline::dedup::{DuplicateDetector, History};
use crate::pipeline::parser::EmailParser;
use crate::pipeline::router::Router;
use crate::pipeline::rules::FieldExtractor;
use crate::pipeline::types::{BatchDecision, BatchFailure, BatchReport, Decision, RawEmail};
use crate::taxonomy::Taxonomy;

/// Composes parser, classifier, extractor, duplicate detector and router.
pub struct PipelineOrchestrator {
    taxonomy: Arc<Taxonomy>,
    classifier: Arc<dyn IntentClassifier>,
    parser: EmailParser,
    extractor: FieldExtractor,
    detector: DuplicateDetector,
    router: Router,
    history: Mutex<History>,
}

impl PipelineOrchestrator {
    /// Create an orchestrator with an empty, unbounded history.
    pub fn new(taxonomy: Arc<Taxonomy>, classifier: Arc<dyn IntentClassifier>) -> Self {
        Self {
            extractor: FieldExtractor::new(Arc::clone(&taxonomy)),
            router: Router::new(Arc::clone(&taxonomy)),
            taxonomy,
            classifier,
            parser: EmailParser::new(),
            detector: DuplicateDetector::new(),
            history: Mutex::new(History::new()),
        }
    }

    /// Start the session from an existing history (e.g. a bounded one).
    pub fn with_history(mut self, history: History) -> Self {
        self.history = Mutex::new(history);
        self
    }

    /// Replace the field extractor (custom rules).
    pub fn with_extractor(mut self, extractor: FieldExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Process a single raw email.
    pub async fn process(&self, raw: &[u8]) -> Result<Decision, PipelineError> {
        let mut history = self.history.lock().await;

        let parsed = self.parser.parse(raw)?;
        let text = parsed.combined_text();

        info!(
            subject = %parsed.subject,
            attachments = parsed.attachments.len(),
            "Processing email"
        );

        let request_type = self
            .classify(&text, &self.taxonomy.request_types)
            .await
            .map_err(|source| PipelineError::Classification {
                stage: ClassificationStage::RequestType,
                source,
            })?;

        let sub_types = self.taxonomy.sub_types_for(&request_type.label);
        let sub_request_type = if sub_types.is_empty() {
            None
        } else {
            Some(self.classify(&text, sub_types).await.map_err(|source| {
                PipelineError::Classification {
                    stage: ClassificationStage::SubRequestType,
                    source,
                }
            })?)
        };
        let sub_label = sub_request_type.as_ref().map(|r| r.label.as_str());

        info!(
            request_type = %request_type.label,
            confidence = request_type.confidence,
            sub_request_type = sub_label.unwrap_or("none"),
            "Classified email"
        );

        let extracted_fields = self.extractor.extract(&text, &request_type.label, sub_label);
        let duplicate = self.detector.is_duplicate(&text, &history);
        if duplicate {
            info!(request_type = %request_type.label, "Duplicate email detected");
        }
        let assigned_team = self.router.route(&request_type.label, sub_label);

        let decision = Decision {
            request_type: request_type.label,
            request_type_confidence: request_type.confidence,
            sub_request_type_confidence: sub_request_type.as_ref().map(|r| r.confidence),
            sub_request_type: sub_request_type.map(|r| r.label),
            extracted_fields,
            duplicate,
            assigned_team,
            source_text: text,
            attachment_count: parsed.attachments.len(),
            processed_at: Utc::now(),
        };

        history.push(decision.source_text.clone());
        debug!(
            team = %decision.assigned_team,
            history_len = history.len(),
            "Decision recorded"
        );

        Ok(decision)
    }

    /// Process a batch in order.
    ///
    /// Failures on individual messages are recorded with the message id and
    /// don't stop the batch.
    pub async fn process_batch(&self, emails: Vec<RawEmail>) -> BatchReport {
        let count = emails.len();
        info!(count, "Processing email batch");

        let mut report = BatchReport::default();
        for email in emails {
            match self.process(&email.bytes).await {
                Ok(decision) => report.decisions.push(BatchDecision {
                    id: email.id,
                    decision,
                }),
                Err(e) => {
                    error!(id = %email.id, error = %e, "Failed to process email in batch");
                    report.failures.push(BatchFailure {
                        id: email.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            processed = report.decisions.len(),
            failed = report.failures.len(),
            total = count,
            "Batch processing complete"
        );
        report
    }

    /// Number of texts recorded this session.
    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }

    /// Copy of the recorded texts, oldest first.
    pub async fn history_snapshot(&self) -> Vec<String> {
        self.history
            .lock()
            .await
            .iter()
            .map(str::to_string)
            .collect()
    }

    /// Call the classifier and check the label is one of the candidates.
    async fn classify(
        &self,
        text: &str,
        candidates: &[String],
    ) -> Result<ClassificationResult, ClassifierError> {
        let result = self.classifier.classify(text, candidates).await?;
        if !candidates.contains(&result.label) {
            return Err(ClassifierError::UnknownLabel {
                provider: self.classifier.name().to_string(),
                label: result.label,
            });
        }
        Ok(result)
    }
}
