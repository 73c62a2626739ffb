//! Deterministic keyword classifier.
//!
//! Scores each candidate label by whole-word, case-insensitive hits of its
//! keywords in the text. A label's keywords are the words of the label itself
//! plus any configured hint words. Ties resolve to the earliest candidate.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use super::{ClassificationResult, IntentClassifier, ensure_candidates};
use crate::error::ClassifierError;

/// Words ignored when deriving keywords from a label.
const STOPWORDS: &[&str] = &["a", "an", "and", "for", "of", "on", "the", "to"];

/// Offline classifier with no model dependency.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    hints: HashMap<String, Vec<String>>,
}

impl KeywordClassifier {
    /// Create a classifier that only uses the words of each label.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifier with hint words for the loan-servicing taxonomy.
    pub fn loan_servicing() -> Self {
        Self::new()
            .with_hints("Adjustment", &["adjust", "adjusted", "correction", "reconcile"])
            .with_hints("AU Transfer", &["assignment", "assignee", "transfer"])
            .with_hints("Closing Notice", &["closing", "close", "payoff", "termination"])
            .with_hints("Commitment Change", &["commitment", "facility", "limit"])
            .with_hints("Fee Payment", &["fees", "invoice"])
            .with_hints(
                "Money Movement - Inbound",
                &["incoming", "received", "receipt", "remittance"],
            )
            .with_hints(
                "Money Movement - Outbound",
                &["outgoing", "disburse", "disbursement", "wire", "send"],
            )
            .with_hints("Cashless Roll", &["rollover", "roll"])
            .with_hints("Decrease", &["reduce", "reduction", "downsize"])
            .with_hints("Increase", &["upsize", "additional"])
            .with_hints("Ongoing Fee", &["recurring", "quarterly", "annual"])
            .with_hints("Letter of Credit Fee", &["lc", "loc"])
            .with_hints("Timebound", &["deadline", "urgent", "cutoff"])
            .with_hints("Foreign Currency", &["fx", "eur", "gbp"])
    }

    /// Add hint words for a label.
    pub fn with_hints(mut self, label: &str, words: &[&str]) -> Self {
        self.hints
            .entry(label.to_string())
            .or_default()
            .extend(words.iter().map(|w| w.to_lowercase()));
        self
    }

    fn keywords_for(&self, label: &str) -> Vec<String> {
        let mut keywords: Vec<String> = tokenize(label)
            .filter(|w| !STOPWORDS.contains(&w.as_str()))
            .collect();
        if let Some(hints) = self.hints.get(label) {
            keywords.extend(hints.iter().cloned());
        }
        keywords.sort();
        keywords.dedup();
        keywords
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> Result<ClassificationResult, ClassifierError> {
        ensure_candidates(candidate_labels)?;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for word in tokenize(text) {
            *counts.entry(word).or_default() += 1;
        }

        let scores: Vec<usize> = candidate_labels
            .iter()
            .map(|label| {
                self.keywords_for(label)
                    .iter()
                    .map(|k| counts.get(k).copied().unwrap_or(0))
                    .sum()
            })
            .collect();

        // Strictly-greater comparison keeps the earliest candidate on ties.
        let mut best = 0;
        for (i, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = i;
            }
        }

        let total: usize = scores.iter().sum();
        let confidence = if total == 0 {
            1.0 / candidate_labels.len() as f32
        } else {
            scores[best] as f32 / total as f32
        };

        debug!(
            label = %candidate_labels[best],
            hits = scores[best],
            total,
            "Keyword classification"
        );

        Ok(ClassificationResult::new(
            candidate_labels[best].clone(),
            confidence,
        ))
    }
}

/// Lowercased alphanumeric words.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}
