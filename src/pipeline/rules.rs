//! Declarative field extraction rules.
//!
//! Each request type has a configured field list; each field has one rule:
//! - `amount` → first `$` amount (`$500`, `$1,250.00`)
//! - `expiration_date` / `date` → first `DD/MM/YYYY`-shaped date
//! - `deal_name` → word following "deal" (case-insensitive)
//! - `fee_type` → the classified sub-request type, verbatim
//! - `currency` → first whole-word USD / EUR / GBP (case-insensitive)
//!
//! Rules never fail. A configured field that is not found is recorded as absent.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::pipeline::types::ExtractedFields;
use crate::taxonomy::{FieldKind, Taxonomy};

/// How a field's value is obtained.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// First match of `regex`; the value is capture `group` (0 = whole match).
    Pattern { regex: Regex, group: usize },
    /// Copy of the classified sub-request type.
    SubRequestType,
}

/// Extraction rule for one field.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub field: FieldKind,
    pub kind: RuleKind,
}

impl ExtractionRule {
    fn pattern(field: FieldKind, pattern: &str, group: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            field,
            kind: RuleKind::Pattern {
                regex: Regex::new(pattern)?,
                group,
            },
        })
    }

    fn apply(&self, text: &str, sub_request_type: Option<&str>) -> Option<String> {
        match &self.kind {
            RuleKind::Pattern { regex, group } => regex
                .captures(text)
                .and_then(|caps| caps.get(*group))
                .map(|m| m.as_str().to_string()),
            RuleKind::SubRequestType => sub_request_type.map(str::to_string),
        }
    }
}

/// Applies the configured rules for a message's request type.
pub struct FieldExtractor {
    taxonomy: Arc<Taxonomy>,
    rules: HashMap<FieldKind, ExtractionRule>,
}

impl FieldExtractor {
    /// Create an extractor with the default loan-servicing rules.
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        let date = r"\d{2}/\d{2}/\d{4}";
        let rules = [
            ExtractionRule::pattern(FieldKind::Amount, r"\$\d+(?:,\d{3})*(?:\.\d{2})?", 0),
            ExtractionRule::pattern(FieldKind::ExpirationDate, date, 0),
            ExtractionRule::pattern(FieldKind::Date, date, 0),
            ExtractionRule::pattern(FieldKind::DealName, r"(?i)\bdeal\s+(\w+)", 1),
            ExtractionRule::pattern(FieldKind::Currency, r"(?i)\b(?:USD|EUR|GBP)\b", 0),
        ]
        .into_iter()
        .map(|rule| rule.expect("static extraction pattern"))
        .chain(std::iter::once(ExtractionRule {
            field: FieldKind::FeeType,
            kind: RuleKind::SubRequestType,
        }))
        .map(|rule| (rule.field, rule))
        .collect();

        Self { taxonomy, rules }
    }

    /// Replace the rule for a field with a custom pattern.
    pub fn set_pattern_rule(
        &mut self,
        field: FieldKind,
        pattern: &str,
        group: usize,
    ) -> Result<(), regex::Error> {
        self.rules
            .insert(field, ExtractionRule::pattern(field, pattern, group)?);
        Ok(())
    }

    /// Extract the configured fields for `request_type` from `text`.
    ///
    /// The result has exactly the request type's configured keys.
    pub fn extract(
        &self,
        text: &str,
        request_type: &str,
        sub_request_type: Option<&str>,
    ) -> ExtractedFields {
        let mut fields = ExtractedFields::new();

        for field in self.taxonomy.fields_for(request_type) {
            let value = self
                .rules
                .get(field)
                .and_then(|rule| rule.apply(text, sub_request_type));

            if value.is_none() {
                debug!(request_type, field = %field, "Field not found");
            }
            fields.insert(*field, value);
        }

        fields
    }
}
