//! Email intake-and-decision pipeline.
//!
//! Every message flows through:
//! 1. `EmailParser::parse()` — subject, plain-text body, PDF attachments
//! 2. `IntentClassifier` — request type, then sub-type within its vocabulary
//! 3. `FieldExtractor::extract()` — the request type's configured fields
//! 4. `DuplicateDetector::is_duplicate()` — exact match against session history
//! 5. `Router::route()` — responsible team, `Unassigned` when unresolvable
//!
//! `PipelineOrchestrator` composes the steps and owns the history.

pub mod dedup;
pub mod parser;
pub mod processor;
pub mod router;
pub mod rules;
pub mod types;

pub use dedup::{DuplicateDetector, History};
pub use parser::EmailParser;
pub use processor::PipelineOrchestrator;
pub use router::Router;
pub use rules::FieldExtractor;
pub use types::{
    BatchDecision, BatchFailure, BatchReport, Decision, ExtractedFields, ParsedEmail, RawEmail,
};
