//! Duplicate detection against the session history of processed texts.
//!
//! Matching is exact string equality on the combined subject + body text; no
//! case or whitespace normalization is applied.

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;

use tracing::debug;

/// Ordered, append-only log of processed message texts for one session.
///
/// Unbounded by default. With a limit, the oldest entries are evicted once the
/// log is full.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<String>,
    counts: HashMap<String, usize>,
    limit: Option<NonZeroUsize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `limit` entries.
    pub fn with_limit(limit: NonZeroUsize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn contains(&self, text: &str) -> bool {
        self.counts.contains_key(text)
    }

    /// Append a processed text. Duplicates are kept as separate entries.
    pub fn push(&mut self, text: String) {
        *self.counts.entry(text.clone()).or_default() += 1;
        self.entries.push_back(text);

        if let Some(limit) = self.limit {
            while self.entries.len() > limit.get() {
                if let Some(evicted) = self.entries.pop_front() {
                    self.forget(&evicted);
                    debug!(len = self.entries.len(), "Evicted oldest history entry");
                }
            }
        }
    }

    fn forget(&mut self, text: &str) {
        if let Some(count) = self.counts.get_mut(text) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(text);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn limit(&self) -> Option<NonZeroUsize> {
        self.limit
    }
}

/// Exact-match membership test against a history snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateDetector;

impl DuplicateDetector {
    pub fn new() -> Self {
        Self
    }

    /// Read-only; the caller appends after the decision is final.
    pub fn is_duplicate(&self, text: &str, history: &History) -> bool {
        history.contains(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_has_no_duplicates() {
        let history = History::new();
        assert!(!DuplicateDetector::new().is_duplicate("Fee Request body", &history));
    }

    #[test]
    fn exact_match_is_duplicate() {
        let mut history = History::new();
        history.push("Fee Request body".into());
        assert!(DuplicateDetector::new().is_duplicate("Fee Request body", &history));
    }

    #[test]
    fn no_normalization_is_applied() {
        let mut history = History::new();
        history.push("Fee Request body".into());
        let detector = DuplicateDetector::new();
        assert!(!detector.is_duplicate("fee request body", &history));
        assert!(!detector.is_duplicate("Fee Request body ", &history));
        assert!(!detector.is_duplicate("Fee  Request body", &history));
    }

    #[test]
    fn detection_does_not_mutate_history() {
        let history = History::new();
        DuplicateDetector::new().is_duplicate("x", &history);
        assert!(history.is_empty());
    }

    #[test]
    fn history_keeps_repeated_entries_in_order() {
        let mut history = History::new();
        history.push("a".into());
        history.push("b".into());
        history.push("a".into());
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["a", "b", "a"]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn bounded_history_evicts_oldest() {
        let mut history = History::with_limit(NonZeroUsize::new(2).unwrap());
        history.push("a".into());
        history.push("b".into());
        history.push("c".into());
        assert_eq!(history.len(), 2);
        assert!(!history.contains("a"));
        assert!(history.contains("b"));
        assert!(history.contains("c"));
    }

    #[test]
    fn eviction_keeps_later_copy_of_same_text() {
        let mut history = History::with_limit(NonZeroUsize::new(2).unwrap());
        history.push("a".into());
        history.push("a".into());
        history.push("b".into());
        assert!(history.contains("a"));
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
