use std::sync::Arc;

use crate::command::Intent;
use crate::lexicon::IntentLexicon;

/// Keyword-driven first-match intent resolver.
///
/// Pure substring containment over the ordered lexicon table; no stemming,
/// no scoring. Ties between families are impossible because the first
/// matching row short-circuits.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    lexicon: Arc<IntentLexicon>,
}

impl IntentClassifier {
    /// Creates a classifier over the given dispatch table.
    #[must_use]
    pub fn new(lexicon: Arc<IntentLexicon>) -> Self {
        Self { lexicon }
    }

    /// Resolves the first intent whose keyword set appears in the text.
    ///
    /// The input is expected to be lowercased and trimmed by the caller.
    /// Returns `None` when no keyword matches; callers surface that as
    /// `unknown`.
    #[must_use]
    pub fn classify(&self, text: &str) -> Option<Intent> {
        self.lexicon
            .iter()
            .find(|entry| entry.keywords.iter().any(|keyword| text.contains(keyword)))
            .map(|entry| entry.intent)
    }

    /// The dispatch table this classifier reads.
    #[must_use]
    pub fn lexicon(&self) -> &IntentLexicon {
        &self.lexicon
    }
}
