use once_cell::sync::Lazy;

use super::vocabulary::{TitleRule, Vocabulary};
use crate::types::TitleCategory;

static DEFAULT_CLASSIFIER: Lazy<TitleClassifier> =
    Lazy::new(|| TitleClassifier::new(&Vocabulary::default()));

/// Buckets free-text job titles into the fixed taxonomy.
///
/// Rules are tried in table order and the first hit wins, so overlapping
/// keyword sets resolve by precedence. Titles that match nothing are
/// `OtherItRole`; a missing title is `Unknown`.
#[derive(Debug, Clone)]
pub struct TitleClassifier {
    rules: Vec<TitleRule>,
}

impl TitleClassifier {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        Self {
            rules: vocabulary.normalized().titles,
        }
    }

    pub fn classify(&self, raw: Option<&str>) -> TitleCategory {
        let Some(raw) = raw else {
            return TitleCategory::Unknown;
        };
        let title = raw.to_lowercase();
        let trimmed = title.trim();

        self.rules
            .iter()
            .find(|rule| {
                rule.exact.iter().any(|e| trimmed == e.as_str())
                    || rule.contains.iter().any(|k| title.contains(k.as_str()))
            })
            .map(|rule| rule.category)
            .unwrap_or(TitleCategory::OtherItRole)
    }
}

impl Default for TitleClassifier {
    fn default() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }
}

/// Classifies with the built-in keyword table
pub fn classify_title(raw: Option<&str>) -> TitleCategory {
    DEFAULT_CLASSIFIER.classify(raw)
}
