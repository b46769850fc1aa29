use std::collections::HashMap;

use crate::domain::equipment::UNKNOWN_TYPE;

/// Maps raw equipment type strings to normalized labels.
///
/// Values are trimmed and bucketed case-insensitively. The first trimmed
/// spelling seen for a bucket becomes its label, so `"Pump"` followed by
/// `"  pump"` classifies both as `"Pump"`. Blank values, and any casing of
/// `unknown`, go to the reserved [`UNKNOWN_TYPE`] bucket.
#[derive(Debug, Default)]
pub struct TypeClassifier {
    canonical: HashMap<String, String>,
}

impl TypeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, raw: Option<&str>) -> &str {
        let trimmed = raw.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            return UNKNOWN_TYPE;
        }

        let key = trimmed.to_lowercase();
        if key == UNKNOWN_TYPE.to_lowercase() {
            return UNKNOWN_TYPE;
        }

        self.canonical
            .entry(key)
            .or_insert_with(|| trimmed.to_string())
            .as_str()
    }

    /// Number of distinct non-reserved labels seen so far
    #[cfg(test)]
    fn len(&self) -> usize {
        self.canonical.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_casing_wins() {
        let mut classifier = TypeClassifier::new();
        assert_eq!(classifier.classify(Some("  pump")), "pump");
        assert_eq!(classifier.classify(Some("Pump")), "pump");

        let mut classifier = TypeClassifier::new();
        assert_eq!(classifier.classify(Some("Pump")), "Pump");
        assert_eq!(classifier.classify(Some("  pump")), "Pump");
        assert_eq!(classifier.classify(Some("PUMP ")), "Pump");
        assert_eq!(classifier.len(), 1);
    }

    #[test]
    fn test_blank_values_are_unknown() {
        let mut classifier = TypeClassifier::new();
        assert_eq!(classifier.classify(None), UNKNOWN_TYPE);
        assert_eq!(classifier.classify(Some("")), UNKNOWN_TYPE);
        assert_eq!(classifier.classify(Some(" \t ")), UNKNOWN_TYPE);
        assert!(classifier.is_empty());
    }

    #[test]
    fn test_literal_unknown_uses_reserved_label() {
        let mut classifier = TypeClassifier::new();
        assert_eq!(classifier.classify(Some("unknown")), UNKNOWN_TYPE);
        assert_eq!(classifier.classify(Some("UNKNOWN")), UNKNOWN_TYPE);
    }

    #[test]
    fn test_distinct_types_stay_separate() {
        let mut classifier = TypeClassifier::new();
        assert_eq!(classifier.classify(Some("Valve")), "Valve");
        assert_eq!(classifier.classify(Some("Heat Exchanger")), "Heat Exchanger");
        assert_eq!(classifier.len(), 2);
    }
}
