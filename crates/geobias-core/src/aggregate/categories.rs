//! The fixed category vocabulary that tag-frequency vectors are indexed by.
//!
//! Category identity defines the statistic, so a label outside the vocabulary
//! is an error rather than something to skip.

use std::collections::HashMap;
use std::path::Path;

use crate::error::PipelineError;

/// Ordered category labels with a reverse index.
#[derive(Debug, Clone, Default)]
pub struct Categories {
    labels: Vec<String>,
    by_label: HashMap<String, usize>,
}

impl Categories {
    /// Build from labels in vocabulary order. Duplicate labels keep their first index.
    pub fn new(labels: Vec<String>) -> Self {
        let mut by_label = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            by_label.entry(label.clone()).or_insert(i);
        }
        Self { labels, by_label }
    }

    /// Load one label per line. Blank lines and `#` comments are ignored.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Dataset {
            message: format!("Failed to read {:?}: {}", path, e),
        })?;
        let labels: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();

        tracing::info!("Loaded {} categories from {:?}", labels.len(), path);
        Ok(Self::new(labels))
    }

    /// Position of a label in the vocabulary.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.by_label.get(label).copied()
    }

    /// Position of a label, or a vocabulary-miss error naming the sample.
    pub fn require(&self, sample_id: &str, label: &str) -> Result<usize, PipelineError> {
        self.index_of(label)
            .ok_or_else(|| PipelineError::VocabularyMiss {
                sample_id: sample_id.to_string(),
                label: label.to_string(),
            })
    }

    /// All labels in vocabulary order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_index_of() {
        let cats = Categories::new(vec!["dog".into(), "beach".into(), "car".into()]);
        assert_eq!(cats.index_of("dog"), Some(0));
        assert_eq!(cats.index_of("car"), Some(2));
        assert_eq!(cats.index_of("cat"), None);
    }

    #[test]
    fn test_duplicate_label_keeps_first_index() {
        let cats = Categories::new(vec!["dog".into(), "dog".into()]);
        assert_eq!(cats.index_of("dog"), Some(0));
        assert_eq!(cats.len(), 2);
    }

    #[test]
    fn test_require_reports_sample_and_label() {
        let cats = Categories::new(vec!["dog".into()]);
        let err = cats.require("img_7", "zebra").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::VocabularyMiss { ref sample_id, ref label }
                if sample_id == "img_7" && label == "zebra"
        ));
    }

    #[test]
    fn test_load_skips_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "# categories").unwrap();
        writeln!(f, "dog").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "  beach  ").unwrap();

        let cats = Categories::load(&path).unwrap();
        assert_eq!(cats.labels(), &["dog".to_string(), "beach".to_string()]);
    }
}
