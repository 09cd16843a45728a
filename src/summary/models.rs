//! Summary data models and merging.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Analysis of a single segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialSummary {
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub key_concepts: Vec<String>,
    pub topics: Vec<String>,
    pub detailed_summary: String,
    pub segment_index: usize,
}

/// Analysis of a whole transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub key_concepts: Vec<String>,
    pub topics: Vec<String>,
    pub detailed_summary: String,
}

impl Summary {
    /// Merge partial summaries in segment order.
    ///
    /// Lists become a case-insensitive union keeping the first spelling seen,
    /// detailed summaries are joined with a blank line, and `abstract_text`
    /// replaces the per-segment abstracts.
    pub fn merge(partials: &[PartialSummary], abstract_text: String) -> Self {
        let mut ordered: Vec<&PartialSummary> = partials.iter().collect();
        ordered.sort_by_key(|p| p.segment_index);

        let key_concepts = union_ignore_case(ordered.iter().flat_map(|p| p.key_concepts.iter()));
        let topics = union_ignore_case(ordered.iter().flat_map(|p| p.topics.iter()));
        let detailed_summary = ordered
            .iter()
            .map(|p| p.detailed_summary.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        Self {
            abstract_text: abstract_text.trim().to_string(),
            key_concepts,
            topics,
            detailed_summary,
        }
    }

    /// The summary of a transcript that needed only one segment: the partial
    /// itself, without its index.
    pub fn from_partial(partial: &PartialSummary) -> Self {
        Self {
            abstract_text: partial.abstract_text.clone(),
            key_concepts: partial.key_concepts.clone(),
            topics: partial.topics.clone(),
            detailed_summary: partial.detailed_summary.clone(),
        }
    }
}

/// Deduplicate ignoring case and surrounding whitespace, first spelling wins.
pub(crate) fn union_ignore_case<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .map(|item| item.trim())
        .filter(|item| !item.is_empty() && seen.insert(item.to_lowercase()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(index: usize, concepts: &[&str], topics: &[&str], detail: &str) -> PartialSummary {
        PartialSummary {
            abstract_text: format!("abstract {}", index),
            key_concepts: concepts.iter().map(|s| s.to_string()).collect(),
            topics: topics.iter().map(|s| s.to_string()).collect(),
            detailed_summary: detail.to_string(),
            segment_index: index,
        }
    }

    #[test]
    fn test_single_partial_merge_is_idempotent() {
        let p = partial(0, &["Rust", "Ownership"], &["Programming"], "Details.");
        let once = Summary::from_partial(&p);

        assert_eq!(once.abstract_text, p.abstract_text);
        assert_eq!(once.key_concepts, p.key_concepts);
        assert_eq!(once.topics, p.topics);
        assert_eq!(once.detailed_summary, p.detailed_summary);

        let again = Summary::from_partial(&PartialSummary {
            abstract_text: once.abstract_text.clone(),
            key_concepts: once.key_concepts.clone(),
            topics: once.topics.clone(),
            detailed_summary: once.detailed_summary.clone(),
            segment_index: 0,
        });
        assert_eq!(again, once);
    }

    #[test]
    fn test_merge_unions_ignoring_case() {
        let partials = vec![
            partial(1, &["borrowing", "Lifetimes"], &["Rust"], "Second."),
            partial(0, &["Ownership", "Borrowing"], &["rust", "Memory"], "First."),
        ];

        let summary = Summary::merge(&partials, " Whole video. ".to_string());

        assert_eq!(summary.abstract_text, "Whole video.");
        assert_eq!(summary.key_concepts, vec!["Ownership", "Borrowing", "Lifetimes"]);
        assert_eq!(summary.topics, vec!["rust", "Memory"]);
        assert_eq!(summary.detailed_summary, "First.\n\nSecond.");
    }

    #[test]
    fn test_serializes_abstract_field_name() {
        let summary = Summary::from_partial(&partial(0, &[], &[], "d"));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["abstract"], "abstract 0");
        assert!(json.get("abstract_text").is_none());
    }
}
