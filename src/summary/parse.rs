//! Parsing of labeled-section model responses.
//!
//! A response is a sequence of sections introduced by a label line such as
//! `ABSTRACT:` or `## Key Concepts:`. Text on the label line after the colon
//! belongs to the section.

use super::models::{union_ignore_case, PartialSummary};
use regex::Regex;
use std::sync::OnceLock;

/// The four sections of a segment analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Abstract,
    KeyConcepts,
    Topics,
    DetailedSummary,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::Abstract => "ABSTRACT",
            Section::KeyConcepts => "KEY CONCEPTS",
            Section::Topics => "TOPICS",
            Section::DetailedSummary => "DETAILED SUMMARY",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        let normalized = label.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        match normalized.as_str() {
            "ABSTRACT" => Some(Section::Abstract),
            "KEY CONCEPTS" => Some(Section::KeyConcepts),
            "TOPICS" | "TOPIC CATEGORIES" | "CATEGORY" | "CATEGORIES" => Some(Section::Topics),
            "DETAILED SUMMARY" | "SUMMARY" => Some(Section::DetailedSummary),
            _ => None,
        }
    }
}

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:#+\s*)?(?:\*\*)?\s*(abstract|key\s+concepts|topic\s+categories|topics|categories|category|detailed\s+summary|summary)\s*(?:\*\*)?\s*:\s*(?:\*\*)?\s*(.*)$",
        )
        .expect("label regex is valid")
    })
}

/// Sections found in a response. Empty sections are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSections {
    pub abstract_text: Option<String>,
    pub key_concepts: Option<Vec<String>>,
    pub topics: Option<Vec<String>>,
    pub detailed_summary: Option<String>,
}

impl ParsedSections {
    /// Labels of the sections that are absent or empty.
    pub fn missing(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.abstract_text.is_none() {
            missing.push(Section::Abstract.label().to_string());
        }
        if self.key_concepts.is_none() {
            missing.push(Section::KeyConcepts.label().to_string());
        }
        if self.topics.is_none() {
            missing.push(Section::Topics.label().to_string());
        }
        if self.detailed_summary.is_none() {
            missing.push(Section::DetailedSummary.label().to_string());
        }
        missing
    }

    /// Build a partial summary, or report which sections are missing.
    pub fn into_partial(self, segment_index: usize) -> Result<PartialSummary, Vec<String>> {
        match self {
            ParsedSections {
                abstract_text: Some(abstract_text),
                key_concepts: Some(key_concepts),
                topics: Some(topics),
                detailed_summary: Some(detailed_summary),
            } => Ok(PartialSummary {
                abstract_text,
                key_concepts,
                topics,
                detailed_summary,
                segment_index,
            }),
            incomplete => Err(incomplete.missing()),
        }
    }
}

/// Split a response into its labeled sections.
///
/// Text before the first label is ignored. Each section opens once; a later
/// line carrying the same label stays in the body of the current section.
pub fn parse_sections(response: &str) -> ParsedSections {
    let mut parsed = ParsedSections::default();

    for (section, body) in split_sections(response) {
        match section {
            Section::Abstract => {
                parsed.abstract_text = parsed.abstract_text.or_else(|| non_empty(&body));
            }
            Section::DetailedSummary => {
                parsed.detailed_summary = parsed.detailed_summary.or_else(|| non_empty(&body));
            }
            Section::KeyConcepts => {
                parsed.key_concepts = parsed.key_concepts.or_else(|| list_items(&body));
            }
            Section::Topics => {
                parsed.topics = parsed.topics.or_else(|| list_items(&body));
            }
        }
    }

    parsed
}

/// Extract the labeled abstract from a merge response.
pub fn parse_abstract(response: &str) -> Option<String> {
    parse_sections(response).abstract_text
}

fn split_sections(response: &str) -> Vec<(Section, String)> {
    let mut sections: Vec<(Section, Vec<&str>)> = Vec::new();
    let mut seen: Vec<Section> = Vec::new();

    for line in response.lines() {
        let label = label_regex()
            .captures(line)
            .and_then(|caps| {
                let section = Section::from_label(caps.get(1)?.as_str())?;
                Some((section, caps.get(2).map_or("", |m| m.as_str())))
            });

        // A label for a section already opened is body text ("Summary: ..." in prose)
        match label {
            Some((section, rest)) if !seen.contains(&section) => {
                seen.push(section);
                sections.push((section, vec![rest]));
            }
            _ => {
                if let Some((_, body)) = sections.last_mut() {
                    body.push(line);
                }
            }
        }
    }

    sections
        .into_iter()
        .map(|(section, body)| (section, body.join("\n")))
        .collect()
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse a bulleted or comma-separated list.
fn list_items(body: &str) -> Option<Vec<String>> {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && *l != "...")
        .collect();

    let has_bullets = lines.iter().any(|l| strip_bullet(l).is_some());

    let raw: Vec<String> = if !has_bullets && lines.len() == 1 && lines[0].contains(',') {
        lines[0]
            .split(',')
            .map(|s| s.trim().trim_end_matches('.').trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    } else {
        lines
            .iter()
            .map(|l| strip_bullet(l).unwrap_or(l).trim_matches('*').trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    };

    let items = union_ignore_case(raw.iter());
    (!items.is_empty()).then_some(items)
}

/// Strip a leading `•`, `-`, `*` or `1.`/`1)` marker.
fn strip_bullet(line: &str) -> Option<&str> {
    for marker in ['•', '-', '*'] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim_start());
        }
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return Some(rest.trim_start());
        }
    }

    None
}
