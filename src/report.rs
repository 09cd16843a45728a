//! Rendering of the analysis report written next to the transcript.

use crate::error::{RecapError, Result};
use crate::pipeline::PipelineOutput;
use crate::summary::Summary;
use crate::transcript::TranscriptOrigin;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = RecapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(RecapError::InvalidInput(format!("Unknown report format: {}", s))),
        }
    }
}

/// Everything the analysis file records about one run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub video_id: String,
    pub language: String,
    pub transcript_source: TranscriptOrigin,
    pub segment_count: usize,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: Summary,
}

impl AnalysisReport {
    pub fn from_output(output: &PipelineOutput) -> Self {
        Self {
            video_id: output.transcript.video_id().to_string(),
            language: output.transcript.language().to_string(),
            transcript_source: output.transcript.origin(),
            segment_count: output.segment_count,
            generated_at: Utc::now(),
            summary: output.summary.clone(),
        }
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    /// Plain-text layout with one labeled block per section.
    pub fn to_text(&self) -> String {
        let summary = &self.summary;
        let mut out = String::new();

        let _ = writeln!(out, "=== TRANSCRIPT ANALYSIS (Language: {}) ===\n", self.language);
        let _ = writeln!(out, "ABSTRACT:\n{}\n", or_not_available(&summary.abstract_text));
        let _ = writeln!(out, "KEY CONCEPTS:\n{}\n", bullets(&summary.key_concepts));
        let _ = writeln!(out, "TOPICS:\n{}\n", bullets(&summary.topics));
        let _ = writeln!(
            out,
            "DETAILED SUMMARY:\n{}",
            or_not_available(&summary.detailed_summary)
        );

        out
    }
}

fn bullets(items: &[String]) -> String {
    if items.is_empty() {
        return "Not available".to_string();
    }
    items
        .iter()
        .map(|i| format!("• {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

fn or_not_available(text: &str) -> &str {
    if text.trim().is_empty() {
        "Not available"
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> AnalysisReport {
        AnalysisReport {
            video_id: "dQw4w9WgXcQ".to_string(),
            language: "en".to_string(),
            transcript_source: TranscriptOrigin::Captions,
            segment_count: 2,
            generated_at: Utc::now(),
            summary: Summary {
                abstract_text: "A song.".to_string(),
                key_concepts: vec!["Commitment".to_string(), "Honesty".to_string()],
                topics: vec![],
                detailed_summary: "The singer promises a lot.".to_string(),
            },
        }
    }

    #[test]
    fn test_text_layout() {
        let text = report().to_text();

        assert!(text.starts_with("=== TRANSCRIPT ANALYSIS (Language: en) ===\n\nABSTRACT:\nA song.\n"));
        assert!(text.contains("KEY CONCEPTS:\n• Commitment\n• Honesty\n"));
        assert!(text.contains("TOPICS:\nNot available\n"));
        assert!(text.ends_with("DETAILED SUMMARY:\nThe singer promises a lot.\n"));
    }

    #[test]
    fn test_json_report() {
        let json = report().render(ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["video_id"], "dQw4w9WgXcQ");
        assert_eq!(value["transcript_source"], "captions");
        assert_eq!(value["abstract"], "A song.");
        assert_eq!(value["key_concepts"][1], "Honesty");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("txt".parse::<ReportFormat>().unwrap().extension(), "txt");
        assert!("yaml".parse::<ReportFormat>().is_err());
    }
}
