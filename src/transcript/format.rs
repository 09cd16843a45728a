//! Transcript formats: export to text/JSON/SRT/VTT and WebVTT parsing.

use super::{Transcript, TranscriptOrigin};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Duration;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
    Srt,
    Vtt,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Srt => "srt",
            OutputFormat::Vtt => "vtt",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" | "webvtt" => Ok(OutputFormat::Vtt),
            _ => Err(format!("Unknown format: {}. Use text, json, srt, or vtt.", s)),
        }
    }
}

/// JSON-serializable transcript for export.
#[derive(Debug, Serialize)]
pub struct TranscriptExport {
    pub video_id: String,
    pub language: String,
    pub origin: TranscriptOrigin,
    pub duration_seconds: f64,
    pub lines: Vec<LineExport>,
}

#[derive(Debug, Serialize)]
pub struct LineExport {
    pub text: String,
    pub start_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_seconds: Option<f64>,
}

impl From<&Transcript> for TranscriptExport {
    fn from(transcript: &Transcript) -> Self {
        Self {
            video_id: transcript.video_id().to_string(),
            language: transcript.language().to_string(),
            origin: transcript.origin(),
            duration_seconds: transcript.duration().as_secs_f64(),
            lines: transcript
                .lines()
                .iter()
                .map(|l| LineExport {
                    text: l.text.clone(),
                    start_seconds: l.start_offset.as_secs_f64(),
                    end_seconds: l.end_offset.map(|d| d.as_secs_f64()),
                })
                .collect(),
        }
    }
}

/// Format a transcript for output.
pub fn format_transcript(transcript: &Transcript, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_text(transcript),
        OutputFormat::Json => format_json(transcript),
        OutputFormat::Srt => format_srt(transcript),
        OutputFormat::Vtt => format_vtt(transcript),
    }
}

/// Plain text, one line per transcript line, with a language header.
fn format_text(transcript: &Transcript) -> String {
    let mut output = format!("Language: {}\n\n", transcript.language());
    for line in transcript.lines() {
        output.push_str(line.text.trim());
        output.push('\n');
    }
    output
}

fn format_json(transcript: &Transcript) -> String {
    let export = TranscriptExport::from(transcript);
    serde_json::to_string_pretty(&export).unwrap_or_else(|_| "{}".to_string())
}

/// Cue timings for subtitle formats. Lines without an end run until the next line starts.
fn cue_times(transcript: &Transcript) -> Vec<(Duration, Duration)> {
    let lines = transcript.lines();
    lines
        .iter()
        .enumerate()
        .map(|(i, l)| {
            let end = l
                .end_offset
                .or_else(|| lines.get(i + 1).map(|next| next.start_offset))
                .unwrap_or(l.start_offset);
            (l.start_offset, end.max(l.start_offset))
        })
        .collect()
}

/// Format as SRT (SubRip).
fn format_srt(transcript: &Transcript) -> String {
    let mut output = String::new();

    for (i, (line, (start, end))) in transcript
        .lines()
        .iter()
        .zip(cue_times(transcript))
        .enumerate()
    {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_cue_timestamp(start, ','),
            format_cue_timestamp(end, ',')
        ));
        output.push_str(&line.text);
        output.push_str("\n\n");
    }

    output
}

/// Format as WebVTT.
fn format_vtt(transcript: &Transcript) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for (i, (line, (start, end))) in transcript
        .lines()
        .iter()
        .zip(cue_times(transcript))
        .enumerate()
    {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_cue_timestamp(start, '.'),
            format_cue_timestamp(end, '.')
        ));
        output.push_str(&line.text);
        output.push_str("\n\n");
    }

    output
}

/// Format a cue timestamp (00:00:00,000 for SRT, 00:00:00.000 for VTT).
fn format_cue_timestamp(offset: Duration, ms_separator: char) -> String {
    let total_ms = offset.as_millis() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, minutes, secs, ms_separator, ms
    )
}

// ============================================================================
// WebVTT parsing
// ============================================================================

/// One caption cue read from a WebVTT file.
#[derive(Debug, Clone, PartialEq)]
pub struct VttCue {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

fn timing_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^((?:\d+:)?\d{1,2}:\d{2}[.,]\d{3})\s+-->\s+((?:\d+:)?\d{1,2}:\d{2}[.,]\d{3})")
            .expect("Invalid regex")
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid regex"))
}

/// Parse `HH:MM:SS.mmm` or `MM:SS.mmm`.
fn parse_cue_timestamp(s: &str) -> Option<Duration> {
    let s = s.replace(',', ".");
    let (hms, ms) = s.split_once('.')?;
    let parts: Vec<u64> = hms
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    let seconds = match parts.as_slice() {
        [h, m, s] => h * 3600 + m * 60 + s,
        [m, s] => m * 60 + s,
        _ => return None,
    };
    let millis: u64 = ms.parse().ok()?;

    Some(Duration::from_millis(seconds * 1000 + millis))
}

/// Parse a WebVTT document into cues.
///
/// Inline styling and word-timing tags are stripped and cues left empty are
/// skipped. Auto-generated tracks repeat the previous caption line at the top of
/// each cue; with `collapse_repeats` a line identical to the last emitted one is
/// dropped. Manual tracks keep every line, including legitimate repeats.
pub fn parse_vtt(content: &str, collapse_repeats: bool) -> Vec<VttCue> {
    let mut cues = Vec::new();
    let mut last_line = String::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(caps) = timing_regex().captures(line.trim()) else {
            continue;
        };
        let (Some(start), Some(end)) = (
            parse_cue_timestamp(&caps[1]),
            parse_cue_timestamp(&caps[2]),
        ) else {
            continue;
        };

        let mut text_lines = Vec::new();
        while let Some(next) = lines.peek() {
            if next.trim().is_empty() {
                break;
            }
            let cleaned = tag_regex().replace_all(next.trim(), "");
            let cleaned = decode_entities(&cleaned)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            lines.next();

            if cleaned.is_empty() || (collapse_repeats && cleaned == last_line) {
                continue;
            }
            last_line = cleaned.clone();
            text_lines.push(cleaned);
        }

        if !text_lines.is_empty() {
            cues.push(VttCue {
                start,
                end,
                text: text_lines.join(" "),
            });
        }
    }

    cues
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}
