//! Splitting transcripts into segments that fit a bounded-context summarizer.
//!
//! Segments are built greedily from transcript lines. When a segment closes, the
//! next one repeats a few trailing lines of it so the summarizer sees some
//! context across the boundary.

mod greedy;

pub use greedy::Chunker;

use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::Duration;

/// How segment size is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitMeasure {
    /// Unicode scalar values, including the single space joining two lines.
    #[default]
    Characters,
    /// Whitespace-separated words.
    Words,
    /// Rough token estimate, four characters per token.
    Tokens,
}

impl UnitMeasure {
    /// Units taken by `text` on its own.
    pub fn measure(&self, text: &str) -> usize {
        match self {
            UnitMeasure::Characters => text.chars().count(),
            UnitMeasure::Words => text.split_whitespace().count(),
            UnitMeasure::Tokens => text.chars().count().div_ceil(4),
        }
    }

    /// Units added by the separator between two joined pieces.
    pub fn separator(&self) -> usize {
        match self {
            UnitMeasure::Characters => 1,
            UnitMeasure::Words | UnitMeasure::Tokens => 0,
        }
    }
}

impl std::str::FromStr for UnitMeasure {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "characters" | "chars" => Ok(UnitMeasure::Characters),
            "words" => Ok(UnitMeasure::Words),
            "tokens" => Ok(UnitMeasure::Tokens),
            _ => Err(format!("Unknown unit measure: {}", s)),
        }
    }
}

/// What to do with a single line larger than the segment budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OversizePolicy {
    /// Cut the line at whitespace into pieces that fit.
    #[default]
    Split,
    /// Give the line a segment of its own, over budget and without overlap.
    Isolate,
    /// Fail with `SegmentTooLarge`.
    Reject,
}

impl std::str::FromStr for OversizePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "split" => Ok(OversizePolicy::Split),
            "isolate" => Ok(OversizePolicy::Isolate),
            "reject" => Ok(OversizePolicy::Reject),
            _ => Err(format!("Unknown oversize policy: {}", s)),
        }
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkingConfig {
    /// Upper bound on units per segment.
    pub max_units_per_segment: usize,
    /// Units of trailing context repeated at the start of the next segment.
    pub overlap_units: usize,
    pub unit: UnitMeasure,
    pub oversize_policy: OversizePolicy,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_units_per_segment: 12_000,
            overlap_units: 500,
            unit: UnitMeasure::Characters,
            oversize_policy: OversizePolicy::Split,
        }
    }
}

/// A contiguous slice of transcript text sized for one summarization call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// Position of this segment, starting at 0.
    pub index: usize,
    /// Number of segments produced for the transcript.
    pub total_count: usize,
    /// Pieces joined by single spaces.
    pub text: String,
    /// Units consumed, separators included.
    pub units: usize,
    /// Leading pieces repeated from the previous segment.
    pub overlap_lines: usize,
    /// Units of those repeated pieces.
    pub overlap_units: usize,
    /// Transcript line indices covered.
    pub line_range: Range<usize>,
    pub start_offset: Duration,
    pub end_offset: Option<Duration>,
    /// The pieces making up `text`. A piece is a whole line unless the line had to
    /// be split.
    pub lines: Vec<String>,
}

impl Segment {
    /// Text contributed by this segment alone, without the repeated overlap.
    pub fn new_text(&self) -> String {
        self.lines[self.overlap_lines.min(self.lines.len())..].join(" ")
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total_count
    }
}
