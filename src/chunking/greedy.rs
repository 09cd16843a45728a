//! Greedy, overlap-aware segmentation.

use super::{ChunkingConfig, OversizePolicy, Segment};
use crate::error::{RecapError, Result};
use crate::transcript::Transcript;
use std::time::Duration;
use tracing::debug;

/// A unit of text that is never split further: a whole line, or part of an
/// oversized line.
#[derive(Debug, Clone)]
struct Piece {
    text: String,
    line: usize,
    start: Duration,
    end: Option<Duration>,
    units: usize,
    isolated: bool,
}

/// Pieces `start..end` of one segment; the first `overlap` are repeated.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    start: usize,
    overlap: usize,
    end: usize,
}

/// Splits transcripts into [`Segment`]s according to a [`ChunkingConfig`].
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Validate the configuration and create a chunker.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.max_units_per_segment == 0 {
            return Err(RecapError::InvalidConfiguration(
                "max_units_per_segment must be greater than zero".to_string(),
            ));
        }
        if config.overlap_units >= config.max_units_per_segment {
            return Err(RecapError::InvalidConfiguration(format!(
                "overlap_units ({}) must be smaller than max_units_per_segment ({})",
                config.overlap_units, config.max_units_per_segment
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split a transcript into ordered segments.
    ///
    /// A transcript without text yields no segments; one that fits the budget
    /// yields exactly one.
    pub fn split(&self, transcript: &Transcript) -> Result<Vec<Segment>> {
        let pieces = self.pieces(transcript)?;
        if pieces.is_empty() {
            return Ok(Vec::new());
        }

        let spans = self.plan(&pieces);
        let total_count = spans.len();
        let segments: Vec<Segment> = spans
            .into_iter()
            .enumerate()
            .map(|(index, span)| self.build(&pieces, span, index, total_count))
            .collect();

        debug!(
            "Split {} lines into {} segments",
            transcript.lines().len(),
            segments.len()
        );
        Ok(segments)
    }

    /// Turn transcript lines into pieces, applying the oversize policy.
    fn pieces(&self, transcript: &Transcript) -> Result<Vec<Piece>> {
        let max = self.config.max_units_per_segment;
        let unit = self.config.unit;
        let mut pieces = Vec::new();

        for (idx, line) in transcript.lines().iter().enumerate() {
            let text = line.text.trim();
            if text.is_empty() {
                continue;
            }

            let units = unit.measure(text);
            let piece = |text: String, units: usize, isolated: bool| Piece {
                text,
                line: idx,
                start: line.start_offset,
                end: line.end_offset,
                units,
                isolated,
            };

            if units <= max {
                pieces.push(piece(text.to_string(), units, false));
                continue;
            }

            match self.config.oversize_policy {
                OversizePolicy::Reject => {
                    return Err(RecapError::SegmentTooLarge {
                        line: idx,
                        units,
                        max_units: max,
                    });
                }
                OversizePolicy::Isolate => {
                    debug!("Line {} ({} units) gets a segment of its own", idx, units);
                    pieces.push(piece(text.to_string(), units, true));
                }
                OversizePolicy::Split => {
                    for part in self.split_line(text, idx)? {
                        let units = unit.measure(&part);
                        pieces.push(piece(part, units, false));
                    }
                }
            }
        }

        Ok(pieces)
    }

    /// Cut an oversized line at whitespace into parts that fit the budget.
    fn split_line(&self, text: &str, line: usize) -> Result<Vec<String>> {
        let max = self.config.max_units_per_segment;
        let unit = self.config.unit;
        let mut parts = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            let word_units = unit.measure(word);
            if word_units > max {
                return Err(RecapError::SegmentTooLarge {
                    line,
                    units: word_units,
                    max_units: max,
                });
            }

            if current.is_empty() {
                current.push_str(word);
                continue;
            }

            let candidate = format!("{} {}", current, word);
            if unit.measure(&candidate) <= max {
                current = candidate;
            } else {
                parts.push(std::mem::replace(&mut current, word.to_string()));
            }
        }

        if !current.is_empty() {
            parts.push(current);
        }
        Ok(parts)
    }

    /// Units of consecutive pieces joined with separators.
    fn span_units(&self, pieces: &[Piece]) -> usize {
        let sum: usize = pieces.iter().map(|p| p.units).sum();
        sum + self.config.unit.separator() * pieces.len().saturating_sub(1)
    }

    /// Greedy accumulation over the pieces.
    fn plan(&self, pieces: &[Piece]) -> Vec<Span> {
        let max = self.config.max_units_per_segment;
        let separator = self.config.unit.separator();
        let mut spans = Vec::new();
        let mut start = 0;
        let mut overlap = 0;
        let mut current = 0;

        for (i, piece) in pieces.iter().enumerate() {
            if piece.isolated {
                if i > start + overlap {
                    spans.push(Span { start, overlap, end: i });
                }
                spans.push(Span {
                    start: i,
                    overlap: 0,
                    end: i + 1,
                });
                start = i + 1;
                overlap = 0;
                current = 0;
                continue;
            }

            if i == start {
                current = piece.units;
                continue;
            }

            let grown = current + separator + piece.units;
            if grown <= max {
                current = grown;
                continue;
            }

            spans.push(Span { start, overlap, end: i });
            overlap = self.carry(&pieces[start..i], piece);
            start = i - overlap;
            current = self.span_units(&pieces[start..=i]);
        }

        if pieces.len() > start + overlap {
            spans.push(Span {
                start,
                overlap,
                end: pieces.len(),
            });
        }

        spans
    }

    /// Number of trailing pieces of a closed segment to repeat before `next`.
    fn carry(&self, closed: &[Piece], next: &Piece) -> usize {
        let max = self.config.max_units_per_segment;
        let separator = self.config.unit.separator();

        let mut count = 0;
        while count < closed.len()
            && self.span_units(&closed[closed.len() - count - 1..]) <= self.config.overlap_units
        {
            count += 1;
        }

        while count > 0
            && self.span_units(&closed[closed.len() - count..]) + separator + next.units > max
        {
            count -= 1;
        }

        count
    }

    fn build(&self, pieces: &[Piece], span: Span, index: usize, total_count: usize) -> Segment {
        let slice = &pieces[span.start..span.end];
        let lines: Vec<String> = slice.iter().map(|p| p.text.clone()).collect();
        let first = &slice[0];
        let last = &slice[slice.len() - 1];

        Segment {
            index,
            total_count,
            text: lines.join(" "),
            units: self.span_units(slice),
            overlap_lines: span.overlap,
            overlap_units: if span.overlap > 0 {
                self.span_units(&slice[..span.overlap])
            } else {
                0
            },
            line_range: first.line..last.line + 1,
            start_offset: first.start,
            end_offset: last.end,
            lines,
        }
    }
}
