//! Data models for transcripts.

use crate::error::{RecapError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the lines of a transcript came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptOrigin {
    /// Platform-provided caption track.
    Captions,
    /// Speech-to-text over the audio track.
    AudioTranscription,
}

impl std::fmt::Display for TranscriptOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptOrigin::Captions => write!(f, "captions"),
            TranscriptOrigin::AudioTranscription => write!(f, "audio transcription"),
        }
    }
}

/// A single timed line of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    /// Line text.
    pub text: String,
    /// Offset from the start of the video.
    pub start_offset: Duration,
    /// End offset, when the source reports one.
    pub end_offset: Option<Duration>,
    /// Producer of this line.
    pub source: TranscriptOrigin,
    /// Locale tag, e.g. `en` or `pt-BR`.
    pub language: String,
}

impl TranscriptLine {
    /// Create a new transcript line.
    pub fn new(
        text: impl Into<String>,
        start_offset: Duration,
        end_offset: Option<Duration>,
        source: TranscriptOrigin,
        language: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            start_offset,
            end_offset,
            source,
            language: language.into(),
        }
    }
}

/// A complete transcript for one video.
///
/// Lines are ordered by `start_offset` and share a single origin. Both are
/// checked by [`Transcript::new`]; there is no way to mutate the lines afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    video_id: String,
    language: String,
    origin: TranscriptOrigin,
    lines: Vec<TranscriptLine>,
}

impl Transcript {
    /// Create a transcript, enforcing line ordering and a uniform origin.
    pub fn new(
        video_id: impl Into<String>,
        language: impl Into<String>,
        origin: TranscriptOrigin,
        lines: Vec<TranscriptLine>,
    ) -> Result<Self> {
        if let Some(pos) = lines.iter().position(|l| l.source != origin) {
            return Err(RecapError::InvalidInput(format!(
                "transcript line {} comes from {} but the transcript is {}",
                pos, lines[pos].source, origin
            )));
        }

        if let Some(pos) = lines
            .windows(2)
            .position(|w| w[1].start_offset < w[0].start_offset)
        {
            return Err(RecapError::InvalidInput(format!(
                "transcript line {} starts before line {}",
                pos + 1,
                pos
            )));
        }

        Ok(Self {
            video_id: video_id.into(),
            language: language.into(),
            origin,
            lines,
        })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn origin(&self) -> TranscriptOrigin {
        self.origin
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.text.trim().is_empty())
    }

    /// Full transcript text, lines joined with single spaces.
    pub fn full_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Duration covered by the transcript, as far as timing is known.
    pub fn duration(&self) -> Duration {
        self.lines
            .last()
            .map(|l| l.end_offset.unwrap_or(l.start_offset))
            .unwrap_or_default()
    }

    /// Format the transcript with timestamps for display.
    pub fn format_with_timestamps(&self) -> String {
        self.lines
            .iter()
            .map(|l| format!("[{}] {}", format_timestamp(l.start_offset), l.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Format a duration as MM:SS or HH:MM:SS.
pub fn format_timestamp(offset: Duration) -> String {
    let total_seconds = offset.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
