//! Error types for Recap.

use crate::summary::BackendError;
use thiserror::Error;

/// Library-level error type for Recap operations.
#[derive(Error, Debug)]
pub enum RecapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid chunking configuration: {0}")]
    InvalidConfiguration(String),

    #[error("No captions available for video {0}")]
    CaptionsNotAvailable(String),

    #[error("Captions for video {video_id} are not available in '{requested}' (available: {})", available.join(", "))]
    LanguageNotAvailable {
        video_id: String,
        requested: String,
        available: Vec<String>,
    },

    #[error("Transcript unavailable for video {video_id}: {reason}")]
    TranscriptUnavailable {
        video_id: String,
        reason: String,
        #[source]
        cause: Option<Box<RecapError>>,
    },

    #[error("Transcription failed: {0}")]
    TranscriptionFailure(String),

    #[error("Line {line} needs {units} units but segments are limited to {max_units}")]
    SegmentTooLarge {
        line: usize,
        units: usize,
        max_units: usize,
    },

    #[error("Summarization failed for segment {segment}: {source}")]
    SummarizationFailed {
        segment: usize,
        attempts: u32,
        #[source]
        source: BackendError,
    },

    #[error("Could not parse summary for segment {segment}: missing {}", missing.join(", "))]
    SummaryParseFailure {
        segment: usize,
        missing: Vec<String>,
    },

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl RecapError {
    /// Whether rerunning the same request could plausibly succeed.
    ///
    /// Configuration and input errors need the caller to change something first.
    pub fn is_retryable(&self) -> bool {
        match self {
            RecapError::SummarizationFailed { source, .. } => source.is_transient(),
            RecapError::SummaryParseFailure { .. }
            | RecapError::TranscriptionFailure(_)
            | RecapError::AudioDownload(_)
            | RecapError::Http(_) => true,
            RecapError::TranscriptUnavailable { cause, .. } => {
                cause.as_ref().is_some_and(|c| c.is_retryable())
            }
            _ => false,
        }
    }

    /// Whether the captions adapter reported that nothing usable exists.
    pub fn is_caption_unavailability(&self) -> bool {
        matches!(
            self,
            RecapError::CaptionsNotAvailable(_) | RecapError::LanguageNotAvailable { .. }
        )
    }
}

/// Result type alias for Recap operations.
pub type Result<T> = std::result::Result<T, RecapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_unavailability() {
        assert!(RecapError::CaptionsNotAvailable("abc".into()).is_caption_unavailability());
        assert!(RecapError::LanguageNotAvailable {
            video_id: "abc".into(),
            requested: "fr".into(),
            available: vec!["en".into()],
        }
        .is_caption_unavailability());
        assert!(!RecapError::ToolNotFound("yt-dlp".into()).is_caption_unavailability());
    }

    #[test]
    fn test_retryable_classification() {
        let auth = RecapError::SummarizationFailed {
            segment: 0,
            attempts: 1,
            source: BackendError::Auth("bad key".into()),
        };
        assert!(!auth.is_retryable());

        let limited = RecapError::SummarizationFailed {
            segment: 2,
            attempts: 4,
            source: BackendError::RateLimited("slow down".into()),
        };
        assert!(limited.is_retryable());

        assert!(!RecapError::InvalidConfiguration("overlap".into()).is_retryable());
    }

    #[test]
    fn test_unavailable_keeps_cause() {
        use std::error::Error;

        let err = RecapError::TranscriptUnavailable {
            video_id: "abc".into(),
            reason: "audio transcription failed".into(),
            cause: Some(Box::new(RecapError::TranscriptionFailure("whisper".into()))),
        };
        assert!(err.source().is_some());
        assert!(err.is_retryable());
    }
}
