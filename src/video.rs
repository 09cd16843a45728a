//! Video references.
//!
//! The pipeline only needs a stable identifier; this module turns the URL forms
//! people paste into one.

use crate::error::{RecapError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Immutable identifier of the video to summarize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoReference {
    /// Platform video id (11 characters for YouTube).
    pub id: String,
    /// Canonical watch URL handed to external tools.
    pub url: String,
}

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Matches various YouTube URL formats and bare video IDs
        Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex")
    })
}

impl VideoReference {
    /// Build a reference from a known YouTube id.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        let url = format!("https://www.youtube.com/watch?v={}", id);
        Self { id, url }
    }

    /// Parse a YouTube URL or bare video id.
    pub fn parse(input: &str) -> Result<Self> {
        Self::extract_id(input)
            .map(Self::from_id)
            .ok_or_else(|| RecapError::InvalidInput(format!("Invalid YouTube URL or video ID: {}", input)))
    }

    /// Extract the video id from a URL or bare id.
    pub fn extract_id(input: &str) -> Option<String> {
        let caps = video_id_regex().captures(input.trim())?;

        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }
}

impl std::fmt::Display for VideoReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl std::str::FromStr for VideoReference {
    type Err = RecapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        for input in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "  dQw4w9WgXcQ  ",
        ] {
            assert_eq!(
                VideoReference::extract_id(input),
                Some("dQw4w9WgXcQ".to_string()),
                "input: {input}"
            );
        }

        assert_eq!(VideoReference::extract_id("not-a-video-id"), None);
        assert_eq!(VideoReference::extract_id(""), None);
    }

    #[test]
    fn test_parse_builds_canonical_url() {
        let video: VideoReference = "https://youtu.be/dQw4w9WgXcQ?t=42".parse().unwrap();
        assert_eq!(video.id, "dQw4w9WgXcQ");
        assert_eq!(video.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(video.to_string(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = VideoReference::parse("/path/to/video.mp4").unwrap_err();
        assert!(matches!(err, RecapError::InvalidInput(_)));
    }
}
