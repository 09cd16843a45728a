//! Transcript sources.
//!
//! Captions and audio transcription are two implementations of one capability,
//! [`TranscriptSource`]. The [`TranscriptResolver`] picks between them.

mod captions;
mod resolver;
mod whisper;

pub use captions::{CaptionListing, CaptionTrack, TrackKind, YtDlpCaptions};
pub use resolver::TranscriptResolver;
pub use whisper::WhisperTranscriber;

use crate::error::Result;
use crate::transcript::{Transcript, TranscriptOrigin};
use crate::video::VideoReference;
use async_trait::async_trait;

/// Something that can produce a transcript for a video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Origin stamped on every line this source returns.
    fn origin(&self) -> TranscriptOrigin;

    /// Fetch a transcript, preferably in `language`.
    ///
    /// Caption sources report missing tracks as `CaptionsNotAvailable` or
    /// `LanguageNotAvailable`. Audio sources may treat `language` as a hint or
    /// ignore it.
    async fn fetch(&self, video: &VideoReference, language: &str) -> Result<Transcript>;
}
