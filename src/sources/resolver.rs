//! Chooses between captions and audio transcription.

use super::TranscriptSource;
use crate::error::{RecapError, Result};
use crate::transcript::{Transcript, TranscriptOrigin};
use crate::video::VideoReference;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Resolves one transcript per video, captions first.
pub struct TranscriptResolver {
    captions: Arc<dyn TranscriptSource>,
    audio: Arc<dyn TranscriptSource>,
    caption_timeout: Duration,
    transcription_timeout: Duration,
}

impl TranscriptResolver {
    pub fn new(
        captions: Arc<dyn TranscriptSource>,
        audio: Arc<dyn TranscriptSource>,
        caption_timeout: Duration,
        transcription_timeout: Duration,
    ) -> Self {
        Self {
            captions,
            audio,
            caption_timeout,
            transcription_timeout,
        }
    }

    /// Fetch a transcript for `video`.
    ///
    /// Captions are tried first. Only a missing track or language triggers the
    /// audio fallback; any other caption error is returned as is. When the
    /// fallback is disabled or fails too, the result is `TranscriptUnavailable`
    /// with the last underlying error as its source.
    #[instrument(skip(self), fields(video = %video))]
    pub async fn resolve(
        &self,
        video: &VideoReference,
        preferred_language: &str,
        allow_audio_fallback: bool,
    ) -> Result<Transcript> {
        let caption_error = match self.fetch_captions(video, preferred_language).await {
            Ok(transcript) => {
                info!(
                    "Using captions ({} lines, {})",
                    transcript.lines().len(),
                    transcript.language()
                );
                return Ok(transcript);
            }
            Err(e) if e.is_caption_unavailability() => e,
            Err(e) => return Err(e),
        };

        if !allow_audio_fallback {
            return Err(RecapError::TranscriptUnavailable {
                video_id: video.id.clone(),
                reason: "captions unavailable and audio fallback is disabled".to_string(),
                cause: Some(Box::new(caption_error)),
            });
        }

        warn!("{}; falling back to audio transcription", caption_error);

        match self.fetch_audio(video, preferred_language).await {
            Ok(transcript) => {
                info!("Using audio transcription ({} lines)", transcript.lines().len());
                Ok(transcript)
            }
            Err(e) => Err(RecapError::TranscriptUnavailable {
                video_id: video.id.clone(),
                reason: format!("captions unavailable ({}) and audio transcription failed", caption_error),
                cause: Some(Box::new(e)),
            }),
        }
    }

    async fn fetch_captions(&self, video: &VideoReference, language: &str) -> Result<Transcript> {
        let transcript =
            tokio::time::timeout(self.caption_timeout, self.captions.fetch(video, language))
                .await
                .map_err(|_| {
                    RecapError::ToolFailed(format!(
                        "Caption lookup timed out after {}s",
                        self.caption_timeout.as_secs()
                    ))
                })??;

        check_origin(self.captions.as_ref(), transcript, TranscriptOrigin::Captions)
            .map_err(RecapError::InvalidInput)
    }

    async fn fetch_audio(&self, video: &VideoReference, language: &str) -> Result<Transcript> {
        let transcript =
            tokio::time::timeout(self.transcription_timeout, self.audio.fetch(video, language))
                .await
                .map_err(|_| {
                    RecapError::TranscriptionFailure(format!(
                        "Audio transcription timed out after {}s",
                        self.transcription_timeout.as_secs()
                    ))
                })??;

        check_origin(
            self.audio.as_ref(),
            transcript,
            TranscriptOrigin::AudioTranscription,
        )
        .map_err(RecapError::TranscriptionFailure)
    }
}

/// A source must declare the origin its slot expects and stamp it on what it returns.
fn check_origin(
    source: &dyn TranscriptSource,
    transcript: Transcript,
    expected: TranscriptOrigin,
) -> std::result::Result<Transcript, String> {
    if source.origin() != expected {
        return Err(format!(
            "source for {:?} transcripts declares origin {:?}",
            expected,
            source.origin()
        ));
    }
    if transcript.origin() != expected {
        return Err(format!(
            "expected a {:?} transcript but got {:?}",
            expected,
            transcript.origin()
        ));
    }
    Ok(transcript)
}
