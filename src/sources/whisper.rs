//! Speech-to-text fallback using the OpenAI Whisper API.

use super::TranscriptSource;
use crate::audio::{download_audio, split_audio};
use crate::config::TranscriptionSettings;
use crate::error::{RecapError, Result};
use crate::openai::create_client;
use crate::transcript::{Transcript, TranscriptLine, TranscriptOrigin};
use crate::video::VideoReference;
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// One transcribed span, relative to the start of its audio piece.
#[derive(Debug, Clone, PartialEq)]
struct RawSegment {
    start: f64,
    end: Option<f64>,
    text: String,
}

/// Result of transcribing a single audio piece.
#[derive(Debug)]
struct PieceTranscript {
    language: String,
    segments: Vec<RawSegment>,
}

/// Whisper-based transcript source.
///
/// Downloads the audio track, splits it into pieces the API accepts and
/// transcribes them concurrently. The transcript language is whatever Whisper
/// detects; the requested language is not forced on the model.
pub struct WhisperTranscriber {
    client: Client<OpenAIConfig>,
    model: String,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
    work_dir: PathBuf,
}

impl WhisperTranscriber {
    pub fn new(
        client: Client<OpenAIConfig>,
        model: &str,
        chunk_duration_seconds: u32,
        max_concurrent_chunks: usize,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            chunk_duration_seconds,
            max_concurrent_chunks: max_concurrent_chunks.max(1),
            work_dir,
        }
    }

    /// Build a transcriber from configuration. Fails if the API key is missing.
    pub fn from_settings(settings: &TranscriptionSettings, work_dir: PathBuf) -> Result<Self> {
        let client = create_client(&settings.endpoint())?;
        Ok(Self::new(
            client,
            &settings.model,
            settings.chunk_duration_seconds,
            settings.max_concurrent_chunks,
            work_dir,
        ))
    }

    /// Transcribe a single audio piece.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_piece(&self, audio_path: &Path) -> Result<PieceTranscript> {
        let file_bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(file_name, file_bytes))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .build()
            .map_err(|e| {
                RecapError::TranscriptionFailure(format!("Failed to build request: {}", e))
            })?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| RecapError::TranscriptionFailure(format!("Whisper API error: {}", e)))?;

        let segments = match response.segments {
            Some(segs) if !segs.is_empty() => segs
                .iter()
                .map(|s| RawSegment {
                    start: s.start as f64,
                    end: Some(s.end as f64),
                    text: s.text.trim().to_string(),
                })
                .collect(),
            // No segment timing: keep the whole text as one untimed line
            _ => vec![RawSegment {
                start: 0.0,
                end: None,
                text: response.text.trim().to_string(),
            }],
        };

        debug!("Transcribed {} segments", segments.len());
        Ok(PieceTranscript {
            language: language_code(&response.language),
            segments,
        })
    }

    /// Transcribe every piece with bounded concurrency, failing on the first error.
    async fn transcribe_pieces(
        &self,
        pieces: Vec<(PathBuf, f64)>,
    ) -> Result<Vec<(f64, PieceTranscript)>> {
        let piece_count = pieces.len();
        info!("Transcribing {} audio pieces with {}", piece_count, self.model);

        let pb = ProgressBar::new(piece_count as u64);
        if let Ok(style) =
            ProgressStyle::with_template("  {spinner:.green} Whisper   [{bar:30.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }

        let mut results: Vec<(usize, f64, PieceTranscript)> = Vec::with_capacity(piece_count);

        let mut stream = stream::iter(pieces.into_iter().enumerate())
            .map(|(idx, (path, offset))| async move {
                let result = self.transcribe_piece(&path).await;
                (idx, offset, result)
            })
            .buffer_unordered(self.max_concurrent_chunks);

        while let Some((idx, offset, result)) = stream.next().await {
            pb.inc(1);
            match result {
                Ok(piece) => results.push((idx, offset, piece)),
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(RecapError::TranscriptionFailure(format!(
                        "Piece {} at {:.0}s failed: {}",
                        idx, offset, e
                    )));
                }
            }
        }

        pb.finish_and_clear();
        results.sort_by_key(|(idx, _, _)| *idx);

        Ok(results
            .into_iter()
            .map(|(_, offset, piece)| (offset, piece))
            .collect())
    }
}

#[async_trait]
impl TranscriptSource for WhisperTranscriber {
    fn origin(&self) -> TranscriptOrigin {
        TranscriptOrigin::AudioTranscription
    }

    #[instrument(skip(self), fields(video = %video))]
    async fn fetch(&self, video: &VideoReference, language: &str) -> Result<Transcript> {
        debug!("Requested language {} is left to Whisper detection", language);

        std::fs::create_dir_all(&self.work_dir)?;
        // Removed with everything in it when this function returns
        let scratch = tempfile::Builder::new()
            .prefix("recap-audio-")
            .tempdir_in(&self.work_dir)?;

        let audio_path = download_audio(video, scratch.path()).await?;
        let pieces = split_audio(
            &audio_path,
            &scratch.path().join("pieces"),
            self.chunk_duration_seconds,
        )
        .await?;

        let transcribed = self.transcribe_pieces(pieces).await?;
        let detected = transcribed
            .iter()
            .map(|(_, p)| p.language.clone())
            .find(|l| !l.is_empty())
            .unwrap_or_else(|| language.to_string());

        let lines = build_lines(transcribed, &detected);
        if lines.is_empty() {
            return Err(RecapError::TranscriptionFailure(format!(
                "No speech recognized in {}",
                video.id
            )));
        }

        info!("Transcribed {} lines ({})", lines.len(), detected);
        Transcript::new(&video.id, &detected, TranscriptOrigin::AudioTranscription, lines)
    }
}

/// Shift piece-relative segments to video offsets and turn them into lines.
///
/// Empty segments are dropped and start offsets are clamped so they never go
/// backwards across piece boundaries.
fn build_lines(pieces: Vec<(f64, PieceTranscript)>, language: &str) -> Vec<TranscriptLine> {
    let mut lines = Vec::new();
    let mut last_start = Duration::ZERO;

    for (offset, piece) in pieces {
        for segment in piece.segments {
            if segment.text.is_empty() {
                continue;
            }

            let start = seconds(offset + segment.start).max(last_start);
            let end = segment.end.map(|e| seconds(offset + e).max(start));
            last_start = start;

            lines.push(TranscriptLine::new(
                segment.text,
                start,
                end,
                TranscriptOrigin::AudioTranscription,
                language,
            ));
        }
    }

    lines
}

fn seconds(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}

/// Whisper reports languages by English name; map the common ones to tags.
fn language_code(reported: &str) -> String {
    let name = reported.trim().to_ascii_lowercase();
    let code = match name.as_str() {
        "english" => "en",
        "french" => "fr",
        "german" => "de",
        "spanish" => "es",
        "italian" => "it",
        "portuguese" => "pt",
        "dutch" => "nl",
        "russian" => "ru",
        "chinese" => "zh",
        "japanese" => "ja",
        "korean" => "ko",
        "arabic" => "ar",
        "hindi" => "hi",
        "turkish" => "tr",
        "polish" => "pl",
        "swedish" => "sv",
        "norwegian" => "no",
        "danish" => "da",
        "finnish" => "fi",
        "ukrainian" => "uk",
        _ => return name,
    };
    code.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(segments: &[(f64, Option<f64>, &str)]) -> PieceTranscript {
        PieceTranscript {
            language: "en".to_string(),
            segments: segments
                .iter()
                .map(|(start, end, text)| RawSegment {
                    start: *start,
                    end: *end,
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_build_lines_applies_piece_offsets() {
        let lines = build_lines(
            vec![
                (0.0, piece(&[(0.0, Some(4.0), "first"), (4.0, Some(9.5), "second")])),
                (600.0, piece(&[(1.0, Some(3.0), "third")])),
            ],
            "en",
        );

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].text, "third");
        assert_eq!(lines[2].start_offset, Duration::from_secs(601));
        assert_eq!(lines[2].end_offset, Some(Duration::from_secs(603)));
        assert!(lines
            .iter()
            .all(|l| l.source == TranscriptOrigin::AudioTranscription && l.language == "en"));
    }

    #[test]
    fn test_build_lines_skips_empty_and_keeps_order() {
        let lines = build_lines(
            vec![
                (0.0, piece(&[(0.0, Some(2.0), ""), (5.0, Some(6.0), "a")])),
                // Overlapping piece boundary reports an earlier start
                (3.0, piece(&[(0.5, Some(1.0), "b")])),
            ],
            "en",
        );

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].start_offset, Duration::from_secs(5));
        assert!(lines[1].end_offset.unwrap() >= lines[1].start_offset);
    }

    #[test]
    fn test_build_lines_untimed_text() {
        let lines = build_lines(vec![(0.0, piece(&[(0.0, None, "whole text")]))], "fr");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].end_offset, None);
        assert_eq!(lines[0].language, "fr");
    }

    #[test]
    fn test_language_code() {
        assert_eq!(language_code("English"), "en");
        assert_eq!(language_code("french"), "fr");
        assert_eq!(language_code("klingon"), "klingon");
        assert_eq!(language_code("en"), "en");
    }
}
