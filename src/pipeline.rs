//! Pipeline controller for Recap.
//!
//! Composes transcript resolution, chunking and summarization. The pipeline has
//! no retries of its own and surfaces every error unchanged.

use crate::chunking::{Chunker, ChunkingConfig};
use crate::config::{Prompts, Settings};
use crate::error::{RecapError, Result};
use crate::sources::{TranscriptResolver, TranscriptSource, WhisperTranscriber, YtDlpCaptions};
use crate::summary::{OpenAiBackend, RetryPolicy, Summary, SummaryOrchestrator};
use crate::transcript::{Transcript, TranscriptOrigin};
use crate::video::VideoReference;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Transcript and summary for one video.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub transcript: Transcript,
    pub summary: Summary,
    /// Number of segments the transcript was split into.
    pub segment_count: usize,
}

/// Resolver → Chunker → Orchestrator.
pub struct Pipeline {
    resolver: TranscriptResolver,
    summarizer: SummaryOrchestrator,
}

impl Pipeline {
    pub fn new(resolver: TranscriptResolver, summarizer: SummaryOrchestrator) -> Self {
        Self {
            resolver,
            summarizer,
        }
    }

    /// Wire the default yt-dlp, Whisper and chat-completion adapters.
    ///
    /// Fails when the summarization API key is missing.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let backend = Arc::new(OpenAiBackend::from_settings(&settings.summary)?);
        let summarizer = SummaryOrchestrator::new(backend)
            .with_prompts(prompts)
            .with_retry_policy(RetryPolicy::from(&settings.summary.retry))
            .with_call_timeout(settings.summary.timeout())
            .with_rolling_context(settings.summary.rolling_context)
            .with_max_concurrency(settings.summary.max_concurrency);

        Ok(Self::new(resolver_from_settings(settings), summarizer))
    }

    pub fn resolver(&self) -> &TranscriptResolver {
        &self.resolver
    }

    /// Resolve, chunk and summarize one video.
    ///
    /// The chunking configuration is validated before any network call.
    #[instrument(skip(self, chunk_config), fields(video = %video))]
    pub async fn run(
        &self,
        video: &VideoReference,
        language: &str,
        fallback_enabled: bool,
        chunk_config: &ChunkingConfig,
    ) -> Result<PipelineOutput> {
        let chunker = Chunker::new(chunk_config.clone())?;

        let transcript = self.resolver.resolve(video, language, fallback_enabled).await?;
        info!(
            "Transcript has {} lines from {}",
            transcript.lines().len(),
            transcript.origin()
        );

        let segments = chunker.split(&transcript)?;
        info!("Summarizing {} segments", segments.len());

        let summary = self
            .summarizer
            .summarize(&segments, transcript.language())
            .await?;

        Ok(PipelineOutput {
            segment_count: segments.len(),
            transcript,
            summary,
        })
    }
}

/// Build the default transcript resolver.
///
/// A missing transcription API key only matters once the audio fallback is
/// needed, so it is reported then instead of here.
pub fn resolver_from_settings(settings: &Settings) -> TranscriptResolver {
    let captions = Arc::new(YtDlpCaptions::with_config(settings.captions.prefer_manual));

    let audio: Arc<dyn TranscriptSource> =
        match WhisperTranscriber::from_settings(&settings.transcription, settings.temp_dir()) {
            Ok(whisper) => Arc::new(whisper),
            Err(e) => {
                warn!("Audio transcription unavailable: {}", e);
                Arc::new(UnconfiguredSource {
                    reason: e.to_string(),
                })
            }
        };

    TranscriptResolver::new(
        captions,
        audio,
        settings.captions.timeout(),
        settings.transcription.timeout(),
    )
}

/// Audio source standing in for a transcriber that could not be built.
struct UnconfiguredSource {
    reason: String,
}

#[async_trait]
impl TranscriptSource for UnconfiguredSource {
    fn origin(&self) -> TranscriptOrigin {
        TranscriptOrigin::AudioTranscription
    }

    async fn fetch(&self, _video: &VideoReference, _language: &str) -> Result<Transcript> {
        Err(RecapError::Config(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{BackendError, SummarizationBackend};
    use crate::transcript::TranscriptLine;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    struct FixedSource {
        origin: TranscriptOrigin,
        texts: Vec<String>,
        available: bool,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn new(origin: TranscriptOrigin, texts: &[&str], available: bool) -> Arc<Self> {
            Arc::new(Self {
                origin,
                texts: texts.iter().map(|s| s.to_string()).collect(),
                available,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TranscriptSource for FixedSource {
        fn origin(&self) -> TranscriptOrigin {
            self.origin
        }

        async fn fetch(&self, video: &VideoReference, language: &str) -> Result<Transcript> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.available {
                return Err(RecapError::CaptionsNotAvailable(video.id.clone()));
            }
            let lines = self
                .texts
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    TranscriptLine::new(
                        t.clone(),
                        Duration::from_secs(i as u64 * 3),
                        None,
                        self.origin,
                        language,
                    )
                })
                .collect();
            Transcript::new(&video.id, language, self.origin, lines)
        }
    }

    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SummarizationBackend for CountingBackend {
        async fn complete(
            &self,
            _prompt: &str,
            _timeout: Duration,
        ) -> std::result::Result<String, BackendError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!(
                "ABSTRACT:\nAbstract {n}\n\nKEY CONCEPTS:\n• Concept {n}\n\nTOPICS:\n• Topic\n\nDETAILED SUMMARY:\nDetail {n}"
            ))
        }
    }

    fn pipeline(
        captions: Arc<FixedSource>,
        audio: Arc<FixedSource>,
        backend: Arc<CountingBackend>,
    ) -> Pipeline {
        let resolver = TranscriptResolver::new(
            captions,
            audio,
            Duration::from_secs(5),
            Duration::from_secs(5),
        );
        Pipeline::new(resolver, SummaryOrchestrator::new(backend))
    }

    fn backend() -> Arc<CountingBackend> {
        Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_run_single_segment() {
        let captions = FixedSource::new(TranscriptOrigin::Captions, &["hello", "world"], true);
        let audio = FixedSource::new(TranscriptOrigin::AudioTranscription, &[], true);
        let backend = backend();

        let output = assert_ok!(
            pipeline(captions, audio.clone(), backend.clone())
                .run(
                    &VideoReference::from_id("dQw4w9WgXcQ"),
                    "en",
                    true,
                    &ChunkingConfig::default(),
                )
                .await
        );

        assert_eq!(output.segment_count, 1);
        assert_eq!(output.transcript.full_text(), "hello world");
        assert_eq!(output.summary.abstract_text, "Abstract 0");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(audio.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_multi_segment_with_fallback() {
        let captions = FixedSource::new(TranscriptOrigin::Captions, &[], false);
        let audio = FixedSource::new(
            TranscriptOrigin::AudioTranscription,
            &["one two three", "four five six", "seven eight nine"],
            true,
        );
        let backend = backend();
        let config = ChunkingConfig {
            max_units_per_segment: 20,
            overlap_units: 0,
            ..ChunkingConfig::default()
        };

        let output = pipeline(captions, audio.clone(), backend.clone())
            .run(&VideoReference::from_id("dQw4w9WgXcQ"), "fr", true, &config)
            .await
            .unwrap();

        assert_eq!(audio.calls.load(Ordering::SeqCst), 1);
        assert_eq!(output.transcript.origin(), TranscriptOrigin::AudioTranscription);
        assert_eq!(output.segment_count, 3);
        // Three segment calls plus the abstract merge
        assert_eq!(backend.calls.load(Ordering::SeqCst), 4);
        assert_eq!(output.summary.key_concepts.len(), 3);
        assert_eq!(output.summary.topics, vec!["Topic"]);
    }

    #[tokio::test]
    async fn test_invalid_chunking_fails_before_fetching() {
        let captions = FixedSource::new(TranscriptOrigin::Captions, &["hello"], true);
        let audio = FixedSource::new(TranscriptOrigin::AudioTranscription, &[], true);
        let config = ChunkingConfig {
            max_units_per_segment: 100,
            overlap_units: 100,
            ..ChunkingConfig::default()
        };

        let err = assert_err!(
            pipeline(captions.clone(), audio, backend())
                .run(&VideoReference::from_id("dQw4w9WgXcQ"), "en", true, &config)
                .await
        );

        assert!(matches!(err, RecapError::InvalidConfiguration(_)));
        assert_eq!(captions.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_transcript_is_invalid_input() {
        let captions = FixedSource::new(TranscriptOrigin::Captions, &["  ", ""], true);
        let audio = FixedSource::new(TranscriptOrigin::AudioTranscription, &[], true);
        let backend = backend();

        let err = pipeline(captions, audio, backend.clone())
            .run(
                &VideoReference::from_id("dQw4w9WgXcQ"),
                "en",
                true,
                &ChunkingConfig::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RecapError::InvalidInput(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_audio_source() {
        let source = UnconfiguredSource {
            reason: "OPENAI_API_KEY is not set".to_string(),
        };
        let err = source
            .fetch(&VideoReference::from_id("dQw4w9WgXcQ"), "en")
            .await
            .unwrap_err();
        assert!(matches!(err, RecapError::Config(_)));
        assert_eq!(source.origin(), TranscriptOrigin::AudioTranscription);
    }
}
