//! Drives segments through a summarization backend and merges the results.

use super::backend::SummarizationBackend;
use super::models::{PartialSummary, Summary};
use super::parse::{parse_abstract, parse_sections};
use super::retry::RetryPolicy;
use crate::chunking::Segment;
use crate::config::Prompts;
use crate::error::{RecapError, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default timeout for a single backend call.
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Summarizes transcript segments into one [`Summary`].
///
/// With rolling context each segment prompt includes the previous segment's
/// detailed summary, so segments run one after the other. Without it they run
/// concurrently up to `max_concurrency`.
pub struct SummaryOrchestrator {
    backend: Arc<dyn SummarizationBackend>,
    prompts: Prompts,
    retry: RetryPolicy,
    call_timeout: Duration,
    rolling_context: bool,
    max_concurrency: usize,
}

impl SummaryOrchestrator {
    pub fn new(backend: Arc<dyn SummarizationBackend>) -> Self {
        Self {
            backend,
            prompts: Prompts::default(),
            retry: RetryPolicy::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            rolling_context: true,
            max_concurrency: 3,
        }
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_rolling_context(mut self, enabled: bool) -> Self {
        self.rolling_context = enabled;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Summarize all segments of one transcript written in `language`.
    ///
    /// Any segment that cannot be summarized aborts the whole call.
    #[instrument(skip(self, segments), fields(count = segments.len()))]
    pub async fn summarize(&self, segments: &[Segment], language: &str) -> Result<Summary> {
        if segments.is_empty() {
            return Err(RecapError::InvalidInput(
                "nothing to summarize: the transcript produced no segments".to_string(),
            ));
        }

        let partials = if self.rolling_context {
            self.summarize_rolling(segments, language).await?
        } else {
            self.summarize_concurrent(segments, language).await?
        };

        if partials.len() == 1 {
            return Ok(Summary::from_partial(&partials[0]));
        }

        let abstract_text = self.merge_abstracts(&partials, language).await?;
        info!("Merged {} partial summaries", partials.len());
        Ok(Summary::merge(&partials, abstract_text))
    }

    async fn summarize_rolling(
        &self,
        segments: &[Segment],
        language: &str,
    ) -> Result<Vec<PartialSummary>> {
        let mut partials: Vec<PartialSummary> = Vec::with_capacity(segments.len());

        for segment in segments {
            let previous = partials.last().map(|p| p.detailed_summary.as_str());
            let partial = self.summarize_segment(segment, language, previous).await?;
            partials.push(partial);
        }

        Ok(partials)
    }

    async fn summarize_concurrent(
        &self,
        segments: &[Segment],
        language: &str,
    ) -> Result<Vec<PartialSummary>> {
        stream::iter(segments)
            .map(|segment| self.summarize_segment(segment, language, None))
            .buffered(self.max_concurrency)
            .try_collect()
            .await
    }

    /// Summarize one segment, re-prompting once if sections are missing.
    async fn summarize_segment(
        &self,
        segment: &Segment,
        language: &str,
        previous: Option<&str>,
    ) -> Result<PartialSummary> {
        debug!(
            "Summarizing segment {}/{} ({} units)",
            segment.index + 1,
            segment.total_count,
            segment.units
        );

        let prompt = self.segment_prompt(segment, language, previous);
        let response = self.complete_with_retry(&prompt, segment.index).await?;

        let missing = match parse_sections(&response).into_partial(segment.index) {
            Ok(partial) => return Ok(partial),
            Err(missing) => missing,
        };

        warn!(
            "Segment {} response is missing {}; asking again",
            segment.index,
            missing.join(", ")
        );

        let retry_prompt = format!("{}\n\n{}", prompt, self.clarify_prompt(&missing));

        let response = self.complete_with_retry(&retry_prompt, segment.index).await?;
        parse_sections(&response)
            .into_partial(segment.index)
            .map_err(|missing| RecapError::SummaryParseFailure {
                segment: segment.index,
                missing,
            })
    }

    fn segment_prompt(&self, segment: &Segment, language: &str, previous: Option<&str>) -> String {
        let previous_context = previous
            .map(|p| format!("\nSummary of the previous part, for context only:\n{}\n", p))
            .unwrap_or_default();

        let mut vars = HashMap::new();
        vars.insert("language".to_string(), language.to_string());
        vars.insert("segment_number".to_string(), (segment.index + 1).to_string());
        vars.insert("segment_count".to_string(), segment.total_count.to_string());
        vars.insert("previous_context".to_string(), previous_context);
        vars.insert("transcript".to_string(), segment.text.clone());

        self.prompts
            .render_with_custom(&self.prompts.summary.segment, &vars)
    }

    /// Ask for one abstract covering all segments, re-prompting once if the
    /// reply has no ABSTRACT label.
    ///
    /// Failures are reported against the index one past the last segment.
    async fn merge_abstracts(&self, partials: &[PartialSummary], language: &str) -> Result<String> {
        let merge_index = partials.len();
        let abstracts = partials
            .iter()
            .map(|p| format!("Part {}: {}", p.segment_index + 1, p.abstract_text))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut vars = HashMap::new();
        vars.insert("language".to_string(), language.to_string());
        vars.insert("segment_count".to_string(), partials.len().to_string());
        vars.insert("abstracts".to_string(), abstracts);
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.summary.abstract_merge, &vars);

        let response = self.complete_with_retry(&prompt, merge_index).await?;
        if let Some(abstract_text) = parse_abstract(&response) {
            return Ok(abstract_text);
        }

        warn!("Merge response is missing ABSTRACT; asking again");
        let missing = vec!["ABSTRACT".to_string()];
        let retry_prompt = format!("{}\n\n{}", prompt, self.clarify_prompt(&missing));

        let response = self.complete_with_retry(&retry_prompt, merge_index).await?;
        parse_abstract(&response).ok_or(RecapError::SummaryParseFailure {
            segment: merge_index,
            missing,
        })
    }

    fn clarify_prompt(&self, missing: &[String]) -> String {
        let mut vars = HashMap::new();
        vars.insert("missing".to_string(), missing.join(", "));
        self.prompts
            .render_with_custom(&self.prompts.summary.clarify, &vars)
    }

    /// Call the backend, retrying transient failures with backoff.
    async fn complete_with_retry(&self, prompt: &str, segment: usize) -> Result<String> {
        let mut state = self.retry.state();

        loop {
            let attempt = state.begin_attempt();
            match self.backend.complete(prompt, self.call_timeout).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() => match state.next_delay() {
                    Some(delay) => {
                        warn!(
                            "Segment {} attempt {} failed, retrying in {:?}: {}",
                            segment, attempt, delay, e
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        return Err(RecapError::SummarizationFailed {
                            segment,
                            attempts: state.attempts(),
                            source: e,
                        })
                    }
                },
                Err(e) => {
                    return Err(RecapError::SummarizationFailed {
                        segment,
                        attempts: state.attempts(),
                        source: e,
                    })
                }
            }
        }
    }
}
