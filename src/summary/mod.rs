//! Segment summarization.
//!
//! The [`SummaryOrchestrator`] sends each transcript segment to a
//! [`SummarizationBackend`], parses the labeled sections of the reply and merges
//! the per-segment results into one [`Summary`].

mod backend;
mod models;
mod orchestrator;
mod parse;
mod retry;

pub use backend::{BackendError, OpenAiBackend, SummarizationBackend};
pub use models::{PartialSummary, Summary};
pub use orchestrator::SummaryOrchestrator;
pub use parse::{parse_abstract, parse_sections, ParsedSections, Section};
pub use retry::{RetryPolicy, RetryState};
