//! Transcript data model and formats.

mod format;
mod models;

pub use format::{format_transcript, parse_vtt, LineExport, OutputFormat, TranscriptExport, VttCue};
pub use models::{format_timestamp, Transcript, TranscriptLine, TranscriptOrigin};
