//! Configuration module for Recap.
//!
//! Handles loading and managing configuration from TOML files.

mod prompts;
mod settings;

pub use prompts::{Prompts, SummaryPrompts};
pub use settings::{
    CaptionSettings, ChunkingSettings, GeneralSettings, PromptSettings, RetrySettings, Settings,
    SummarySettings, TranscriptionSettings,
};
