//! Recap - video transcripts and summaries
//!
//! A CLI tool that turns a YouTube video into a timestamped transcript and a
//! structured summary.
//!
//! # Overview
//!
//! Recap:
//! - Fetches the video's captions in the requested language
//! - Falls back to transcribing the audio when no captions exist
//! - Splits long transcripts into overlapping segments that fit the model's context
//! - Summarizes each segment and merges the results into one analysis
//!
//! # Architecture
//!
//! - `video` - Video references parsed from URLs or ids
//! - `transcript` - Transcript model and output formats
//! - `sources` - Caption and audio transcript sources, and the resolver that picks one
//! - `audio` - Audio download and splitting for transcription
//! - `chunking` - Segmenting transcripts under a unit budget
//! - `summary` - Summarization backend, response parsing, retries and merging
//! - `pipeline` - Resolver, chunker and summarizer wired together
//! - `report` - Analysis report rendering
//! - `config` - Configuration management
//!
//! # Example
//!
//! ```rust,no_run
//! use recap::config::Settings;
//! use recap::pipeline::Pipeline;
//! use recap::video::VideoReference;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::from_settings(&settings)?;
//!
//!     let video = VideoReference::parse("https://youtu.be/dQw4w9WgXcQ")?;
//!     let output = pipeline
//!         .run(&video, "en", true, &settings.chunking.to_config()?)
//!         .await?;
//!     println!("{}", output.summary.abstract_text);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod pipeline;
pub mod report;
pub mod sources;
pub mod summary;
pub mod tools;
pub mod transcript;
pub mod video;

pub use error::{RecapError, Result};
