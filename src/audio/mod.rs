//! Audio extraction for the speech-to-text fallback.

mod downloader;

pub use downloader::{download_audio, split_audio};
