//! Transcript command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, TranscriptArgs};
use crate::config::Settings;
use crate::pipeline::resolver_from_settings;
use crate::transcript::{format_transcript, OutputFormat};
use crate::video::VideoReference;
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(args: &TranscriptArgs, settings: Settings) -> Result<()> {
    let video = VideoReference::parse(&args.source.input)?;
    let format: OutputFormat = args.format.parse().map_err(anyhow::Error::msg)?;

    if let Err(e) = preflight::check(Operation::Transcript, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'recap doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let fallback_enabled = settings.captions.allow_audio_fallback && !args.source.no_fallback;
    let language = args
        .source
        .language
        .clone()
        .unwrap_or_else(|| settings.captions.preferred_language.clone());

    let resolver = resolver_from_settings(&settings);

    let spinner = Output::spinner(&format!("Fetching transcript for {}...", video.id));
    let result = resolver.resolve(&video, &language, fallback_enabled).await;
    spinner.finish_and_clear();

    let transcript = match result {
        Ok(transcript) => transcript,
        Err(e) => {
            Output::error(&format!("Failed to fetch transcript: {}", e));
            return Err(e.into());
        }
    };

    let content = format_transcript(&transcript, format);

    match &args.output {
        Some(path) => {
            let path = Settings::expand_path(path);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&path, content)?;
            Output::success(&format!(
                "Wrote {} lines ({}, {}) to {}",
                transcript.lines().len(),
                transcript.language(),
                transcript.origin(),
                path.display()
            ));
        }
        None => println!("{}", content),
    }

    Ok(())
}
