//! Summarize command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, SummarizeArgs};
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::report::{AnalysisReport, ReportFormat};
use crate::transcript::{format_transcript, OutputFormat};
use crate::video::VideoReference;
use anyhow::Result;
use std::path::PathBuf;

/// Run the summarize command.
pub async fn run_summarize(args: &SummarizeArgs, mut settings: Settings) -> Result<()> {
    let video = VideoReference::parse(&args.source.input)?;
    let transcript_format: OutputFormat = args.format.parse().map_err(anyhow::Error::msg)?;
    let report_format: ReportFormat = args.report_format.parse()?;

    apply_overrides(args, &mut settings);
    let chunk_config = settings.chunking.to_config()?;

    if let Err(e) = preflight::check(Operation::Summarize, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'recap doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let fallback_enabled = settings.captions.allow_audio_fallback && !args.source.no_fallback;
    if fallback_enabled {
        for warning in preflight::fallback_warnings(&settings) {
            Output::warning(&warning);
        }
    }

    let language = args
        .source
        .language
        .clone()
        .unwrap_or_else(|| settings.captions.preferred_language.clone());

    Output::info(&format!("Processing: {} (language: {})", video.url, language));

    let pipeline = Pipeline::from_settings(&settings)?;

    let spinner = Output::spinner("Fetching transcript and summarizing...");
    let result = pipeline
        .run(&video, &language, fallback_enabled, &chunk_config)
        .await;
    spinner.finish_and_clear();

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            Output::error(&format!("Failed to summarize: {}", e));
            return Err(e.into());
        }
    };

    let output_dir = args
        .output_dir
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(|| settings.output_dir());
    std::fs::create_dir_all(&output_dir)?;

    let transcript_path = output_path(
        &output_dir,
        &video.id,
        "transcript",
        transcript_format.extension(),
    );
    std::fs::write(
        &transcript_path,
        format_transcript(&output.transcript, transcript_format),
    )?;

    let report = AnalysisReport::from_output(&output);
    let analysis_path = output_path(&output_dir, &video.id, "analysis", report_format.extension());
    std::fs::write(&analysis_path, report.render(report_format)?)?;

    Output::success(&format!(
        "Summarized {} lines in {} segment(s) from {}",
        output.transcript.lines().len(),
        output.segment_count,
        output.transcript.origin()
    ));
    Output::kv("Transcript", &transcript_path.display().to_string());
    Output::kv("Analysis", &analysis_path.display().to_string());

    Output::summary(&output.summary);

    Ok(())
}

/// Fold per-run flags into the loaded settings.
fn apply_overrides(args: &SummarizeArgs, settings: &mut Settings) {
    if let Some(model) = &args.model {
        settings.summary.model = model.clone();
    }
    if let Some(max_units) = args.max_units {
        settings.chunking.max_units = max_units;
    }
    if let Some(overlap) = args.overlap_units {
        settings.chunking.overlap_units = overlap;
    }
    if let Some(unit) = &args.unit {
        settings.chunking.unit = unit.clone();
    }
    if args.no_rolling_context {
        settings.summary.rolling_context = false;
    }
}

fn output_path(dir: &std::path::Path, video_id: &str, kind: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", video_id, kind, extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::UnitMeasure;
    use crate::cli::{Cli, Commands};
    use crate::error::RecapError;
    use clap::Parser;

    fn summarize_args(extra: &[&str]) -> SummarizeArgs {
        let mut argv = vec!["recap", "summarize", "dQw4w9WgXcQ"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Summarize(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_overrides_replace_settings() {
        let args = summarize_args(&[
            "--model",
            "deepseek-chat",
            "--max-units",
            "800",
            "--overlap-units",
            "50",
            "--unit",
            "words",
            "--no-rolling-context",
        ]);
        let mut settings = Settings::default();
        apply_overrides(&args, &mut settings);

        assert_eq!(settings.summary.model, "deepseek-chat");
        assert!(!settings.summary.rolling_context);

        let config = settings.chunking.to_config().unwrap();
        assert_eq!(config.max_units_per_segment, 800);
        assert_eq!(config.overlap_units, 50);
        assert_eq!(config.unit, UnitMeasure::Words);
    }

    #[test]
    fn test_bad_unit_is_rejected() {
        let args = summarize_args(&["--unit", "syllables"]);
        let mut settings = Settings::default();
        apply_overrides(&args, &mut settings);

        assert!(matches!(
            settings.chunking.to_config(),
            Err(RecapError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_output_path() {
        let path = output_path(std::path::Path::new("/out"), "dQw4w9WgXcQ", "analysis", "txt");
        assert_eq!(path, PathBuf::from("/out/dQw4w9WgXcQ_analysis.txt"));
    }
}
