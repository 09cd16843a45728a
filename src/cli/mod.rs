//! CLI module for Recap.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Args, Parser, Subcommand};

/// Recap - video transcripts and summaries
///
/// Fetches a video's captions (or transcribes its audio when there are none) and
/// asks a language model for an abstract, key concepts, topics and a detailed
/// summary.
#[derive(Parser, Debug)]
#[command(name = "recap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a transcript and write it together with its analysis
    Summarize(SummarizeArgs),

    /// Fetch a transcript without summarizing it
    Transcript(TranscriptArgs),

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options shared by commands that resolve a transcript.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// YouTube URL or 11-character video ID
    pub input: String,

    /// Preferred transcript language (defaults to captions.preferred_language)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Never fall back to audio transcription
    #[arg(long)]
    pub no_fallback: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SummarizeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Directory for the transcript and analysis files
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Transcript file format (text, json, srt, vtt)
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Analysis file format (text, json)
    #[arg(long, default_value = "text")]
    pub report_format: String,

    /// Chat model used for summarization
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum units per segment
    #[arg(long)]
    pub max_units: Option<usize>,

    /// Units repeated at the start of each following segment
    #[arg(long)]
    pub overlap_units: Option<usize>,

    /// Unit used to size segments (characters, words, tokens)
    #[arg(long)]
    pub unit: Option<String>,

    /// Summarize segments independently and concurrently
    #[arg(long)]
    pub no_rolling_context: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TranscriptArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output format (text, json, srt, vtt)
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_summarize() {
        let cli = Cli::parse_from([
            "recap",
            "-vv",
            "summarize",
            "https://youtu.be/dQw4w9WgXcQ",
            "--language",
            "fr",
            "--no-fallback",
            "--max-units",
            "4000",
        ]);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Summarize(args) => {
                assert_eq!(args.source.input, "https://youtu.be/dQw4w9WgXcQ");
                assert_eq!(args.source.language.as_deref(), Some("fr"));
                assert!(args.source.no_fallback);
                assert_eq!(args.max_units, Some(4000));
                assert_eq!(args.format, "text");
                assert!(!args.no_rolling_context);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::parse_from(["recap", "config", "init", "--force"]);
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
    }
}
