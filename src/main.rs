//! Recap CLI entry point.

use anyhow::Result;
use clap::Parser;
use recap::cli::{commands, Cli, Commands, Output};
use recap::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("recap={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);

    // Load configuration
    let settings = Settings::load_from(Some(&config_path))?;

    match &cli.command {
        Commands::Summarize(args) => {
            std::fs::create_dir_all(settings.temp_dir())?;
            let outcome = tokio::select! {
                result = commands::run_summarize(args, settings) => Some(result),
                _ = tokio::signal::ctrl_c() => None,
            };
            finish_or_interrupt(outcome)?;
        }

        Commands::Transcript(args) => {
            std::fs::create_dir_all(settings.temp_dir())?;
            let outcome = tokio::select! {
                result = commands::run_transcript(args, settings) => Some(result),
                _ = tokio::signal::ctrl_c() => None,
            };
            finish_or_interrupt(outcome)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings, &config_path)?;
        }
    }

    Ok(())
}

/// `None` means Ctrl-C won the race. The command future has been dropped by
/// then, which kills any child process and releases its temp files.
fn finish_or_interrupt(outcome: Option<Result<()>>) -> Result<()> {
    match outcome {
        Some(result) => result,
        None => {
            Output::warning("Interrupted");
            std::process::exit(130);
        }
    }
}
