//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{RecapError, Result};
use crate::openai::api_key;
use crate::tools::{FFMPEG, FFPROBE, YT_DLP};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching a transcript requires yt-dlp.
    Transcript,
    /// Summarizing also requires the summarization API key.
    Summarize,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_tool(YT_DLP)?;
    if let Operation::Summarize = operation {
        api_key(&settings.summary.api_key_env)?;
    }
    Ok(())
}

/// Problems that only matter once the audio fallback is needed.
pub fn fallback_warnings(settings: &Settings) -> Vec<String> {
    let mut warnings: Vec<String> = [FFMPEG, FFPROBE]
        .iter()
        .filter_map(|tool| check_tool(tool).err())
        .map(|e| format!("Audio fallback unavailable: {}", e))
        .collect();

    if let Err(e) = api_key(&settings.transcription.api_key_env) {
        warnings.push(format!("Audio fallback unavailable: {}", e));
    }

    warnings
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        FFMPEG | FFPROBE => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(RecapError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(RecapError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(RecapError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_reported() {
        let err = check_tool("recap-tool-that-does-not-exist").unwrap_err();
        assert!(matches!(err, RecapError::ToolNotFound(_)));
    }

    #[test]
    fn test_fallback_warnings_mention_missing_key() {
        let mut settings = Settings::default();
        settings.transcription.api_key_env = "RECAP_TEST_KEY_THAT_IS_NEVER_SET".to_string();

        let warnings = fallback_warnings(&settings);
        assert!(warnings
            .iter()
            .any(|w| w.contains("RECAP_TEST_KEY_THAT_IS_NEVER_SET")));
    }
}
