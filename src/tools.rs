//! External command-line tools (yt-dlp, ffmpeg, ffprobe).
//!
//! Every child is spawned with `kill_on_drop`, so dropping the future that
//! awaits it stops the tool as well.

use crate::error::{RecapError, Result};
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

pub const YT_DLP: &str = "yt-dlp";
pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";

/// Run `program` to completion and return its output.
///
/// A missing binary is `ToolNotFound`; a spawn failure or non-zero exit is
/// `ToolFailed` carrying the tool's stderr.
pub async fn run_tool(program: &str, args: &[&str]) -> Result<Output> {
    debug!("Running {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RecapError::ToolNotFound(program.to_string())
            } else {
                RecapError::ToolFailed(format!("Failed to run {}: {}", program, e))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RecapError::ToolFailed(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }

    Ok(output)
}

/// Path as a tool argument.
pub fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program() {
        let err = run_tool("recap-tool-that-does-not-exist", &["--version"])
            .await
            .unwrap_err();
        assert!(matches!(err, RecapError::ToolNotFound(name) if name == "recap-tool-that-does-not-exist"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_tool_failure() {
        let err = run_tool("sh", &["-c", "echo broken >&2; exit 3"])
            .await
            .unwrap_err();
        match err {
            RecapError::ToolFailed(msg) => assert!(msg.contains("broken")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_is_returned() {
        let output = run_tool("sh", &["-c", "echo 12.5"]).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "12.5");
    }
}
