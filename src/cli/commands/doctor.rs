//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::tools::{FFMPEG, FFPROBE, YT_DLP};
use console::style;
use std::path::Path;
use std::process::Command;

/// Outcome of a single diagnostic.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    /// Downgrade an error to a warning. Used for things only the audio fallback needs.
    fn optional(mut self) -> Self {
        if self.status == CheckStatus::Error {
            self.status = CheckStatus::Warning;
        }
        self
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
///
/// Fails when a check needed by `recap summarize` does not pass.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Recap Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    print_section(
        "External Tools",
        &mut checks,
        vec![
            check_tool(YT_DLP, "--version", install_hint_ytdlp()),
            check_tool(FFMPEG, "-version", install_hint_ffmpeg()).optional(),
            check_tool(FFPROBE, "-version", install_hint_ffmpeg()).optional(),
        ],
    );

    let mut keys = vec![check_api_key("Summary", &settings.summary.api_key_env)];
    if settings.transcription.api_key_env != settings.summary.api_key_env {
        keys.push(check_api_key("Transcription", &settings.transcription.api_key_env).optional());
    }
    print_section("API Configuration", &mut checks, keys);

    print_section("Directories", &mut checks, check_directories(settings));
    print_section("Configuration", &mut checks, vec![check_config_file(config_path)]);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Recap.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Recap is ready to use.");
    }

    Ok(())
}

fn print_section(title: &str, all: &mut Vec<CheckResult>, section: Vec<CheckResult>) {
    println!("{}", style(title).bold());
    for check in &section {
        check.print();
    }
    println!();
    all.extend(section);
}

/// Check if an external tool is available.
fn check_tool(name: &str, version_arg: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            CheckResult::ok(name, &truncate(&version, 50))
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check that the environment variable holding an API key is set.
fn check_api_key(purpose: &str, var: &str) -> CheckResult {
    let name = format!("{} key ({})", purpose, var);
    let hint = format!("Set with: export {}='...'", var);

    match std::env::var(var) {
        Ok(key) if key.trim().is_empty() => CheckResult::error(&name, "empty", &hint),
        Ok(key) => CheckResult::ok(&name, &format!("configured ({})", mask_key(&key))),
        Err(_) => CheckResult::error(&name, "not set", &hint),
    }
}

/// Show only the ends of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Check output and temp directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    [
        ("Output directory", settings.output_dir()),
        ("Temp directory", settings.temp_dir()),
    ]
    .into_iter()
    .map(|(name, dir)| {
        if dir.is_dir() {
            CheckResult::ok(name, &format!("{}", dir.display()))
        } else if dir.exists() {
            CheckResult::error(
                name,
                &format!("{} is not a directory", dir.display()),
                "Point general.output_dir / general.temp_dir at a directory",
            )
        } else {
            CheckResult::warning(
                name,
                &format!("{} (will be created)", dir.display()),
                "Directory will be created on first use",
            )
        }
    })
    .collect()
}

/// Check if the config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: recap config init",
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg (needed for audio fallback)"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (needed for audio fallback)"
    } else {
        "Install from: https://ffmpeg.org/download.html (needed for audio fallback)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_downgrades_errors_only() {
        let result = CheckResult::error("ffmpeg", "not found", "install it").optional();
        assert_eq!(result.status, CheckStatus::Warning);

        let result = CheckResult::ok("ffmpeg", "6.1").optional();
        assert_eq!(result.status, CheckStatus::Ok);
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-abcdefghijklmnop1234"), "sk-a...1234");
        assert_eq!(mask_key("short"), "*****");
    }

    #[test]
    fn test_missing_key() {
        let result = check_api_key("Summary", "RECAP_DOCTOR_KEY_THAT_IS_NEVER_SET");
        assert_eq!(result.status, CheckStatus::Error);
        assert!(result.hint.unwrap().contains("RECAP_DOCTOR_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_missing_tool() {
        let result = check_tool("recap-tool-that-does-not-exist", "--version", "install it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.message, "not found");
    }

    #[test]
    fn test_config_file_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert_eq!(check_config_file(&path).status, CheckStatus::Warning);

        std::fs::write(&path, "").unwrap();
        assert_eq!(check_config_file(&path).status, CheckStatus::Ok);
    }

    #[test]
    fn test_directories_not_yet_created() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.output_dir = dir.path().join("out").display().to_string();
        settings.general.temp_dir = dir.path().display().to_string();

        let checks = check_directories(&settings);
        assert_eq!(checks[0].status, CheckStatus::Warning);
        assert_eq!(checks[1].status, CheckStatus::Ok);
    }
}
