//! Configuration settings for Recap.

use crate::chunking::{ChunkingConfig, OversizePolicy, UnitMeasure};
use crate::openai::{ApiEndpoint, DEFAULT_API_KEY_ENV};
use crate::summary::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub captions: CaptionSettings,
    pub transcription: TranscriptionSettings,
    pub summary: SummarySettings,
    pub chunking: ChunkingSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where transcripts and analyses are written.
    pub output_dir: String,
    /// Directory for temporary files (downloaded audio, caption tracks).
    pub temp_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: "./transcripts".to_string(),
            temp_dir: "/tmp/recap".to_string(),
        }
    }
}

/// Caption lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    /// Language requested when none is given on the command line.
    pub preferred_language: String,
    /// Fall back to audio transcription when captions are missing.
    pub allow_audio_fallback: bool,
    /// Prefer manually created captions over auto-generated ones.
    pub prefer_manual: bool,
    /// Timeout for the caption download, in seconds.
    pub timeout_secs: u64,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            preferred_language: "en".to_string(),
            allow_audio_fallback: true,
            prefer_manual: true,
            timeout_secs: 120,
        }
    }
}

impl CaptionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Audio transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Duration in seconds for splitting long audio files.
    pub chunk_duration_seconds: u32,
    /// Maximum concurrent chunk uploads.
    pub max_concurrent_chunks: usize,
    /// Timeout for the whole download + transcription, in seconds.
    pub timeout_secs: u64,
    /// Base URL of an OpenAI-compatible API (empty for OpenAI).
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            chunk_duration_seconds: 600,
            max_concurrent_chunks: 3,
            timeout_secs: 3600,
            api_base: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

impl TranscriptionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn endpoint(&self) -> ApiEndpoint {
        ApiEndpoint {
            api_base: self.api_base.clone(),
            api_key_env: self.api_key_env.clone(),
            timeout: self.timeout(),
        }
    }
}

/// Summarization backend and orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Chat model used for segment and abstract summaries.
    pub model: String,
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.deepseek.com/v1`.
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on completion tokens per call.
    pub max_tokens: u32,
    /// Timeout for a single completion call, in seconds.
    pub timeout_secs: u64,
    /// Pass the previous segment's detailed summary into the next prompt.
    pub rolling_context: bool,
    /// Concurrent segment calls when rolling context is off.
    pub max_concurrency: usize,
    /// Retry schedule for transient backend failures.
    pub retry: RetrySettings,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            temperature: 0.7,
            max_tokens: 4000,
            timeout_secs: 120,
            rolling_context: true,
            max_concurrency: 3,
            retry: RetrySettings::default(),
        }
    }
}

impl SummarySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn endpoint(&self) -> ApiEndpoint {
        ApiEndpoint {
            api_base: self.api_base.clone(),
            api_key_env: self.api_key_env.clone(),
            // The HTTP client gets slack on top of the per-call timeout.
            timeout: self.timeout() + Duration::from_secs(5),
        }
    }
}

/// Retry schedule as it appears in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// First backoff delay in milliseconds; doubles each retry.
    pub base_delay_ms: u64,
    /// Cap on a single backoff delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        RetryPolicy {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Unit measure (characters, words, tokens).
    pub unit: String,
    /// Maximum units per segment.
    pub max_units: usize,
    /// Units repeated at the start of the next segment.
    pub overlap_units: usize,
    /// What to do with a single line over budget (split, isolate, reject).
    pub oversize_policy: String,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            unit: "characters".to_string(),
            max_units: 12_000,
            overlap_units: 500,
            oversize_policy: "split".to_string(),
        }
    }
}

impl ChunkingSettings {
    /// Build a chunking configuration, validating the unit and policy names.
    pub fn to_config(&self) -> crate::error::Result<ChunkingConfig> {
        let unit: UnitMeasure = self
            .unit
            .parse()
            .map_err(crate::error::RecapError::InvalidConfiguration)?;
        let oversize_policy: OversizePolicy = self
            .oversize_policy
            .parse()
            .map_err(crate::error::RecapError::InvalidConfiguration)?;

        Ok(ChunkingConfig {
            max_units_per_segment: self.max_units,
            overlap_units: self.overlap_units,
            unit,
            oversize_policy,
        })
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::RecapError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recap")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [summary]
            model = "deepseek-chat"
            api_base = "https://api.deepseek.com/v1"
            api_key_env = "DEEPSEEK_API_KEY"

            [chunking]
            max_units = 800
            "#,
        )
        .unwrap();

        assert_eq!(settings.summary.model, "deepseek-chat");
        assert_eq!(settings.summary.api_key_env, "DEEPSEEK_API_KEY");
        assert!(settings.summary.rolling_context);
        assert_eq!(settings.chunking.max_units, 800);
        assert_eq!(settings.chunking.overlap_units, 500);
        assert_eq!(settings.captions.preferred_language, "en");
    }

    #[test]
    fn test_chunking_settings_to_config() {
        let settings = ChunkingSettings {
            unit: "words".to_string(),
            max_units: 300,
            overlap_units: 20,
            oversize_policy: "isolate".to_string(),
        };
        let config = settings.to_config().unwrap();
        assert_eq!(config.unit, UnitMeasure::Words);
        assert_eq!(config.oversize_policy, OversizePolicy::Isolate);

        let bad = ChunkingSettings {
            unit: "syllables".to_string(),
            ..ChunkingSettings::default()
        };
        assert!(bad.to_config().is_err());
    }

    #[test]
    fn test_retry_settings_never_zero_attempts() {
        let policy = RetryPolicy::from(&RetrySettings {
            max_attempts: 0,
            base_delay_ms: 10,
            max_delay_ms: 100,
        });
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.captions.preferred_language = "fr".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.captions.preferred_language, "fr");
    }
}
