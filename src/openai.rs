//! OpenAI-compatible client construction.
//!
//! Both the Whisper transcription adapter and the chat summarization backend talk
//! to an OpenAI-style API. The base URL and the environment variable holding the
//! key are configurable so DeepSeek or a local gateway can stand in for OpenAI.

use crate::error::{RecapError, Result};
use async_openai::{config::OpenAIConfig, Client};
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable consulted when no other is configured.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Where to reach an OpenAI-compatible API and how to authenticate.
#[derive(Debug, Clone)]
pub struct ApiEndpoint {
    /// Base URL, e.g. `https://api.deepseek.com/v1`. `None` keeps the OpenAI default.
    pub api_base: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// HTTP timeout for a single request.
    pub timeout: Duration,
}

impl Default for ApiEndpoint {
    fn default() -> Self {
        Self {
            api_base: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Create a client for the given endpoint.
///
/// Fails with a configuration error when the key variable is unset or empty.
pub fn create_client(endpoint: &ApiEndpoint) -> Result<Client<OpenAIConfig>> {
    let api_key = api_key(&endpoint.api_key_env)?;

    let http_client = reqwest::Client::builder()
        .timeout(endpoint.timeout)
        .build()?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = endpoint.api_base.as_deref().filter(|b| !b.is_empty()) {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Backoff that gives up on the first transient error.
///
/// async-openai retries rate limits and server errors internally by default.
/// Clients whose caller keeps its own retry schedule use this instead.
pub fn no_backoff() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Read an API key from the environment.
pub fn api_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) => Err(RecapError::Config(format!(
            "{var} is empty. Set it with: export {var}='sk-...'"
        ))),
        Err(_) => Err(RecapError::Config(format!(
            "{var} not set. Set it with: export {var}='sk-...'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let err = api_key("RECAP_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, RecapError::Config(_)));
    }

    #[test]
    fn test_no_backoff_stops_immediately() {
        use backoff::backoff::Backoff;

        let mut policy = no_backoff();
        assert_eq!(policy.max_elapsed_time, Some(Duration::ZERO));
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(policy.next_backoff(), None);
    }
}
