//! OpenAI client configuration with sensible defaults.

use crate::config::OpenAISettings;
use crate::error::{RelayError, Result};
use async_openai::config::OpenAIConfig;
use std::time::Duration;

/// Build the provider configuration (credentials and base URL) from settings.
///
/// Fails when no API key is available, since every call would be rejected.
pub fn create_config(settings: &OpenAISettings) -> Result<OpenAIConfig> {
    let api_key = settings
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| RelayError::Config("OPENAI_API_KEY is not set".to_string()))?;

    Ok(OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(settings.api_base.trim_end_matches('/')))
}

/// Create an HTTP client with the configured timeout.
pub fn create_http_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("vsrelay/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::config::Config;

    #[test]
    fn test_config_requires_key() {
        let settings = OpenAISettings::default();
        assert!(matches!(create_config(&settings), Err(RelayError::Config(_))));

        let settings = OpenAISettings {
            api_key: Some("   ".to_string()),
            ..OpenAISettings::default()
        };
        tokio_test::assert_err!(create_config(&settings));
    }

    #[test]
    fn test_config_uses_base_url() {
        let settings = OpenAISettings {
            api_key: Some("sk-test".to_string()),
            api_base: "http://localhost:8080/v1/".to_string(),
            ..OpenAISettings::default()
        };
        let config = create_config(&settings).unwrap();
        assert_eq!(config.url("/responses"), "http://localhost:8080/v1/responses");
        assert!(config.headers().contains_key(reqwest::header::AUTHORIZATION));
    }

    #[test]
    fn test_http_client_builds() {
        tokio_test::assert_ok!(create_http_client(Duration::from_secs(5)));
    }
}
