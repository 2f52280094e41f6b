//! Configuration settings for vsrelay.

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Largest result-count hint the provider accepts for file search.
pub const MAX_TOP_K: u32 = 50;

/// Root configuration structure.
///
/// Built once at startup and shared read-only with every request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub openai: OpenAISettings,
    pub relay: RelaySettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Value for `Access-Control-Allow-Origin` ("*" allows any origin).
    pub allowed_origin: String,
    /// Refuse to start when the API key is missing. When false the server
    /// starts and answers relay calls with a configuration error instead.
    pub fail_fast: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            allowed_origin: "*".to_string(),
            fail_fast: true,
        }
    }
}

/// How the provider is told to use the file search tool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide whether to search.
    #[default]
    Auto,
    /// Force a search on every call.
    Required,
}

impl std::str::FromStr for ToolChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ToolChoice::Auto),
            "required" => Ok(ToolChoice::Required),
            _ => Err(format!("Unknown tool choice: {}", s)),
        }
    }
}

impl std::fmt::Display for ToolChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolChoice::Auto => write!(f, "auto"),
            ToolChoice::Required => write!(f, "required"),
        }
    }
}

/// Provider connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// API key. Usually supplied through `OPENAI_API_KEY` instead of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL of the API.
    pub api_base: String,
    /// Model used when the request does not name one.
    pub model: String,
    /// Upper bound for a single upstream call, in seconds.
    pub timeout_secs: u64,
    /// File search invocation mode.
    pub tool_choice: ToolChoice,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4.1-mini".to_string(),
            timeout_secs: 60,
            tool_choice: ToolChoice::Auto,
        }
    }
}

impl OpenAISettings {
    /// Upstream call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Request resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Vector store used when the request does not name one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_store_id: Option<String>,
    /// Always use `vector_store_id`, ignoring the request body.
    pub pin_vector_store: bool,
    /// Result-count hint used when the request has no usable `top_k`.
    pub default_top_k: u32,
    /// Collapse newlines in answers into spaces.
    pub single_line_answers: bool,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            vector_store_id: None,
            pin_vector_store: false,
            default_top_k: 6,
            single_line_answers: false,
        }
    }
}

impl RelaySettings {
    /// Configured store id, if it is non-blank.
    pub fn default_vector_store(&self) -> Option<&str> {
        self.vector_store_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

impl Settings {
    /// Load settings from the default configuration file and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied on top of whatever the file holds.
    /// Values are not checked here; see [`Settings::validate`].
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let mut settings = Self::read_file(path)?;
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    fn read_file(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Self::expand_path(&p.to_string_lossy()),
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

    /// Apply environment overrides using the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(base) = get("OPENAI_BASE_URL") {
            self.openai.api_base = base;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.openai.model = model;
        }
        if let Some(id) = get("VECTOR_STORE_ID") {
            self.relay.vector_store_id = Some(id);
        }
        if let Some(port) = get("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(origin) = get("RELAY_ALLOWED_ORIGIN") {
            self.server.allowed_origin = origin;
        }
    }

    /// Check values that would otherwise fail on the first request.
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.openai.api_base).map_err(|e| {
            RelayError::Config(format!("openai.api_base is not a valid URL: {}", e))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(RelayError::Config(format!(
                "openai.api_base must use http or https, got '{}'",
                base.scheme()
            )));
        }
        if self.openai.model.trim().is_empty() {
            return Err(RelayError::Config("openai.model is empty".to_string()));
        }
        if self.openai.timeout_secs == 0 {
            return Err(RelayError::Config(
                "openai.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.relay.default_top_k == 0 || self.relay.default_top_k > MAX_TOP_K {
            return Err(RelayError::Config(format!(
                "relay.default_top_k must be between 1 and {}",
                MAX_TOP_K
            )));
        }
        if self.relay.pin_vector_store && self.relay.default_vector_store().is_none() {
            return Err(RelayError::Config(
                "relay.pin_vector_store is set but relay.vector_store_id is missing".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| RelayError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Copy of these settings that is safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.openai.api_key = copy.openai.api_key.as_deref().map(mask_secret);
        copy
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vsrelay")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}

/// Mask a secret, keeping only a short prefix and suffix.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.openai.model, "gpt-4.1-mini");
        assert_eq!(settings.relay.default_top_k, 6);
        assert!(settings.openai.api_key.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[
            ("OPENAI_API_KEY", "sk-test-key"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("VECTOR_STORE_ID", "vs_123"),
            ("PORT", "8080"),
        ]));

        assert_eq!(settings.openai.api_key.as_deref(), Some("sk-test-key"));
        assert_eq!(settings.openai.model, "gpt-4o");
        assert_eq!(settings.relay.default_vector_store(), Some("vs_123"));
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[("OPENAI_MODEL", "  "), ("PORT", "not-a-port")]));
        assert_eq!(settings.openai.model, "gpt-4.1-mini");
        assert_eq!(settings.server.port, 5000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9000

[openai]
model = "gpt-4.1"
tool_choice = "required"

[relay]
vector_store_id = "vs_file"
default_top_k = 10
"#,
        )
        .unwrap();

        let mut settings = Settings::read_file(Some(&path)).unwrap();
        settings.apply_env(env(&[]));

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.openai.model, "gpt-4.1");
        assert_eq!(settings.openai.tool_choice, ToolChoice::Required);
        assert_eq!(settings.relay.default_vector_store(), Some("vs_file"));
        assert_eq!(settings.relay.default_top_k, 10);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::read_file(Some(&path)).unwrap();
        assert_eq!(settings.server.port, 5000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.relay.vector_store_id = Some("vs_saved".to_string());
        settings.save_to(&path).unwrap();

        let loaded = Settings::read_file(Some(&path)).unwrap();
        assert_eq!(loaded.relay.default_vector_store(), Some("vs_saved"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.openai.api_base = "not a url".to_string();
        assert!(matches!(settings.validate(), Err(RelayError::Config(_))));

        let mut settings = Settings::default();
        settings.openai.api_base = "ftp://example.com".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.relay.pin_vector_store = true;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.relay.default_top_k = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_tool_choice_parsing() {
        assert_eq!("AUTO".parse::<ToolChoice>().unwrap(), ToolChoice::Auto);
        assert_eq!("required".parse::<ToolChoice>().unwrap(), ToolChoice::Required);
        assert!("none".parse::<ToolChoice>().is_err());
        assert_eq!(ToolChoice::Required.to_string(), "required");
    }

    #[test]
    fn test_redacted_masks_key() {
        let mut settings = Settings::default();
        settings.openai.api_key = Some("sk-proj-abcdefghijklmnop".to_string());
        let shown = settings.redacted();
        assert_eq!(shown.openai.api_key.as_deref(), Some("sk-...mnop"));
        assert_eq!(mask_secret("short"), "****");
    }
}
