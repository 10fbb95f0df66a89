//! Configuration system (layered: code > env > config file).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::Deserialize;

use crate::error::ParleyError;
use crate::types::GenerationSettings;

/// Model used when neither the environment nor the config file names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Token budget for backends that keep a bounded memory buffer.
pub const DEFAULT_MEMORY_TOKEN_LIMIT: usize = 4096;

/// Layered configuration for Parley.
///
/// Holds provider credentials, base URL overrides, the default model and the
/// generation settings handed to every backend. Cheap to clone; clones share
/// the same credential maps.
#[derive(Clone)]
pub struct ParleyConfig {
    api_keys: Arc<RwLock<HashMap<String, String>>>,
    base_urls: Arc<RwLock<HashMap<String, String>>>,
    model: String,
    settings: GenerationSettings,
    memory_token_limit: usize,
}

impl fmt::Debug for ParleyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<String> = self
            .api_keys
            .read()
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default();
        providers.sort();
        f.debug_struct("ParleyConfig")
            .field("api_keys", &providers)
            .field("base_urls", &self.base_urls)
            .field("model", &self.model)
            .field("settings", &self.settings)
            .field("memory_token_limit", &self.memory_token_limit)
            .finish()
    }
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// On-disk settings (`config.toml`). Credentials are never read from here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub memory_token_limit: Option<usize>,
    pub base_urls: HashMap<String, String>,
}

impl ParleyConfig {
    /// Create an empty config with defaults and no credentials.
    pub fn new() -> Self {
        Self {
            api_keys: Arc::new(RwLock::new(HashMap::new())),
            base_urls: Arc::new(RwLock::new(HashMap::new())),
            model: DEFAULT_MODEL.to_string(),
            settings: GenerationSettings::default(),
            memory_token_limit: DEFAULT_MEMORY_TOKEN_LIMIT,
        }
    }

    /// Load the config file (if any) and overlay the environment.
    pub fn load() -> Result<Self, ParleyError> {
        let mut config = match config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::new(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load from environment variables only (OPENAI_API_KEY, TAVILY_API_KEY, etc.).
    pub fn from_env() -> Self {
        let mut config = Self::new();
        config.apply_env();
        config
    }

    /// Parse a config file from disk.
    pub fn from_file(path: &Path) -> Result<Self, ParleyError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML settings into a config without credentials.
    pub fn from_toml_str(raw: &str) -> Result<Self, ParleyError> {
        let file: FileSettings = toml::from_str(raw)
            .map_err(|e| ParleyError::Configuration(format!("invalid config file: {e}")))?;
        let mut config = Self::new();
        config.apply_file(file);
        Ok(config)
    }

    fn apply_file(&mut self, file: FileSettings) {
        if let Some(model) = file.model {
            self.model = model;
        }
        if file.temperature.is_some() {
            self.settings.temperature = file.temperature;
        }
        if file.max_tokens.is_some() {
            self.settings.max_tokens = file.max_tokens;
        }
        if let Some(limit) = file.memory_token_limit {
            self.memory_token_limit = limit;
        }
        for (provider, url) in file.base_urls {
            self.set_base_url(&provider, url);
        }
    }

    fn apply_env(&mut self) {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let env_mappings = [("OPENAI_API_KEY", "openai"), ("TAVILY_API_KEY", "tavily")];
        for (env_var, provider) in &env_mappings {
            if let Ok(key) = std::env::var(env_var) {
                if !key.trim().is_empty() {
                    self.set_api_key(provider, key);
                }
            }
        }

        let url_mappings = [("OPENAI_BASE_URL", "openai"), ("TAVILY_BASE_URL", "tavily")];
        for (env_var, provider) in &url_mappings {
            if let Ok(url) = std::env::var(env_var) {
                self.set_base_url(provider, url);
            }
        }

        if let Ok(model) = std::env::var("PARLEY_MODEL") {
            if !model.trim().is_empty() {
                self.model = model;
            }
        }
    }

    pub fn set_api_key(&self, provider: &str, key: String) {
        self.api_keys
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(provider.to_string(), key);
    }

    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        self.api_keys
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(provider)
            .cloned()
    }

    /// Resolve a required key, failing with a message that names only the variable.
    pub fn require_api_key(&self, provider: &str, env_var: &str) -> Result<String, ParleyError> {
        self.get_api_key(provider)
            .ok_or_else(|| ParleyError::Authentication(format!("Missing {env_var}")))
    }

    /// Check if a provider has credentials configured.
    pub fn has_credentials(&self, provider: &str) -> bool {
        self.get_api_key(provider).is_some()
    }

    pub fn set_base_url(&self, provider: &str, url: String) {
        self.base_urls
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(provider.to_string(), url);
    }

    pub fn get_base_url(&self, provider: &str) -> Option<String> {
        self.base_urls
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(provider)
            .cloned()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn memory_token_limit(&self) -> usize {
        self.memory_token_limit
    }

    pub fn with_memory_token_limit(mut self, limit: usize) -> Self {
        self.memory_token_limit = limit;
        self
    }
}

/// Where `load` looks for `config.toml`. `PARLEY_CONFIG` wins over the platform dir.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PARLEY_CONFIG") {
        return Some(PathBuf::from(path));
    }
    directories::ProjectDirs::from("", "", "parley")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn toml_settings_populate_config() {
        let config = ParleyConfig::from_toml_str(
            r#"
            model = "gpt-4.1-mini"
            temperature = 0.2
            memory_token_limit = 1024

            [base_urls]
            openai = "http://localhost:9999/v1"
            "#,
        )
        .unwrap();

        assert_eq!(config.model(), "gpt-4.1-mini");
        assert_eq!(config.settings().temperature, Some(0.2));
        assert_eq!(config.memory_token_limit(), 1024);
        assert_eq!(
            config.get_base_url("openai").as_deref(),
            Some("http://localhost:9999/v1")
        );
        assert!(!config.has_credentials("openai"));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let err = ParleyConfig::from_toml_str("openai_api_key = \"sk-1\"").unwrap_err();
        assert!(matches!(err, ParleyError::Configuration(_)));
    }

    #[test]
    fn debug_output_redacts_key_values() {
        let config = ParleyConfig::new();
        config.set_api_key("openai", "sk-very-secret".to_string());
        let rendered = format!("{config:?}");
        assert!(rendered.contains("openai"));
        assert!(!rendered.contains("sk-very-secret"));
    }

    #[test]
    fn missing_required_key_names_only_the_variable() {
        let config = ParleyConfig::new();
        let err = config.require_api_key("openai", "OPENAI_API_KEY").unwrap_err();
        assert_eq!(err.to_string(), "Authentication error: Missing OPENAI_API_KEY");
    }

    #[test]
    fn clones_share_credentials() {
        let config = ParleyConfig::new();
        let clone = config.clone();
        config.set_api_key("tavily", "tvly-1".to_string());
        assert_eq!(clone.get_api_key("tavily").as_deref(), Some("tvly-1"));
    }
}
