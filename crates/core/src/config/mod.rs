use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_CSV_FILE_NAME: &str = "rewritten_paragraphs.csv";
pub const DEFAULT_DOCX_FILE_NAME: &str = "rewritten_paragraphs.docx";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model_name() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_csv_file_name() -> String {
    DEFAULT_CSV_FILE_NAME.to_string()
}

fn default_docx_file_name() -> String {
    DEFAULT_DOCX_FILE_NAME.to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds. `None` waits for the API indefinitely.
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model_name: default_model_name(),
            temperature: default_temperature(),
            timeout: None,
        }
    }
}

impl LlmConfig {
    /// The configured key, or `OPENAI_API_KEY` from the environment when the
    /// config leaves it blank.
    pub fn resolved_api_key(&self) -> Option<String> {
        let configured = self.api_key.trim();
        if !configured.is_empty() {
            return Some(configured.to_string());
        }
        env::var(API_KEY_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    #[serde(default = "default_csv_file_name")]
    pub csv_file_name: String,
    #[serde(default = "default_docx_file_name")]
    pub docx_file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            csv_file_name: default_csv_file_name(),
            docx_file_name: default_docx_file_name(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PromptConfig {
    #[serde(default)]
    pub custom_directories: Vec<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
}

impl Config {
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = if path.exists() {
            Config::from_path(&path)?
        } else {
            Config::default()
        };

        Ok(Self { path, config })
    }

    /// A store for `path` that starts from `config` without reading the file.
    pub fn with_config(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn reload(&mut self) -> Result<(), ConfigError> {
        self.config = if self.path.exists() {
            Config::from_path(&self.path)?
        } else {
            Config::default()
        };
        Ok(())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.config.to_path(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_input_yields_defaults() {
        let config = Config::from_json_str("  ").unwrap();
        assert_eq!(config.llm.model_name, "gpt-4");
        assert_eq!(config.llm.temperature, 0.7);
        assert_eq!(config.llm.timeout, None);
        assert_eq!(config.export.csv_file_name, "rewritten_paragraphs.csv");
    }

    #[test]
    fn partial_config_fills_missing_fields() {
        let json = r#"{ "llm": { "api_key": "sk-123", "timeout": 30 } }"#;
        let config = Config::from_json_str(json).unwrap();
        assert_eq!(config.llm.api_key, "sk-123");
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.llm.timeout, Some(30));
        assert!(config.prompts.custom_directories.is_empty());
    }

    #[test]
    fn configured_key_wins_over_environment() {
        let llm = LlmConfig {
            api_key: "  sk-config ".into(),
            ..LlmConfig::default()
        };
        assert_eq!(llm.resolved_api_key().as_deref(), Some("sk-config"));
    }

    #[test]
    fn store_persists_config() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("nested").join("config.json");

        let mut store = ConfigStore::open(config_path.clone()).unwrap();
        store.config_mut().llm.model_name = "gpt-4o".into();
        store.config_mut().export.docx_file_name = "notes.docx".into();
        store.save().unwrap();

        let mut reopened = ConfigStore::open(config_path.clone()).unwrap();
        assert_eq!(reopened.config().llm.model_name, "gpt-4o");
        assert_eq!(reopened.config().export.docx_file_name, "notes.docx");

        fs::remove_file(&config_path).unwrap();
        reopened.reload().unwrap();
        assert_eq!(reopened.config(), &Config::default());
    }

    #[test]
    fn malformed_config_is_a_parse_error() {
        let err = Config::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
