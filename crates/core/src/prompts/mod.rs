use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::PromptConfig;

const BUILT_IN_PROMPTS: &str = include_str!("../../prompts/default.toml");

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptSource {
    BuiltIn,
    File(PathBuf),
}

impl PromptSource {
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::BuiltIn)
    }
}

#[derive(Clone, Debug)]
pub struct PromptText {
    key: String,
    text: String,
    label: Option<String>,
    source: PromptSource,
}

impl PromptText {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn source(&self) -> &PromptSource {
        &self.source
    }
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt `{0}` not found")]
    NotFound(String),
    #[error("prompt `{0}` has empty text")]
    Empty(String),
    #[error("failed to read prompt file `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse built-in prompt definitions: {0}")]
    ParseBuiltIn(toml::de::Error),
    #[error("failed to parse prompt file `{path}` as TOML: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to parse prompt file `{path}` as YAML: {source}")]
    ParseYaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Keyed system-prompt texts: the built-in set, then every `.toml`/`.yaml`
/// file of the custom directories in name order. Later definitions replace
/// earlier ones with the same key.
#[derive(Debug)]
pub struct PromptRegistry {
    prompts: BTreeMap<String, PromptText>,
    directories: Vec<PathBuf>,
}

impl PromptRegistry {
    pub fn new() -> Result<Self, PromptError> {
        Self::with_custom_directories::<PathBuf>(&[])
    }

    pub fn from_prompt_config(config: &PromptConfig) -> Result<Self, PromptError> {
        Self::with_custom_directories(&config.custom_directories)
    }

    pub fn with_custom_directories<P: AsRef<Path>>(directories: &[P]) -> Result<Self, PromptError> {
        let mut registry = Self {
            prompts: BTreeMap::new(),
            directories: directories
                .iter()
                .map(|p| p.as_ref().to_path_buf())
                .collect(),
        };
        registry.reload()?;
        Ok(registry)
    }

    pub fn reload(&mut self) -> Result<(), PromptError> {
        let mut prompts = BTreeMap::new();
        for prompt in parse_toml(BUILT_IN_PROMPTS, PromptSource::BuiltIn)
            .map_err(PromptError::ParseBuiltIn)?
        {
            prompts.insert(prompt.key.clone(), prompt);
        }
        for dir in &self.directories {
            load_directory(dir, &mut prompts)?;
        }
        self.prompts = prompts;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&PromptText> {
        self.prompts.get(key)
    }

    pub fn text(&self, key: &str) -> Result<&str, PromptError> {
        let prompt = self
            .get(key)
            .ok_or_else(|| PromptError::NotFound(key.to_string()))?;
        if prompt.text.trim().is_empty() {
            return Err(PromptError::Empty(key.to_string()));
        }
        Ok(prompt.text())
    }
}

fn load_directory(dir: &Path, prompts: &mut BTreeMap<String, PromptText>) -> Result<(), PromptError> {
    if !dir.is_dir() {
        return Ok(());
    }

    let io_err = |source| PromptError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    for path in files {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if !matches!(ext.as_str(), "toml" | "yaml" | "yml") {
            continue;
        }

        let contents = fs::read_to_string(&path).map_err(|source| PromptError::Io {
            path: path.clone(),
            source,
        })?;
        let source = PromptSource::File(path.clone());
        let parsed = if ext == "toml" {
            parse_toml(&contents, source).map_err(|source| PromptError::ParseToml {
                path: path.clone(),
                source,
            })?
        } else {
            let document: PromptDocument =
                serde_yaml::from_str(&contents).map_err(|source| PromptError::ParseYaml {
                    path: path.clone(),
                    source,
                })?;
            document.into_prompts(&source)
        };
        for prompt in parsed {
            prompts.insert(prompt.key.clone(), prompt);
        }
    }

    Ok(())
}

fn parse_toml(contents: &str, source: PromptSource) -> Result<Vec<PromptText>, toml::de::Error> {
    let document: PromptDocument = toml::from_str(contents)?;
    Ok(document.into_prompts(&source))
}

#[derive(Debug, Deserialize)]
struct PromptDocument {
    #[serde(default)]
    prompts: BTreeMap<String, RawPrompt>,
}

impl PromptDocument {
    fn into_prompts(self, source: &PromptSource) -> Vec<PromptText> {
        self.prompts
            .into_iter()
            .map(|(key, raw)| PromptText {
                key,
                text: raw.text.trim().to_string(),
                label: raw.label,
                source: source.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawPrompt {
    #[serde(alias = "template")]
    text: String,
    #[serde(default)]
    label: Option<String>,
}
