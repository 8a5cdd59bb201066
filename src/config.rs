use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::i18n::Language;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_messages: default_max_messages(),
        }
    }
}

fn default_top_k() -> u32 {
    3
}
fn default_max_messages() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            max_size_bytes: default_max_size_bytes(),
        }
    }
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["pdf".to_string(), "doc".to_string(), "docx".to_string()]
}
fn default_max_size_bytes() -> u64 {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LibraryConfig {
    /// Show the built-in sample listing when `GET /documents` fails.
    #[serde(default)]
    pub offline_fallback: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub language: Language,
}

impl Config {
    /// Configuration used when no config file exists: local backend, defaults everywhere.
    pub fn minimal() -> Self {
        Self {
            api: ApiConfig::default(),
            chat: ChatConfig::default(),
            upload: UploadConfig::default(),
            library: LibraryConfig::default(),
            ui: UiConfig::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be > 0");
        }
        match reqwest::Url::parse(&self.api.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => anyhow::bail!(
                "api.base_url must use http or https, got '{}'",
                url.scheme()
            ),
            Err(e) => anyhow::bail!("api.base_url is not a valid URL: {}", e),
        }

        if self.chat.top_k < 1 {
            anyhow::bail!("chat.top_k must be >= 1");
        }
        if self.chat.max_messages < 1 {
            anyhow::bail!("chat.max_messages must be >= 1");
        }

        if self.upload.allowed_extensions.is_empty() {
            anyhow::bail!("upload.allowed_extensions must not be empty");
        }
        if self.upload.max_size_bytes == 0 {
            anyhow::bail!("upload.max_size_bytes must be > 0");
        }

        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}
