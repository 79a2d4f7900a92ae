use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenAI-compatible API settings
    pub openai: OpenAiConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Base URL of the API, without trailing slash
    pub api_base: String,

    /// Model used for recipe extraction
    pub chat_model: String,

    /// Model used for speech-to-text
    pub transcription_model: String,

    /// Sampling temperature for recipe extraction
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Parent directory for per-request scratch directories
    pub temp_dir: Option<PathBuf>,

    /// yt-dlp executable
    pub yt_dlp_path: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o".to_string(),
            transcription_model: "gpt-4o-mini-transcribe".to_string(),
            temperature: 0.2,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, the usual locations, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path().filter(|path| path.exists()),
        };

        let config = match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        serde_yaml::from_str(&content).context("Failed to parse config file")
    }

    /// Get configuration file path
    fn config_path() -> Option<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("recipe-extractor").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.openai.api_base)
            .with_context(|| format!("Invalid API base URL: {}", self.openai.api_base))?;

        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("API base URL must use HTTP or HTTPS protocol");
        }

        if !(0.0..=2.0).contains(&self.openai.temperature) {
            anyhow::bail!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.openai.temperature
            );
        }

        if self.openai.chat_model.trim().is_empty()
            || self.openai.transcription_model.trim().is_empty()
        {
            anyhow::bail!("Model names must not be empty");
        }

        Ok(())
    }

    /// API base with any trailing slash removed
    pub fn api_base(&self) -> &str {
        self.openai.api_base.trim_end_matches('/')
    }
}
