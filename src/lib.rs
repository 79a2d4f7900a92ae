//! Recipe Extractor - turn cooking videos into structured recipes
//!
//! This library fetches video metadata with yt-dlp, obtains a transcript from platform
//! captions or by transcribing the audio track, and asks an LLM to extract the recipe.
//! The result is rendered as JSON or Markdown and served through a CLI, a REST endpoint
//! or an MCP tool.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod mcp;
pub mod openai;
pub mod output;
pub mod pipeline;
pub mod recipe;
pub mod server;
pub mod transcribe;
pub mod utils;

pub use cli::{Cli, Language, McpTransport, OutputFormat};
pub use config::Config;
pub use extractors::{MediaSource, Platform, VideoInfo};
pub use pipeline::{RecipePipeline, RecipeService};
pub use recipe::{Healthiness, Recipe, RecipeExtractor};
pub use transcribe::{TranscriptAcquirer, Transcriber};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to recipe extraction
#[derive(thiserror::Error, Debug)]
pub enum RecipeError {
    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),

    #[error("yt-dlp is not available. Please install it: https://github.com/yt-dlp/yt-dlp")]
    YtDlpMissing,

    #[error("Video info fetch failed: {0}")]
    VideoInfoFailed(String),

    #[error("Audio download failed: {0}")]
    AudioDownloadFailed(String),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("Recipe extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },
}
