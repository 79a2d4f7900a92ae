use clap::{Parser, ValueEnum};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "recipe-extractor",
    about = "Recipe Extractor - Turn cooking videos into structured recipes",
    version,
    long_about = "Downloads a cooking video, reuses its captions or transcribes the audio, and asks an LLM to extract the recipe as JSON or Markdown. Can also run as a REST server or an MCP tool server."
)]
pub struct Cli {
    /// Video URL (YouTube, Instagram, TikTok, or anything yt-dlp supports)
    #[arg(value_name = "URL", required_unless_present_any = ["server", "mcp"])]
    pub url: Option<String>,

    /// Output file name without extension
    #[arg(short, long, value_name = "NAME", default_value = "recipe")]
    pub output: String,

    /// Language of the extracted recipe
    #[arg(short, long, value_enum, default_value_t = Language::English)]
    pub language: Language,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Save the raw transcript to a file
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "transcript.txt"
    )]
    pub save_transcript: Option<PathBuf>,

    /// Run the REST server instead of a one-off extraction
    #[arg(short, long, conflicts_with = "mcp")]
    pub server: bool,

    /// Run the MCP tool server instead of a one-off extraction
    #[arg(short, long)]
    pub mcp: bool,

    /// Host interface for the REST or MCP HTTP server
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// TCP port for the REST or MCP HTTP server
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// MCP transport
    #[arg(long, value_enum, default_value_t = McpTransport::Stdio)]
    pub mcp_transport: McpTransport,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to a YAML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(
    ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    French,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
        }
    }

    /// Language name as written in prompts
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::French => "French",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::English => write!(f, "english"),
            Language::French => write!(f, "french"),
        }
    }
}

#[derive(
    ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Rendered Markdown document
    Markdown,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Markdown => "text/markdown",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum McpTransport {
    /// Standard input/output
    #[default]
    Stdio,
    /// Streamable HTTP served at /mcp
    StreamableHttp,
}
