use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::cli::{Language, OutputFormat};
use crate::config::Config;
use crate::extractors::captions::{CaptionSource, YoutubeCaptions};
use crate::extractors::ytdlp::YtDlpSource;
use crate::extractors::MediaSource;
use crate::openai::OpenAiClient;
use crate::output::format_recipe;
use crate::recipe::{ChatModel, RecipeExtractor};
use crate::transcribe::{TranscriptAcquirer, Transcriber};
use crate::Result;

/// The one operation every front end calls
#[async_trait]
pub trait RecipeService: Send + Sync {
    /// Extract a recipe from a video URL and render it
    async fn extract_recipe(
        &self,
        url: &str,
        language: Language,
        format: OutputFormat,
        save_transcript: Option<&Path>,
    ) -> Result<String>;
}

/// Video URL -> transcript -> recipe JSON -> formatted output
pub struct RecipePipeline {
    acquirer: TranscriptAcquirer,
    extractor: RecipeExtractor,
}

impl RecipePipeline {
    /// Build the production pipeline from configuration
    pub fn new(config: &Config, api_key: &str) -> Self {
        let http = reqwest::Client::new();
        let openai = Arc::new(OpenAiClient::with_client(http.clone(), config, api_key));

        Self::from_parts(
            Arc::new(YtDlpSource::new(config.app.yt_dlp_path.clone())),
            Arc::new(YoutubeCaptions::new(http)),
            openai.clone(),
            openai,
        )
        .with_temp_root(config.app.temp_dir.clone())
    }

    pub fn from_parts(
        source: Arc<dyn MediaSource>,
        captions: Arc<dyn CaptionSource>,
        transcriber: Arc<dyn Transcriber>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            acquirer: TranscriptAcquirer::new(source, captions, transcriber),
            extractor: RecipeExtractor::new(model),
        }
    }

    fn with_temp_root(mut self, root: Option<std::path::PathBuf>) -> Self {
        self.acquirer = self.acquirer.with_temp_root(root);
        self
    }
}

#[async_trait]
impl RecipeService for RecipePipeline {
    async fn extract_recipe(
        &self,
        url: &str,
        language: Language,
        format: OutputFormat,
        save_transcript: Option<&Path>,
    ) -> Result<String> {
        let transcript = self.acquirer.transcript_for_url(url, save_transcript).await?;
        let recipe_json = self.extractor.extract(&transcript, language).await?;
        tracing::info!("Recipe extracted, rendering as {}", format);
        format_recipe(&recipe_json, format, language)
    }
}
