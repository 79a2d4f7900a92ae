use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use crate::extractors::captions::{caption_transcript, CaptionSource};
use crate::extractors::{validate_url, MediaSource, Platform, VideoInfo};

/// Speech-to-text service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file and return the recognized text
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Obtains a transcript for a video URL from captions or from its audio
pub struct TranscriptAcquirer {
    source: Arc<dyn MediaSource>,
    captions: Arc<dyn CaptionSource>,
    transcriber: Arc<dyn Transcriber>,
    temp_root: Option<PathBuf>,
}

impl TranscriptAcquirer {
    pub fn new(
        source: Arc<dyn MediaSource>,
        captions: Arc<dyn CaptionSource>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            source,
            captions,
            transcriber,
            temp_root: None,
        }
    }

    /// Create scratch directories under `root` instead of the system temp dir
    pub fn with_temp_root(mut self, root: Option<PathBuf>) -> Self {
        self.temp_root = root;
        self
    }

    /// Fetch metadata, acquire the transcript and prepend the post text.
    ///
    /// The transcript alone (without post text) is written to `save_transcript` when given.
    pub async fn transcript_for_url(
        &self,
        url: &str,
        save_transcript: Option<&Path>,
    ) -> Result<String> {
        validate_url(url)?;

        tracing::info!("Fetching video info for: {}", url);
        let info = self.source.fetch_info(url).await?;

        let preferred = info.caption_languages();
        let transcript = self.acquire(url, &info, &preferred).await?;

        if let Some(path) = save_transcript {
            fs_err::write(path, &transcript).context("Failed to save transcript")?;
            tracing::info!("Transcript saved to: {}", path.display());
        }

        Ok(combine(info.post_text(), &transcript))
    }

    /// Platform captions when available, otherwise download and transcribe the audio
    pub async fn acquire(&self, url: &str, info: &VideoInfo, preferred: &[String]) -> Result<String> {
        let platform = Platform::detect(url);

        if platform.has_caption_api() {
            if let Some(text) = caption_transcript(self.captions.as_ref(), info, preferred).await {
                tracing::info!("Using existing {} transcript", platform.name());
                return Ok(text);
            }
        }

        self.transcribe_audio(url).await
    }

    async fn transcribe_audio(&self, url: &str) -> Result<String> {
        let scratch = ScratchAudio::create(self.temp_root.as_deref())?;
        let result = self.download_and_transcribe(url, scratch.path()).await;
        scratch.close();
        result
    }

    async fn download_and_transcribe(&self, url: &str, audio_path: &Path) -> Result<String> {
        tracing::info!("Downloading audio to: {}", audio_path.display());
        self.source.download_audio(url, audio_path).await?;

        tracing::info!("Transcribing audio...");
        self.transcriber.transcribe(audio_path).await
    }
}

/// Post text and transcript separated by a blank line
fn combine(post_text: &str, transcript: &str) -> String {
    format!("{}\n\n{}", post_text, transcript).trim().to_string()
}

/// Per-request temporary directory holding one uniquely named audio file
struct ScratchAudio {
    dir: TempDir,
    path: PathBuf,
}

impl ScratchAudio {
    fn create(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("recipe-extractor-");

        let dir = match root {
            Some(root) => {
                fs_err::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .context("Failed to create temporary directory")?;

        let path = dir
            .path()
            .join(format!("audio_{}.mp3", &Uuid::new_v4().to_string()[..8]));

        Ok(Self { dir, path })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn close(self) {
        let location = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!(
                "Could not remove temporary audio {}: {}",
                location.display(),
                e
            );
        }
    }
}
