use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;

use super::{MediaSource, VideoInfo};
use crate::{RecipeError, Result};

/// Metadata and audio source backed by the yt-dlp executable
pub struct YtDlpSource {
    yt_dlp_path: String,
}

impl YtDlpSource {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!("Running {} {}", self.yt_dlp_path, args.join(" "));

        Command::new(&self.yt_dlp_path)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => anyhow::Error::from(RecipeError::YtDlpMissing),
                _ => anyhow::Error::new(e).context("Failed to run yt-dlp"),
            })
    }
}

/// Output template for yt-dlp: the extension is filled in after audio extraction
fn output_template(output_path: &Path) -> String {
    output_path
        .with_extension("%(ext)s")
        .to_string_lossy()
        .into_owned()
}

#[async_trait]
impl MediaSource for YtDlpSource {
    async fn fetch_info(&self, url: &str) -> Result<VideoInfo> {
        tracing::debug!("Extracting video info for: {}", url);

        let output = self
            .run(&["--dump-json", "--no-playlist", "--skip-download", url])
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(RecipeError::VideoInfoFailed(error.trim().to_string()).into());
        }

        let info: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| RecipeError::VideoInfoFailed(format!("invalid yt-dlp JSON: {}", e)))?;

        Ok(VideoInfo::new(info))
    }

    async fn download_audio(&self, url: &str, output_path: &Path) -> Result<()> {
        tracing::debug!("Downloading audio for {} to {}", url, output_path.display());

        let template = output_template(output_path);
        let output = self
            .run(&[
                "--output",
                template.as_str(),
                "--format",
                "bestaudio/best",
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "192K",
                "--no-playlist",
                "--quiet",
                url,
            ])
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(RecipeError::AudioDownloadFailed(error.trim().to_string()).into());
        }

        if !output_path.exists() {
            return Err(RecipeError::AudioDownloadFailed(format!(
                "yt-dlp reported success but {} was not created",
                output_path.display()
            ))
            .into());
        }

        Ok(())
    }
}

impl Default for YtDlpSource {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}
