use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use url::Url;

pub mod captions;
pub mod ytdlp;

use crate::{RecipeError, Result};

/// Metadata for a single video as reported by the downloader.
///
/// The underlying JSON is kept as-is; only the handful of keys the pipeline needs
/// get typed accessors.
#[derive(Debug, Clone, Default)]
pub struct VideoInfo(Value);

/// A caption track that can be fetched in yt-dlp's `json3` format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    /// Language code as listed by the platform (`en`, `fr-CA`, `en-orig`, ...)
    pub language: String,

    /// Download URL for the json3 rendition
    pub url: String,

    /// Whether the platform generated the track automatically
    pub automatic: bool,
}

impl VideoInfo {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn id(&self) -> Option<&str> {
        self.0["id"].as_str()
    }

    /// Text posted alongside the video: description, caption or summary
    pub fn post_text(&self) -> &str {
        ["description", "caption", "summary"]
            .iter()
            .filter_map(|key| self.0[*key].as_str())
            .find(|text| !text.is_empty())
            .unwrap_or("")
    }

    /// Caption languages in source order: manual subtitles, automatic captions,
    /// then the video's declared language. Machine translations are skipped.
    pub fn caption_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = Vec::new();

        for (lang, _) in self.caption_entries() {
            if !languages.contains(&lang) {
                languages.push(lang);
            }
        }

        if let Some(lang) = self.0["language"].as_str() {
            if !languages.iter().any(|l| l == lang) {
                languages.push(lang.to_string());
            }
        }

        languages
    }

    /// All json3 caption tracks, manual subtitles first
    pub fn caption_tracks(&self) -> Vec<CaptionTrack> {
        self.caption_entries()
            .into_iter()
            .filter_map(|(language, (formats, automatic))| {
                let url = formats.as_array().and_then(|formats| {
                    formats
                        .iter()
                        .find(|f| f["ext"].as_str() == Some("json3"))
                        .and_then(|f| f["url"].as_str())
                })?;

                Some(CaptionTrack {
                    language,
                    url: url.to_string(),
                    automatic,
                })
            })
            .collect()
    }

    /// Caption entries as (language, (formats, automatic)).
    ///
    /// yt-dlp lists YouTube's machine translations of the speech recognition
    /// track under `automatic_captions`; those carry a `tlang` parameter and are
    /// dropped. The untranslated `<lang>-orig` track is reported as `<lang>`.
    fn caption_entries(&self) -> Vec<(String, (&Value, bool))> {
        let mut entries = Vec::new();

        for (key, automatic) in [("subtitles", false), ("automatic_captions", true)] {
            let Some(map) = self.0[key].as_object() else {
                continue;
            };

            for (lang, formats) in map {
                if automatic && is_translation(formats) {
                    continue;
                }

                let lang = match lang.strip_suffix("-orig") {
                    Some(base) if automatic => base,
                    _ => lang.as_str(),
                };

                entries.push((lang.to_string(), (formats, automatic)));
            }
        }

        entries
    }
}

/// Whether any rendition URL asks YouTube to translate the captions
fn is_translation(formats: &Value) -> bool {
    formats
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|f| f["url"].as_str())
        .filter_map(|url| Url::parse(url).ok())
        .any(|url| url.query_pairs().any(|(name, _)| name == "tlang"))
}

/// Video platforms the pipeline knows how to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Youtube,
    Other,
}

impl Platform {
    /// Classify a URL by its host only
    pub fn detect(url: &str) -> Self {
        let host = Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(|h| h.to_lowercase()));

        match host {
            Some(host) if host.contains("youtube.com") || host.contains("youtu.be") => {
                Platform::Youtube
            }
            _ => Platform::Other,
        }
    }

    /// Whether captions can be pulled from the platform instead of transcribing audio
    pub fn has_caption_api(&self) -> bool {
        matches!(self, Platform::Youtube)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Youtube => "YouTube",
            Platform::Other => "Other",
        }
    }
}

/// Source of video metadata and audio
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Fetch metadata without downloading media
    async fn fetch_info(&self, url: &str) -> Result<VideoInfo>;

    /// Download the audio track as MP3 to `output_path`
    async fn download_audio(&self, url: &str, output_path: &Path) -> Result<()>;
}

/// Validate and normalize URLs
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|_| RecipeError::UnsupportedUrl(url.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RecipeError::UnsupportedUrl(format!(
            "{} (URL must use HTTP or HTTPS protocol)",
            url
        ))
        .into());
    }

    Ok(parsed)
}
