use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{CaptionTrack, VideoInfo};
use crate::Result;

/// Platform-hosted caption tracks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// List the caption tracks available for a video
    async fn list_tracks(&self, info: &VideoInfo) -> Result<Vec<CaptionTrack>>;

    /// Fetch the plain text of one track
    async fn fetch_text(&self, track: &CaptionTrack) -> Result<String>;
}

/// YouTube captions, listed from yt-dlp metadata and fetched as json3
pub struct YoutubeCaptions {
    client: Client,
}

impl YoutubeCaptions {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Default for YoutubeCaptions {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Join caption events into a single line of text
fn json3_text(captions: &Json3) -> String {
    captions
        .events
        .iter()
        .map(|event| {
            event
                .segs
                .iter()
                .map(|seg| seg.utf8.as_str())
                .collect::<String>()
                .replace('\n', " ")
        })
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl CaptionSource for YoutubeCaptions {
    async fn list_tracks(&self, info: &VideoInfo) -> Result<Vec<CaptionTrack>> {
        if info.id().is_none() {
            anyhow::bail!("video metadata has no id");
        }

        Ok(info.caption_tracks())
    }

    async fn fetch_text(&self, track: &CaptionTrack) -> Result<String> {
        let response = self.client.get(&track.url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch {} captions: HTTP {}",
                track.language,
                response.status()
            );
        }

        let captions: Json3 = response.json().await?;
        Ok(json3_text(&captions))
    }
}

/// Order tracks for trial: preferred languages first, then everything else as listed
pub fn order_tracks(tracks: Vec<CaptionTrack>, preferred: &[String]) -> Vec<CaptionTrack> {
    let mut remaining = tracks;
    let mut ordered = Vec::with_capacity(remaining.len());

    for lang in preferred {
        let (matching, rest): (Vec<_>, Vec<_>) =
            remaining.into_iter().partition(|t| &t.language == lang);
        ordered.extend(matching);
        remaining = rest;
    }

    ordered.extend(remaining);
    ordered
}

/// Try caption tracks in preference order and return the first non-empty text.
///
/// Listing and fetch errors are logged and treated as missing captions.
pub async fn caption_transcript(
    source: &dyn CaptionSource,
    info: &VideoInfo,
    preferred: &[String],
) -> Option<String> {
    let tracks = match source.list_tracks(info).await {
        Ok(tracks) => tracks,
        Err(e) => {
            tracing::warn!("Could not list captions: {:#}", e);
            return None;
        }
    };

    for track in order_tracks(tracks, preferred) {
        match source.fetch_text(&track).await {
            Ok(text) if !text.trim().is_empty() => {
                tracing::debug!(
                    "Using {} captions{}",
                    track.language,
                    if track.automatic { " (automatic)" } else { "" }
                );
                return Some(text);
            }
            Ok(_) => tracing::debug!("Captions for {} are empty", track.language),
            Err(e) => tracing::warn!("Issue while getting {} captions: {:#}", track.language, e),
        }
    }

    None
}
