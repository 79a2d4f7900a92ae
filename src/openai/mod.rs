//! Client for OpenAI-compatible speech-to-text and chat completion endpoints.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

use crate::config::Config;
use crate::recipe::{ChatModel, StructuredRequest};
use crate::transcribe::Transcriber;
use crate::{RecipeError, Result};

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    api_base: String,
    chat_model: String,
    transcription_model: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    refusal: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &Config, api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), config, api_key)
    }

    pub fn with_client(client: Client, config: &Config, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            api_base: config.api_base().to_string(),
            chat_model: config.openai.chat_model.clone(),
            transcription_model: config.openai.transcription_model.clone(),
            temperature: config.openai.temperature,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }
}

/// Turn a non-2xx response into an error carrying the body
async fn error_for_status(response: Response) -> std::result::Result<Response, String> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(format!("HTTP {}: {}", status, body.trim()))
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(audio_path)
            .await
            .with_context(|| format!("Failed to read audio file {}", audio_path.display()))?;

        let file_name = audio_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")?;

        let form = Form::new()
            .text("model", self.transcription_model.clone())
            .text("response_format", "json")
            .part("file", part);

        let response = self
            .client
            .post(self.endpoint("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Failed to call transcription API")?;

        let response = error_for_status(response)
            .await
            .map_err(RecipeError::TranscriptionFailed)?;

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .context("Failed to parse transcription response")?;

        Ok(parsed.text)
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete_json(&self, request: StructuredRequest) -> Result<String> {
        let body = json!({
            "model": self.chat_model,
            "temperature": self.temperature,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "strict": true,
                    "schema": request.schema,
                },
            },
        });

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to call chat completions API")?;

        let response = error_for_status(response)
            .await
            .map_err(RecipeError::ExtractionFailed)?;

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completions response")?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| RecipeError::ExtractionFailed("response had no choices".to_string()))?;

        if let Some(refusal) = message.refusal {
            return Err(RecipeError::ExtractionFailed(format!("model refused: {}", refusal)).into());
        }

        message
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| RecipeError::ExtractionFailed("empty model response".to_string()).into())
    }
}
