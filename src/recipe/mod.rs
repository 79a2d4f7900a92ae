use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::cli::Language;
use crate::{RecipeError, Result};

/// Structured recipe as returned by the model.
///
/// Every field defaults so that a partially filled response still renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipe {
    pub title: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub tips: Vec<String>,
    pub servings: String,
    pub healthiness: Healthiness,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Healthiness {
    pub indicator: String,
    pub rationale: String,
}

/// A chat completion constrained by a JSON schema
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub system: String,
    pub user: String,
    pub schema_name: String,
    pub schema: Value,
}

/// Chat model able to answer with schema-constrained JSON
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run the completion and return the raw message content
    async fn complete_json(&self, request: StructuredRequest) -> Result<String>;
}

const SYSTEM_PROMPT: &str =
    "You are a meticulous culinary assistant. You extract recipes from cooking video transcripts and never invent content.";

const EXTRACTION_RULES: &str = r#"Below is the transcript of a cooking video, possibly preceded by the text posted with it.
Extract the recipe it describes.

Rules:
- List only ingredients that are explicitly mentioned, with quantities when they are stated.
- List only the preparation steps that are explicitly described, in the order given.
- Tips must come from the video itself. Leave the list empty if there are none.
- Report the number of servings only if it is stated, otherwise use "N/A".
- Rate the recipe as healthy, neutral or unhealthy and justify the rating in one sentence.
- Never add ingredients, steps or tips that are not stated."#;

/// JSON schema requested from the model
pub fn recipe_schema() -> Value {
    let string_list = json!({"type": "array", "items": {"type": "string"}});

    json!({
        "type": "object",
        "properties": {
            "title": {"type": "string"},
            "ingredients": string_list,
            "steps": string_list,
            "tips": string_list,
            "servings": {"type": "string"},
            "healthiness": {
                "type": "object",
                "properties": {
                    "indicator": {"type": "string", "enum": ["healthy", "neutral", "unhealthy"]},
                    "rationale": {"type": "string"}
                },
                "required": ["indicator", "rationale"],
                "additionalProperties": false
            }
        },
        "required": ["title", "ingredients", "steps", "tips", "servings", "healthiness"],
        "additionalProperties": false
    })
}

/// Turns transcripts into recipe JSON with a chat model
pub struct RecipeExtractor {
    model: Arc<dyn ChatModel>,
}

impl RecipeExtractor {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub fn build_request(transcript: &str, language: Language) -> StructuredRequest {
        let user = format!(
            "{}\n\nWrite every field in {}.\n\nTranscript:\n\"\"\"\n{}\n\"\"\"",
            EXTRACTION_RULES,
            language.display_name(),
            transcript
        );

        StructuredRequest {
            system: SYSTEM_PROMPT.to_string(),
            user,
            schema_name: "recipe".to_string(),
            schema: recipe_schema(),
        }
    }

    /// Extract a recipe and return the model's JSON text unmodified
    pub async fn extract(&self, transcript: &str, language: Language) -> Result<String> {
        tracing::info!("Extracting recipe ({} characters of transcript)", transcript.len());

        let content = self
            .model
            .complete_json(Self::build_request(transcript, language))
            .await?;

        serde_json::from_str::<Value>(&content).map_err(|e| {
            RecipeError::ExtractionFailed(format!("model returned invalid JSON: {}", e))
        })?;

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthiness_indicator_enum_in_schema() {
        let request = RecipeExtractor::build_request("dummy", Language::English);
        let enum_values =
            &request.schema["properties"]["healthiness"]["properties"]["indicator"]["enum"];
        assert_eq!(enum_values, &json!(["healthy", "neutral", "unhealthy"]));
        assert_eq!(request.schema_name, "recipe");
    }

    #[test]
    fn test_schema_requires_every_field() {
        let schema = recipe_schema();
        let required: Vec<_> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            required,
            vec!["title", "ingredients", "steps", "tips", "servings", "healthiness"]
        );
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn test_prompt_contains_language_directive_and_transcript() {
        let request = RecipeExtractor::build_request("add two eggs", Language::French);
        assert!(request.user.contains("Write every field in French."));
        assert!(request.user.contains("\"\"\"\nadd two eggs\n\"\"\""));
        assert!(request.user.contains("Never add ingredients"));
    }

    #[tokio::test]
    async fn test_extract_returns_raw_content() {
        let raw = r#"{"title": "Crêpes", "ingredients": ["farine"]}"#;
        let mut model = MockChatModel::new();
        model
            .expect_complete_json()
            .withf(|req| req.user.contains("in English"))
            .times(1)
            .returning(move |_| Ok(raw.to_string()));

        let extractor = RecipeExtractor::new(Arc::new(model));
        let content = extractor.extract("transcript", Language::English).await.unwrap();
        assert_eq!(content, raw);
    }

    #[tokio::test]
    async fn test_extract_rejects_non_json() {
        let mut model = MockChatModel::new();
        model
            .expect_complete_json()
            .returning(|_| Ok("Sorry, I cannot help".to_string()));

        let extractor = RecipeExtractor::new(Arc::new(model));
        let err = extractor.extract("t", Language::English).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RecipeError>(),
            Some(RecipeError::ExtractionFailed(_))
        ));
    }

    #[test]
    fn test_recipe_tolerates_missing_fields() {
        let recipe: Recipe = serde_json::from_str(r#"{"title": "Soup"}"#).unwrap();
        assert_eq!(recipe.title, "Soup");
        assert!(recipe.tips.is_empty());
        assert_eq!(recipe.healthiness, Healthiness::default());
    }
}
