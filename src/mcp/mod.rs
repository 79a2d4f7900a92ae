//! MCP tool server exposing `extract_recipe`.
//!
//! The server speaks either stdio or streamable HTTP; both wrap the same
//! [`RecipeMcpServer`] handler.

use anyhow::Context;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::cli::{Language, McpTransport, OutputFormat};
use crate::pipeline::RecipeService;
use crate::Result;

pub const TOOL_NAME: &str = "extract_recipe";

/// Arguments of the `extract_recipe` tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractRecipeArgs {
    /// URL of the cooking video
    pub url: String,
    /// Language of the extracted recipe
    #[serde(default)]
    pub language: Language,
    /// Output format of the returned text
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Clone)]
pub struct RecipeMcpServer {
    service: Arc<dyn RecipeService>,
}

impl RecipeMcpServer {
    pub fn new(service: Arc<dyn RecipeService>) -> Self {
        Self { service }
    }

    pub fn tools() -> std::result::Result<Vec<Tool>, McpError> {
        let schema = serde_json::to_value(schemars::schema_for!(ExtractRecipeArgs))
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        let Value::Object(input_schema) = schema else {
            return Err(McpError::internal_error("tool schema is not an object", None));
        };

        Ok(vec![Tool::new(
            TOOL_NAME,
            "Extract a structured recipe (title, ingredients, steps, tips, servings, health assessment) from a cooking video URL. Returns JSON or Markdown.",
            Arc::new(input_schema),
        )])
    }

    /// Dispatch a tool call; pipeline failures come back as error results
    pub async fn run_tool(
        &self,
        request: CallToolRequestParam,
    ) -> std::result::Result<CallToolResult, McpError> {
        if request.name.as_ref() != TOOL_NAME {
            return Err(McpError::invalid_params(
                format!("unknown tool: {}", request.name),
                None,
            ));
        }

        let arguments = Value::Object(request.arguments.unwrap_or_default());
        let args: ExtractRecipeArgs = serde_json::from_value(arguments)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        tracing::info!(url = %args.url, "MCP extract_recipe call");

        match self
            .service
            .extract_recipe(&args.url, args.language, args.format, None)
            .await
        {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(err) => {
                tracing::error!(error = ?err, "MCP extract_recipe failed");
                Ok(CallToolResult::error(vec![Content::text(format!("{:#}", err))]))
            }
        }
    }
}

impl ServerHandler for RecipeMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Call extract_recipe with a cooking video URL to get its recipe.".to_string(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(Self::tools()?))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        self.run_tool(request).await
    }
}

/// Run the MCP server on the chosen transport until the client disconnects
pub async fn serve(
    transport: McpTransport,
    host: &str,
    port: u16,
    service: Arc<dyn RecipeService>,
) -> Result<()> {
    let server = RecipeMcpServer::new(service);

    match transport {
        McpTransport::Stdio => {
            tracing::info!("MCP server on stdio");
            let running = server
                .serve(rmcp::transport::stdio())
                .await
                .context("MCP initialization failed")?;
            running.waiting().await?;
        }
        McpTransport::StreamableHttp => {
            let mcp_service = StreamableHttpService::new(
                move || Ok(server.clone()),
                Arc::new(LocalSessionManager::default()),
                StreamableHttpServerConfig::default(),
            );
            let app = axum::Router::new().nest_service("/mcp", mcp_service);

            let listener = crate::server::bind(host, port).await?;
            tracing::info!(addr = %listener.local_addr()?, "MCP server listening on /mcp");
            axum::serve(listener, app).await.context("server error")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeService {
        calls: Mutex<Vec<(String, Language, OutputFormat)>>,
    }

    #[async_trait]
    impl RecipeService for FakeService {
        async fn extract_recipe(
            &self,
            url: &str,
            language: Language,
            format: OutputFormat,
            _save_transcript: Option<&Path>,
        ) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), language, format));
            if url.contains("broken") {
                anyhow::bail!("transcription failed");
            }
            Ok("done".to_string())
        }
    }

    fn call(name: &'static str, arguments: Value) -> CallToolRequestParam {
        CallToolRequestParam {
            name: name.into(),
            arguments: arguments.as_object().cloned(),
        }
    }

    #[tokio::test]
    async fn test_tool_call_uses_defaults() {
        let service = Arc::new(FakeService::default());
        let server = RecipeMcpServer::new(service.clone());

        let result = server
            .run_tool(call(TOOL_NAME, json!({"url": "http://v"})))
            .await
            .unwrap();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["content"].as_array().unwrap().len(), 1);
        assert_eq!(value["content"][0]["text"], "done");
        assert_ne!(value["isError"], json!(true));

        let calls = service.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![("http://v".to_string(), Language::English, OutputFormat::Json)]
        );
    }

    #[tokio::test]
    async fn test_tool_call_passes_language_and_format() {
        let service = Arc::new(FakeService::default());
        let server = RecipeMcpServer::new(service.clone());

        server
            .run_tool(call(
                TOOL_NAME,
                json!({"url": "http://v", "language": "french", "format": "markdown"}),
            ))
            .await
            .unwrap();

        let calls = service.calls.lock().unwrap().clone();
        assert_eq!(calls[0].1, Language::French);
        assert_eq!(calls[0].2, OutputFormat::Markdown);
    }

    #[tokio::test]
    async fn test_pipeline_failure_is_error_result() {
        let server = RecipeMcpServer::new(Arc::new(FakeService::default()));
        let result = server
            .run_tool(call(TOOL_NAME, json!({"url": "http://broken"})))
            .await
            .unwrap();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["isError"], json!(true));
        assert_eq!(value["content"][0]["text"], "transcription failed");
    }

    #[tokio::test]
    async fn test_bad_calls_are_invalid_params() {
        let server = RecipeMcpServer::new(Arc::new(FakeService::default()));

        assert!(server
            .run_tool(call("summarize", json!({"url": "http://v"})))
            .await
            .is_err());
        assert!(server.run_tool(call(TOOL_NAME, json!({}))).await.is_err());
        assert!(server
            .run_tool(call(TOOL_NAME, json!({"url": "http://v", "format": "pdf"})))
            .await
            .is_err());
    }

    #[test]
    fn test_tool_schema_lists_parameters() {
        let tools = RecipeMcpServer::tools().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, TOOL_NAME);

        let schema = Value::Object((*tools[0].input_schema).clone());
        let properties = schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("url"));
        assert!(properties.contains_key("language"));
        assert!(properties.contains_key("format"));
        assert_eq!(schema["required"], json!(["url"]));
    }
}
