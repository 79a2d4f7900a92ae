use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::cli::{Language, OutputFormat};
use crate::pipeline::RecipeService;
use crate::Result;

#[derive(Clone)]
struct AppState {
    service: Arc<dyn RecipeService>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    language: Language,
    #[serde(default)]
    format: OutputFormat,
}

/// Plain-text error response
struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{:#}", err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// Router exposing `GET /extract`; every other path is a 404
pub fn router(service: Arc<dyn RecipeService>) -> Router {
    Router::new()
        .route("/extract", get(extract))
        .with_state(AppState { service })
        .layer(TraceLayer::new_for_http())
}

async fn extract(
    State(state): State<AppState>,
    Query(query): Query<ExtractQuery>,
) -> std::result::Result<Response, AppError> {
    let url = query
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Missing url parameter"))?;

    let body = state
        .service
        .extract_recipe(&url, query.language, query.format, None)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, %url, "recipe extraction failed");
            AppError::internal(err)
        })?;

    Ok(([(header::CONTENT_TYPE, query.format.content_type())], body).into_response())
}

/// Bind a listener; `host` may be an IP address or a hostname
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))
}

/// Bind and serve the REST API until the process is stopped
pub async fn serve(host: &str, port: u16, service: Arc<dyn RecipeService>) -> Result<()> {
    let listener = bind(host, port).await?;
    tracing::info!(addr = %listener.local_addr()?, "REST server listening");

    axum::serve(listener, router(service))
        .await
        .context("server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
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
                anyhow::bail!("video info fetch failed");
            }

            Ok(match format {
                OutputFormat::Json => "{}".to_string(),
                OutputFormat::Markdown => "# ok".to_string(),
            })
        }
    }

    async fn spawn(service: Arc<FakeService>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(service)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_extract_uses_defaults() {
        let service = Arc::new(FakeService::default());
        let base = spawn(service.clone()).await;

        let resp = reqwest::get(format!("{}/extract?url=http://v", base)).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()[reqwest::header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(resp.text().await.unwrap(), "{}");

        let calls = service.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![("http://v".to_string(), Language::English, OutputFormat::Json)]
        );
    }

    #[tokio::test]
    async fn test_extract_markdown_in_french() {
        let service = Arc::new(FakeService::default());
        let base = spawn(service.clone()).await;

        let resp = reqwest::get(format!(
            "{}/extract?url=http%3A%2F%2Fv%3Fa%3D1&language=french&format=markdown",
            base
        ))
        .await
        .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()[reqwest::header::CONTENT_TYPE], "text/markdown");
        assert_eq!(resp.text().await.unwrap(), "# ok");

        let calls = service.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![("http://v?a=1".to_string(), Language::French, OutputFormat::Markdown)]
        );
    }

    #[tokio::test]
    async fn test_missing_url_is_bad_request() {
        let service = Arc::new(FakeService::default());
        let base = spawn(service.clone()).await;

        let resp = reqwest::get(format!("{}/extract?language=english", base)).await.unwrap();
        assert_eq!(resp.status(), 400);

        let resp = reqwest::get(format!("{}/extract?url=", base)).await.unwrap();
        assert_eq!(resp.status(), 400);
        assert!(service.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_language_is_bad_request() {
        let base = spawn(Arc::new(FakeService::default())).await;
        let resp = reqwest::get(format!("{}/extract?url=http://v&language=klingon", base))
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_other_paths_are_not_found() {
        let base = spawn(Arc::new(FakeService::default())).await;

        for path in ["/", "/extract/more", "/health?url=http://v"] {
            let resp = reqwest::get(format!("{}{}", base, path)).await.unwrap();
            assert_eq!(resp.status(), 404, "path {}", path);
        }
    }

    #[tokio::test]
    async fn test_pipeline_error_is_internal_error_with_text() {
        let base = spawn(Arc::new(FakeService::default())).await;
        let resp = reqwest::get(format!("{}/extract?url=http://broken", base))
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        assert_eq!(resp.text().await.unwrap(), "video info fetch failed");
    }

    #[tokio::test]
    async fn test_bind_accepts_hostnames() {
        let listener = bind("localhost", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_loopback());

        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(FakeService::default())))
                .await
                .unwrap();
        });

        let resp = reqwest::get(format!("http://{}/extract?url=http://v", addr))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
}
