//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`. Middleware: CORS, tracing.

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat::relay))
        .route(
            "/project",
            get(handlers::project::get_project)
                .put(handlers::project::replace_project)
                .patch(handlers::project::patch_project)
                .delete(handlers::project::reset_project),
        )
        .route("/project/files", put(handlers::project::put_file))
        .route(
            "/project/files/{*name}",
            axum::routing::delete(handlers::project::delete_file),
        )
        .route(
            "/project/preview/{*name}",
            get(handlers::project::preview_file),
        )
        .route("/health", get(health_check));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness check (no auth required).
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    let database = match sqlx::query("SELECT 1").execute(&state.db_pool.reader).await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "health check query failed");
            "unavailable"
        }
    };
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
        "chat": state.chat_service.is_some(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use codeloom_core::llm::box_provider::BoxLlmProvider;
    use codeloom_core::llm::provider::LlmProvider;
    use codeloom_infra::sqlite::pool::{DatabasePool, database_url};
    use codeloom_types::chat::DEFAULT_APOLOGY;
    use codeloom_types::config::GlobalConfig;
    use codeloom_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};
    use serde_json::{Value, json};

    /// Provider that always answers with the same text, or fails.
    struct StaticProvider {
        reply: Option<String>,
        calls: Arc<AtomicUsize>,
    }

    impl LlmProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        fn default_model(&self) -> &str {
            "static-model"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(text) => Ok(CompletionResponse {
                    content: text.clone(),
                    model: "static-model".to_string(),
                    finish_reason: None,
                    usage: Usage::default(),
                }),
                None => Err(LlmError::Provider {
                    message: "Gemini API error: 500".to_string(),
                }),
            }
        }
    }

    struct TestServer {
        base: String,
        key: String,
        client: reqwest::Client,
        calls: Arc<AtomicUsize>,
    }

    impl TestServer {
        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
            builder.header("Authorization", format!("Bearer {}", self.key))
        }
    }

    async fn spawn(reply: Option<&str>, with_provider: bool) -> TestServer {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&database_url(dir.path())).await.unwrap();
        let data_dir = dir.path().to_path_buf();
        std::mem::forget(dir);

        let calls = Arc::new(AtomicUsize::new(0));
        let provider = with_provider.then(|| {
            BoxLlmProvider::new(StaticProvider {
                reply: reply.map(str::to_string),
                calls: Arc::clone(&calls),
            })
        });

        let state = AppState::from_parts(pool, data_dir, GlobalConfig::default(), provider);
        let key = state.api_keys.create_key("alice", "test").await.unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });

        TestServer {
            base: format!("http://{addr}"),
            key,
            client: reqwest::Client::new(),
            calls,
        }
    }

    #[tokio::test]
    async fn test_health_needs_no_auth() {
        let srv = spawn(None, false).await;
        let resp = srv.client.get(srv.url("/health")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "ok");
        assert_eq!(body["chat"], false);
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthorized() {
        let srv = spawn(None, false).await;
        let resp = srv
            .client
            .get(srv.url("/api/v1/project"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["errors"][0]["code"], "UNAUTHORIZED");

        let resp = srv
            .client
            .get(srv.url("/api/v1/project"))
            .header("X-API-Key", "loom_unknown")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
    }

    #[tokio::test]
    async fn test_get_project_defaults() {
        let srv = spawn(None, false).await;
        let resp = srv
            .authed(srv.client.get(srv.url("/api/v1/project")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["files"], json!([]));
        assert_eq!(
            body["data"]["technologies"],
            json!(["CSS", "HTML", "JavaScript", "Tailwind CSS"])
        );
        assert_eq!(body["data"]["installedLibraries"], json!([]));
        assert_eq!(body["_links"]["self"], "/api/v1/project");
    }

    #[tokio::test]
    async fn test_file_lifecycle_and_preview() {
        let srv = spawn(None, false).await;

        let resp = srv
            .authed(srv.client.put(srv.url("/api/v1/project/files")))
            .json(&json!({"name": "index.html", "content": "<h1>Hi</h1>"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["files"][0]["name"], "index.html");

        let resp = srv
            .authed(srv.client.get(srv.url("/api/v1/project/preview/index.html")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()["content-type"].to_str().unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            resp.headers()["content-security-policy"].to_str().unwrap(),
            "sandbox allow-scripts"
        );
        assert_eq!(resp.text().await.unwrap(), "<h1>Hi</h1>");

        let resp = srv
            .authed(srv.client.delete(srv.url("/api/v1/project/files/index.html")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let resp = srv
            .authed(srv.client.delete(srv.url("/api/v1/project/files/index.html")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        let resp = srv
            .authed(srv.client.get(srv.url("/api/v1/project/preview/index.html")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_nested_file_names() {
        let srv = spawn(None, false).await;
        srv.authed(srv.client.put(srv.url("/api/v1/project/files")))
            .json(&json!({"name": "js/app.js", "content": "let x = 1;"}))
            .send()
            .await
            .unwrap();

        let resp = srv
            .authed(srv.client.get(srv.url("/api/v1/project/preview/js/app.js")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "let x = 1;");
    }

    #[tokio::test]
    async fn test_put_file_rejects_traversal() {
        let srv = spawn(None, false).await;
        let resp = srv
            .authed(srv.client.put(srv.url("/api/v1/project/files")))
            .json(&json!({"name": "../etc/passwd", "content": "x"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_replace_patch_and_reset() {
        let srv = spawn(None, false).await;

        let resp = srv
            .authed(srv.client.put(srv.url("/api/v1/project")))
            .json(&json!({
                "file_structure": [{"name": "a.html", "content": "a"}],
                "technologies": ["HTML"],
                "installed_libraries": null
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let resp = srv
            .authed(srv.client.patch(srv.url("/api/v1/project")))
            .json(&json!({"installedLibraries": ["Chart.js"], "metadata": {"title": "T"}}))
            .send()
            .await
            .unwrap();
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["technologies"], json!(["HTML"]));
        assert_eq!(body["data"]["installedLibraries"], json!(["Chart.js"]));
        assert_eq!(body["data"]["metadata"]["title"], "T");
        assert_eq!(body["data"]["files"][0]["name"], "a.html");

        let resp = srv
            .authed(srv.client.delete(srv.url("/api/v1/project")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = srv
            .authed(srv.client.get(srv.url("/api/v1/project")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["data"]["files"], json!([]));
    }

    #[tokio::test]
    async fn test_chat_returns_bare_reply() {
        let srv = spawn(
            Some(r#"Sure! {"message": "Done", "code": "<p>x</p>", "filename": "index.html"}"#),
            true,
        )
        .await;

        let resp = srv
            .authed(srv.client.post(srv.url("/api/v1/chat")))
            .json(&json!({"message": "make a page", "conversationHistory": []}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            json!({"message": "Done", "code": "<p>x</p>", "filename": "index.html"})
        );

        // The relay does not persist the generated file.
        let project: Value = srv
            .authed(srv.client.get(srv.url("/api/v1/project")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(project["data"]["files"], json!([]));
    }

    #[tokio::test]
    async fn test_chat_upstream_failure_returns_apology() {
        let srv = spawn(None, true).await;
        let resp = srv
            .authed(srv.client.post(srv.url("/api/v1/chat")))
            .json(&json!({"message": "hello"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], DEFAULT_APOLOGY);
        assert!(body["error"].as_str().unwrap().contains("500"));
        assert_eq!(srv.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_chat_without_provider_returns_apology() {
        let srv = spawn(None, false).await;
        let resp = srv
            .authed(srv.client.post(srv.url("/api/v1/chat")))
            .json(&json!({"message": "hello"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], DEFAULT_APOLOGY);
        assert!(body["error"].as_str().unwrap().contains("GOOGLE_GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_chat_blank_message_is_bad_request() {
        let srv = spawn(Some("unused"), true).await;
        let resp = srv
            .authed(srv.client.post(srv.url("/api/v1/chat")))
            .json(&json!({"message": "   "}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        assert_eq!(srv.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_chat_unsafe_project_state_is_bad_request() {
        let srv = spawn(Some("unused"), true).await;
        let resp = srv
            .authed(srv.client.post(srv.url("/api/v1/chat")))
            .json(&json!({
                "message": "hello",
                "projectState": {"files": [{"name": "../../etc/passwd", "content": ""}]}
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], DEFAULT_APOLOGY);
        assert_eq!(srv.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_chat_requires_auth() {
        let srv = spawn(Some("x"), true).await;
        let resp = srv
            .client
            .post(srv.url("/api/v1/chat"))
            .json(&json!({"message": "hi"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
    }
}
