//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over the repository trait; AppState pins them to the
//! SQLite implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use codeloom_core::chat::service::ChatService;
use codeloom_core::llm::box_provider::BoxLlmProvider;
use codeloom_core::project::service::ProjectService;
use codeloom_infra::config::load_global_config;
use codeloom_infra::llm::{create_provider, resolve_api_key};
use codeloom_infra::sqlite::api_key::SqliteApiKeyRepository;
use codeloom_infra::sqlite::pool::{DatabasePool, database_url};
use codeloom_infra::sqlite::project::SqliteProjectRepository;
use codeloom_types::config::GlobalConfig;
use codeloom_types::llm::LlmError;

pub type ConcreteProjectService = ProjectService<SqliteProjectRepository>;

pub type ConcreteChatService = ChatService<SqliteProjectRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub project_service: Arc<ConcreteProjectService>,
    /// `None` when no provider API key is configured; project and key
    /// commands still work in that case.
    pub chat_service: Option<Arc<ConcreteChatService>>,
    pub api_keys: Arc<SqliteApiKeyRepository>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init(data_dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        let config = load_global_config(data_dir).await;

        let db_pool = DatabasePool::new(&database_url(data_dir)).await?;

        let provider = match create_provider(&config.provider, resolve_api_key(&config.provider)) {
            Ok(provider) => Some(provider),
            Err(e) => {
                tracing::warn!(error = %e, "LLM provider unavailable; chat disabled");
                None
            }
        };

        Ok(Self::from_parts(db_pool, data_dir.to_path_buf(), config, provider))
    }

    /// Wire services from already-built parts.
    pub fn from_parts(
        db_pool: DatabasePool,
        data_dir: PathBuf,
        config: GlobalConfig,
        provider: Option<BoxLlmProvider>,
    ) -> Self {
        let project_service = Arc::new(ProjectService::new(SqliteProjectRepository::new(
            db_pool.clone(),
        )));

        let chat_service = provider.map(|provider| {
            Arc::new(ChatService::new(
                Arc::clone(&project_service),
                provider,
                config.generation.clone(),
                config.chat.clone(),
            ))
        });

        Self {
            project_service,
            chat_service,
            api_keys: Arc::new(SqliteApiKeyRepository::new(db_pool.clone())),
            config: Arc::new(config),
            data_dir,
            db_pool,
        }
    }

    /// The chat service, or why it is unavailable.
    pub fn chat(&self) -> Result<&Arc<ConcreteChatService>, LlmError> {
        self.chat_service.as_ref().ok_or_else(|| {
            LlmError::NotConfigured(format!(
                "{} API key missing; set {}",
                self.config.provider.kind,
                self.config.provider.api_key_env()
            ))
        })
    }
}
