//! Wiring of configuration into services, shared by all commands.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{InMemorySessionStore, OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
use crate::domain::models::{
    ChatSession, Config, Curriculum, EmbeddingKind, JustificationKind, PlanningSession,
};
use crate::domain::ports::{
    EmbeddingProvider, HashingEmbeddingProvider, JustificationProvider, LlmClient, SessionStore,
};
use crate::infrastructure::llm::{OpenAiChatClient, OpenAiClientConfig};
use crate::infrastructure::vector::{Chunker, VectorIndex};
use crate::services::{
    HandbookAssistant, LlmJustifier, PlanningService, SelectorPolicy, TemplateJustifier,
};

/// Loaded configuration and curriculum
pub struct AppContext {
    pub config: Config,
    pub curriculum: Arc<Curriculum>,
}

impl AppContext {
    /// Load the curriculum named by `planner.curriculum_path`, or the built-in one
    pub fn new(config: Config) -> Result<Self> {
        let curriculum = match &config.planner.curriculum_path {
            Some(path) => Curriculum::from_yaml_file(path)
                .with_context(|| format!("Failed to load curriculum from {path}"))?,
            None => Curriculum::builtin(),
        };
        let missing = curriculum.chapters_without_question();
        if !missing.is_empty() {
            tracing::warn!(
                chapters = ?missing,
                "adaptive chapters without scenario question; verification will reject them"
            );
        }
        Ok(Self {
            config,
            curriculum: Arc::new(curriculum),
        })
    }

    fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.config.sessions.ttl_secs)
    }

    pub fn llm_client(&self) -> Result<Arc<dyn LlmClient>> {
        let client = OpenAiChatClient::new(OpenAiClientConfig::from_config(&self.config))
            .context("Failed to create chat-completion client")?;
        if !client.has_api_key() {
            tracing::warn!("no API key configured; language-model calls will fail");
        }
        Ok(Arc::new(client))
    }

    pub fn embedder(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        Ok(match self.config.embedding.provider {
            EmbeddingKind::OpenAi => Arc::new(
                OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::from_config(&self.config))
                    .context("Failed to create embedding client")?,
            ),
            EmbeddingKind::Hashing => {
                Arc::new(HashingEmbeddingProvider::new(self.config.embedding.dimension))
            }
        })
    }

    pub fn justifier(&self, llm: &Arc<dyn LlmClient>) -> Arc<dyn JustificationProvider> {
        match self.config.justification.provider {
            JustificationKind::Llm => Arc::new(LlmJustifier::new(Arc::clone(llm))),
            JustificationKind::Template => Arc::new(TemplateJustifier::new()),
        }
    }

    pub fn planning_service(
        &self,
        policy: SelectorPolicy,
        justifier: Arc<dyn JustificationProvider>,
    ) -> PlanningService {
        let store: Arc<dyn SessionStore<PlanningSession>> =
            Arc::new(InMemorySessionStore::with_ttl(self.session_ttl()));
        PlanningService::new(Arc::clone(&self.curriculum), policy, store, justifier)
    }

    pub fn chunker(&self) -> Result<Chunker> {
        Chunker::new(self.config.rag.chunk_size, self.config.rag.chunk_overlap)
            .context("Invalid chunking configuration")
    }

    /// Handbook assistant without an index
    pub fn handbook_assistant(&self, llm: Arc<dyn LlmClient>) -> Result<HandbookAssistant> {
        let store: Arc<dyn SessionStore<ChatSession>> =
            Arc::new(InMemorySessionStore::with_ttl(self.session_ttl()));
        Ok(HandbookAssistant::new(
            Arc::clone(&self.curriculum),
            llm,
            self.embedder()?,
            store,
            self.chunker()?,
        )
        .with_top_k(self.config.rag.top_k)
        .with_history_limit(self.config.rag.history_limit)
        .with_batch_size(self.config.embedding.batch_size))
    }

    /// Handbook assistant with the stored index installed, if RAG is enabled
    ///
    /// A missing index is not an error: chat answers "unavailable" until
    /// `cielo ingest` has been run.
    pub async fn serving_assistant(
        &self,
        llm: Arc<dyn LlmClient>,
    ) -> Result<Option<Arc<HandbookAssistant>>> {
        if !self.config.rag.enabled {
            tracing::info!("handbook assistant disabled");
            return Ok(None);
        }

        let assistant = self.handbook_assistant(llm)?;
        let index_path = Path::new(&self.config.rag.index_path);
        if index_path.exists() {
            let index = VectorIndex::load(index_path)
                .with_context(|| format!("Failed to load index {}", index_path.display()))?;
            assistant
                .install_index(index)
                .await
                .context("Stored index does not match the embedding provider")?;
        } else {
            tracing::warn!(
                path = %index_path.display(),
                "no handbook index found; run `cielo ingest` to enable chat"
            );
        }
        Ok(Some(Arc::new(assistant)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_curriculum_by_default() {
        let ctx = AppContext::new(Config::default()).unwrap();
        assert!(ctx.curriculum.catalog.contains("Aktivierung"));
    }

    #[test]
    fn test_missing_curriculum_file_fails() {
        let mut config = Config::default();
        config.planner.curriculum_path = Some("/nonexistent/curriculum.yaml".to_string());
        assert!(AppContext::new(config).is_err());
    }

    #[tokio::test]
    async fn test_serving_assistant_respects_rag_switch() {
        let mut config = Config::default();
        config.rag.enabled = false;
        config.embedding.provider = EmbeddingKind::Hashing;
        let ctx = AppContext::new(config).unwrap();
        let llm = ctx.llm_client().unwrap();
        assert!(ctx.serving_assistant(llm).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_serving_assistant_without_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.embedding.provider = EmbeddingKind::Hashing;
        config.embedding.dimension = 64;
        config.rag.index_path = dir.path().join("missing.json").display().to_string();
        let ctx = AppContext::new(config).unwrap();
        let llm = ctx.llm_client().unwrap();

        let assistant = ctx.serving_assistant(llm).await.unwrap().unwrap();
        assert!(!assistant.has_index().await);
    }
}
