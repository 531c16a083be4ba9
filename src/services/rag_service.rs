//! Handbook assistant (Retrieval-Augmented Generation)
//!
//! Answers free-form questions about the driver-assistance system from the
//! handbook. Ingestion chunks and embeds the handbook into a [`VectorIndex`];
//! each chat message retrieves the most similar chunks and hands them to the
//! language model together with the recent conversation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ChatSession, ChatTurn, Curriculum, ScoreMap, ScoredChunk, DEFAULT_MASTERY_THRESHOLD,
};
use crate::domain::ports::{CompletionRequest, EmbeddingProvider, LlmClient, SessionStore};
use crate::infrastructure::vector::{Chunker, VectorIndex};

/// Name the assistant introduces itself with
pub const ASSISTANT_NAME: &str = "CIELO";

const DEFAULT_TOP_K: usize = 4;
const DEFAULT_HISTORY_LIMIT: usize = 10;
const MAX_FOCUS_CHAPTERS: usize = 2;

/// Reply to a chat start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStart {
    pub session_id: String,
    pub message: String,
}

/// RAG chat service over the handbook
pub struct HandbookAssistant {
    curriculum: Arc<Curriculum>,
    llm: Arc<dyn LlmClient>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn SessionStore<ChatSession>>,
    chunker: Chunker,
    index: RwLock<Option<VectorIndex>>,
    top_k: usize,
    history_limit: usize,
    batch_size: usize,
}

impl HandbookAssistant {
    /// Create an assistant without an index
    ///
    /// Chat requests fail with `ChatUnavailable` until an index is installed
    /// or ingested.
    pub fn new(
        curriculum: Arc<Curriculum>,
        llm: Arc<dyn LlmClient>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn SessionStore<ChatSession>>,
        chunker: Chunker,
    ) -> Self {
        Self {
            curriculum,
            llm,
            embedder,
            store,
            chunker,
            index: RwLock::new(None),
            top_k: DEFAULT_TOP_K,
            history_limit: DEFAULT_HISTORY_LIMIT,
            batch_size: usize::MAX,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    #[must_use]
    pub const fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Replace the active index
    pub async fn install_index(&self, index: VectorIndex) -> DomainResult<()> {
        if index.dimension() != self.embedder.dimension() {
            return Err(DomainError::ValidationFailed(format!(
                "index dimension {} does not match embedding provider '{}' ({})",
                index.dimension(),
                self.embedder.name(),
                self.embedder.dimension()
            )));
        }
        info!(chunks = index.len(), model = index.model(), "handbook index installed");
        *self.index.write().await = Some(index);
        Ok(())
    }

    pub async fn has_index(&self) -> bool {
        self.index.read().await.is_some()
    }

    /// Chunk and embed `text` into a fresh index
    ///
    /// `on_progress(done, total)` is called after every embedded batch.
    #[instrument(skip(self, text, on_progress), fields(chars = text.len()), err)]
    pub async fn build_index<F>(&self, text: &str, on_progress: F) -> DomainResult<VectorIndex>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let chunks = self.chunker.split(text);
        if chunks.is_empty() {
            return Err(DomainError::ValidationFailed(
                "handbook text is empty".to_string(),
            ));
        }
        info!(chunks = chunks.len(), "handbook chunked");

        let batch_size = self.batch_size.min(self.embedder.max_batch_size()).max(1);
        let mut index = VectorIndex::new(self.embedder.name(), self.embedder.dimension());
        let total = chunks.len();
        let mut done = 0;

        for batch in chunks.chunks(batch_size) {
            let vectors = self.embedder.embed_batch(batch).await?;
            if vectors.len() != batch.len() {
                return Err(DomainError::ExecutionFailed(format!(
                    "embedding provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            for (text, vector) in batch.iter().zip(vectors) {
                index.add(text.clone(), vector)?;
            }
            done += batch.len();
            on_progress(done, total);
        }

        Ok(index)
    }

    /// Build an index from `text` and make it active
    pub async fn ingest(&self, text: &str) -> DomainResult<usize> {
        let index = self.build_index(text, |_, _| {}).await?;
        let chunks = index.len();
        self.install_index(index).await?;
        Ok(chunks)
    }

    /// Adaptive chapters the user rated lowest, at most two
    ///
    /// Only capability counts here; chapters rated at or above the mastery
    /// threshold are never a focus.
    pub fn focus_chapters(&self, scores: &ScoreMap) -> Vec<String> {
        let mut rated: Vec<(&str, i64)> = self
            .curriculum
            .catalog
            .adaptive()
            .filter_map(|c| scores.get(&c.id).map(|s| (c.id.as_str(), s.capability)))
            .filter(|(_, capability)| *capability < i64::from(DEFAULT_MASTERY_THRESHOLD))
            .collect();
        rated.sort_by_key(|(_, capability)| *capability);
        rated
            .into_iter()
            .take(MAX_FOCUS_CHAPTERS)
            .map(|(c, _)| c.to_string())
            .collect()
    }

    fn greeting(focus: &[String]) -> String {
        let intro = format!(
            "Hallo, ich bin {ASSISTANT_NAME}, Ihr Assistent für das Fahrerassistenzsystem."
        );
        if focus.is_empty() {
            format!("{intro} Fragen Sie mich gern alles, was Sie über das System wissen möchten.")
        } else {
            format!(
                "{intro} Bei {} sind Sie sich laut Ihrer Einschätzung noch unsicher. \
                 Fragen Sie mich gern dazu oder zu allem anderen aus dem Handbuch.",
                focus.join(" und ")
            )
        }
    }

    /// Open a chat and return its greeting
    #[instrument(skip(self, scores), err)]
    pub async fn start_chat(&self, scores: &ScoreMap) -> DomainResult<ChatStart> {
        if !self.has_index().await {
            return Err(DomainError::ChatUnavailable(
                "no handbook index is loaded".to_string(),
            ));
        }
        scores.validate(&self.curriculum.catalog)?;

        let focus = self.focus_chapters(scores);
        let message = Self::greeting(&focus);
        let mut chat = ChatSession::new(focus);
        chat.push(ChatTurn::assistant(message.clone()));

        let session_id = chat.id.clone();
        self.store.put(&session_id, chat).await?;
        info!(session_id = %session_id, "chat session started");
        Ok(ChatStart {
            session_id,
            message,
        })
    }

    /// Build the system prompt with retrieved handbook context
    pub fn build_augmented_prompt(context: &[ScoredChunk], focus: &[String]) -> String {
        let context_str = if context.is_empty() {
            "(kein passender Abschnitt gefunden)".to_string()
        } else {
            context
                .iter()
                .enumerate()
                .map(|(i, hit)| format!("[Abschnitt {}]\n{}", i + 1, hit.chunk.text))
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let mut prompt = format!(
            "Du bist {ASSISTANT_NAME}, ein freundlicher Assistent für ein Fahrerassistenzsystem. \
             Beantworte Fragen auf Deutsch und stütze dich auf die folgenden Abschnitte aus dem \
             Handbuch. Wenn das Handbuch keine Antwort enthält, sage das offen und weise auf die \
             Verantwortung des Fahrers hin.\n\n## Handbuch\n\n{context_str}"
        );
        if !focus.is_empty() {
            prompt.push_str(&format!(
                "\n\n## Nutzerprofil\n\nDer Nutzer fühlt sich unsicher bei: {}.",
                focus.join(", ")
            ));
        }
        prompt
    }

    /// Answer one user message
    #[instrument(skip(self, message), fields(session_id = %session_id), err)]
    pub async fn chat(&self, session_id: &str, message: &str) -> DomainResult<String> {
        let message = message.trim();
        if message.is_empty() {
            return Err(DomainError::ValidationFailed(
                "message cannot be empty".to_string(),
            ));
        }

        let mut chat = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))?;

        if !self.has_index().await {
            return Err(DomainError::ChatUnavailable(
                "no handbook index is loaded".to_string(),
            ));
        }
        let query = self.embedder.embed(message).await?;
        let context = {
            let guard = self.index.read().await;
            let index = guard.as_ref().ok_or_else(|| {
                DomainError::ChatUnavailable("no handbook index is loaded".to_string())
            })?;
            index.search(&query, self.top_k)?
        };
        debug!(session_id = %session_id, hits = context.len(), "handbook context retrieved");

        let mut messages = chat.recent(self.history_limit).to_vec();
        messages.push(ChatTurn::user(message));
        let request = CompletionRequest::new(messages)
            .with_system(Self::build_augmented_prompt(&context, &chat.focus_chapters));

        let reply = self.llm.complete(request).await?.content.trim().to_string();
        if reply.is_empty() {
            return Err(DomainError::ExecutionFailed(
                "language model returned an empty reply".to_string(),
            ));
        }

        chat.push(ChatTurn::user(message));
        chat.push(ChatTurn::assistant(reply.clone()));
        self.store.put(session_id, chat).await?;
        Ok(reply)
    }

    /// Discard a chat session
    pub async fn end_chat(&self, session_id: &str) -> DomainResult<()> {
        if self.store.delete(session_id).await? {
            Ok(())
        } else {
            Err(DomainError::SessionNotFound(session_id.to_string()))
        }
    }

    /// Drop idle chat sessions
    pub async fn purge_expired(&self) -> DomainResult<usize> {
        self.store.purge_expired().await
    }
}
