//! Common test utilities for integration tests
//!
//! Shared fixtures: planning services over the in-memory store, scripted
//! language-model clients and justification providers.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use cielo::adapters::InMemorySessionStore;
use cielo::domain::errors::{DomainError, DomainResult};
use cielo::domain::models::{Curriculum, JustificationRequest};
use cielo::domain::ports::{
    CompletionRequest, CompletionResponse, JustificationProvider, LlmClient, TokenUsage,
};
use cielo::services::{PlanningService, SelectorPolicy, TemplateJustifier};

pub const OPENING: &str = "Aktivierung";
pub const RISK: &str = "Risiken/Verantwortung";
pub const CLOSING: &str = "Deaktivierung";

/// Setup test logging
#[allow(dead_code)]
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Planning service over the built-in curriculum and the template justifier
pub fn planning_service(policy: SelectorPolicy) -> PlanningService {
    planning_service_with(policy, Arc::new(TemplateJustifier::new()))
}

pub fn planning_service_with(
    policy: SelectorPolicy,
    justifier: Arc<dyn JustificationProvider>,
) -> PlanningService {
    PlanningService::new(
        Arc::new(Curriculum::builtin()),
        policy,
        Arc::new(InMemorySessionStore::default()),
        justifier,
    )
}

/// Justifier that always fails
pub struct FailingJustifier;

#[async_trait]
impl JustificationProvider for FailingJustifier {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn justify(&self, _request: &JustificationRequest) -> DomainResult<String> {
        Err(DomainError::ExecutionFailed("upstream unavailable".to_string()))
    }
}

/// Language-model client returning a fixed reply and recording requests
#[derive(Default)]
pub struct ScriptedLlm {
    reply: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> DomainResult<CompletionResponse> {
        self.requests.lock().unwrap().push(request);
        Ok(CompletionResponse {
            content: self.reply.clone(),
            model: "scripted".to_string(),
            finish_reason: Some("stop".to_string()),
            usage: TokenUsage::default(),
        })
    }
}

/// Expected path for a given middle section
pub fn wrapped(middle: &[&str]) -> Vec<String> {
    std::iter::once(OPENING)
        .chain(middle.iter().copied())
        .chain([RISK, CLOSING])
        .map(String::from)
        .collect()
}

pub const HANDBOOK: &str = "Aktivierung\n\nDas System wird mit der Taste am Lenkrad aktiviert.\n\n\
Abstand\n\nDer Abstandsregeltempomat hält den eingestellten Abstand zum vorausfahrenden Fahrzeug. \
Stehende Hindernisse werden nicht immer erkannt.\n\n\
Notbremsung\n\nDer Notbremsassistent warnt vor Kollisionen und bremst im Notfall automatisch.\n\n\
Deaktivierung\n\nBremsen oder die Taste am Lenkrad schaltet das System ab.";

/// Handbook assistant over the hashing embedder, without an index
pub fn assistant(llm: Arc<dyn LlmClient>) -> cielo::services::HandbookAssistant {
    use cielo::domain::ports::HashingEmbeddingProvider;
    use cielo::infrastructure::vector::Chunker;

    cielo::services::HandbookAssistant::new(
        Arc::new(Curriculum::builtin()),
        llm,
        Arc::new(HashingEmbeddingProvider::new(64)),
        Arc::new(InMemorySessionStore::default()),
        Chunker::new(200, 20).unwrap(),
    )
}
