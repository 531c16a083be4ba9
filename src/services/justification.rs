//! Justification providers.
//!
//! `LlmJustifier` asks the chat-completion API for a short personalized text;
//! `TemplateJustifier` builds a deterministic German text locally.

use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChatTurn, JustificationRequest};
use crate::domain::ports::{CompletionRequest, JustificationProvider, LlmClient};

const JUSTIFICATION_SYSTEM_PROMPT: &str = "Du bist ein erfahrener Tutor für Fahrerassistenzsysteme. \
Du erklärst Nutzerinnen und Nutzern freundlich und ermutigend, warum ihr persönlicher Lernpfad \
so aufgebaut ist. Antworte ausschließlich mit dem Begründungstext auf Deutsch.";

/// Justification generated by a language model
pub struct LlmJustifier {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl LlmJustifier {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            max_tokens: 600,
        }
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Build the user prompt for a finished analysis
    pub fn build_prompt(request: &JustificationRequest) -> DomainResult<String> {
        let scores = serde_json::to_string(&request.scores)?;
        let gaps = serde_json::to_string(&request.danger_gaps)?;
        let path = request.final_path.chapters().join(" → ");

        let mut prompt = String::new();
        let _ = writeln!(prompt, "Ergebnisse der Selbsteinschätzung:");
        let _ = writeln!(prompt, "- Rohwerte (capability vs. limitation): {scores}");
        let _ = writeln!(
            prompt,
            "- Danger Gaps (hoher Wert = mögliche Selbstüberschätzung): {gaps}"
        );
        let _ = writeln!(
            prompt,
            "- Antwort auf \"Was ist das größte Missverständnis über das System?\": \"{}\"",
            request.open_answer
        );
        let _ = writeln!(prompt, "- Erstellter Lernpfad: {path}");
        let _ = writeln!(prompt);
        let _ = writeln!(
            prompt,
            "Erkläre kurz, warum das Tutorial so aufgebaut ist. Bei hohen Danger Gaps \
             würdige das Selbstvertrauen, betone aber die Systemgrenzen. Bei niedrigen oder \
             negativen Gaps lobe das ausgewogene Verständnis. Gehe auf die offene Antwort ein, \
             wenn sie zu den Werten passt."
        );
        Ok(prompt)
    }
}

#[async_trait]
impl JustificationProvider for LlmJustifier {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn justify(&self, request: &JustificationRequest) -> DomainResult<String> {
        let prompt = Self::build_prompt(request)?;
        let completion = CompletionRequest::new(vec![ChatTurn::user(prompt)])
            .with_system(JUSTIFICATION_SYSTEM_PROMPT)
            .with_max_tokens(self.max_tokens);

        let response = self
            .client
            .complete(completion)
            .await
            .map_err(|e| DomainError::JustificationFailed(e.to_string()))?;

        let text = response.content.trim();
        if text.is_empty() {
            return Err(DomainError::JustificationFailed(
                "language model returned an empty text".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}

/// Deterministic justification built from the gaps and the path
#[derive(Debug, Clone, Default)]
pub struct TemplateJustifier;

impl TemplateJustifier {
    pub const fn new() -> Self {
        Self
    }

    pub fn render(request: &JustificationRequest) -> String {
        let middle = request.final_path.middle();
        let mut text = String::new();

        if middle.is_empty() {
            text.push_str(
                "Ihre Einschätzung von Wissen und Praxis ist ausgewogen. \
                 Deshalb starten Sie direkt mit den Grundlagen und den Pflichtkapiteln.",
            );
        } else {
            let focus: Vec<String> = middle
                .iter()
                .map(|chapter| match request.danger_gaps.get(chapter) {
                    Some(gap) if gap > 0 => format!("{chapter} (Differenz {gap})"),
                    _ => chapter.clone(),
                })
                .collect();
            let _ = write!(
                text,
                "Ihr Lernpfad legt den Schwerpunkt auf {}. Hier schätzen Sie Ihr Wissen höher ein \
                 als Ihre praktische Erfahrung mit den Grenzen des Systems.",
                focus.join(", ")
            );
        }

        text.push_str(
            " Die Kapitel zu Risiken und Verantwortung sowie zur Deaktivierung sind immer \
             Teil des Pfads.",
        );

        let open_answer = request.open_answer.trim();
        if !open_answer.is_empty() {
            let _ = write!(
                text,
                " Ihre Anmerkung \"{open_answer}\" greifen wir in den Kapiteln auf."
            );
        }
        text
    }
}

#[async_trait]
impl JustificationProvider for TemplateJustifier {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn justify(&self, request: &JustificationRequest) -> DomainResult<String> {
        Ok(Self::render(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Curriculum, ScoreMap};
    use crate::domain::ports::CompletionResponse;
    use crate::services::{analyze_gaps, assemble_path};
    use std::sync::Mutex;

    fn request(open_answer: &str, mandatory: &[&str]) -> JustificationRequest {
        let curriculum = Curriculum::builtin();
        let scores = ScoreMap::new().with("Abstand", 7, 2).with("Ampelerkennung", 4, 4);
        let mandatory: Vec<String> = mandatory.iter().map(|s| (*s).to_string()).collect();
        JustificationRequest {
            danger_gaps: analyze_gaps(&curriculum.catalog, &scores),
            scores,
            open_answer: open_answer.to_string(),
            final_path: assemble_path(&curriculum.catalog, &mandatory),
        }
    }

    struct RecordingClient {
        reply: String,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl LlmClient for RecordingClient {
        async fn complete(&self, request: CompletionRequest) -> DomainResult<CompletionResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(CompletionResponse {
                content: self.reply.clone(),
                model: "test".to_string(),
                finish_reason: Some("stop".to_string()),
                usage: Default::default(),
            })
        }
    }

    struct FailingClient;

    #[async_trait]
    impl LlmClient for FailingClient {
        async fn complete(&self, _request: CompletionRequest) -> DomainResult<CompletionResponse> {
            Err(DomainError::ExecutionFailed("HTTP 500".to_string()))
        }
    }

    #[test]
    fn test_template_mentions_focus_chapters_and_gap() {
        let text = TemplateJustifier::render(&request("", &["Abstand"]));
        assert!(text.contains("Abstand (Differenz 5)"));
        assert!(text.contains("Risiken und Verantwortung"));
    }

    #[test]
    fn test_template_for_minimal_path_and_open_answer() {
        let text = TemplateJustifier::render(&request("Das Auto fährt allein", &[]));
        assert!(text.contains("ausgewogen"));
        assert!(text.contains("Das Auto fährt allein"));
    }

    #[test]
    fn test_prompt_contains_analysis() {
        let prompt = LlmJustifier::build_prompt(&request("Bremsen", &["Abstand"])).unwrap();
        assert!(prompt.contains(r#""Abstand":5"#));
        assert!(prompt.contains("Bremsen"));
        assert!(prompt.contains("Aktivierung → Abstand"));
    }

    #[tokio::test]
    async fn test_llm_justifier_trims_reply() {
        let client = Arc::new(RecordingClient {
            reply: "  Gute Balance!  ".to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let justifier = LlmJustifier::new(client.clone());
        let text = justifier.justify(&request("", &[])).await.unwrap();
        assert_eq!(text, "Gute Balance!");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].system.is_some());
        assert_eq!(seen[0].max_tokens, Some(600));
    }

    #[tokio::test]
    async fn test_llm_justifier_rejects_empty_reply() {
        let client = Arc::new(RecordingClient {
            reply: "   ".to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let err = LlmJustifier::new(client).justify(&request("", &[])).await.unwrap_err();
        assert!(matches!(err, DomainError::JustificationFailed(_)));
    }

    #[tokio::test]
    async fn test_llm_failure_maps_to_justification_failed() {
        let err = LlmJustifier::new(Arc::new(FailingClient))
            .justify(&request("", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::JustificationFailed(msg) if msg.contains("HTTP 500")));
    }
}
