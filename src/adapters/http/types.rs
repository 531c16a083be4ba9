//! Request and response bodies of the HTTP API.
//!
//! All bodies use camelCase keys, matching the browser frontend.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::models::{AnalysisBundle, AnswerOutcome, Chapter, ScoreMap, ScoreOutcome};

/// Message shown when the learning path could not be created
pub const PATH_CREATION_FAILED: &str =
    "Entschuldigung, bei der Erstellung Ihres Lernpfads ist ein Fehler aufgetreten.";

/// Message shown when a chat reply could not be produced
pub const CHAT_FAILED: &str =
    "Entschuldigung, bei der Verarbeitung Ihrer Nachricht ist ein Fehler aufgetreten.";

/// Reply to `GET /start`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub session_id: String,
    pub policy: String,
}

/// Body of `POST /respond`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub session_id: String,
    pub scores: ScoreMap,
    #[serde(default)]
    pub open_answer: String,
}

/// Body of `POST /answer`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub session_id: String,
    pub chapter: String,
    pub choice: String,
}

/// Body of requests that only name a session
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub session_id: String,
}

/// Reply to `POST /respond` and `POST /answer`
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum StepResponse {
    /// Scenario questions are queued for these chapters
    NeedsVerification { pending_chapters: Vec<String> },
    /// Another scenario question is waiting
    MorePending { remaining: usize },
    /// The learning path is ready
    Ready(AnalysisBundle),
}

impl From<ScoreOutcome> for StepResponse {
    fn from(outcome: ScoreOutcome) -> Self {
        match outcome {
            ScoreOutcome::NeedsVerification { pending } => Self::NeedsVerification {
                pending_chapters: pending,
            },
            ScoreOutcome::Ready(bundle) => Self::Ready(bundle),
        }
    }
}

impl From<AnswerOutcome> for StepResponse {
    fn from(outcome: AnswerOutcome) -> Self {
        match outcome {
            AnswerOutcome::MorePending { remaining } => Self::MorePending { remaining },
            AnswerOutcome::Ready(bundle) => Self::Ready(bundle),
        }
    }
}

/// Reply to `GET /chapters`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterResponse {
    pub id: String,
    pub description: String,
    pub role: String,
    pub has_question: bool,
}

impl ChapterResponse {
    pub fn new(chapter: &Chapter, has_question: bool) -> Self {
        Self {
            id: chapter.id.clone(),
            description: chapter.description.clone(),
            role: chapter.role.as_str().to_string(),
            has_question,
        }
    }
}

/// Body of `POST /start-chat`
#[derive(Debug, Serialize, Deserialize)]
pub struct StartChatRequest {
    #[serde(default)]
    pub scores: ScoreMap,
}

/// Body of `POST /chat-message`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    pub session_id: String,
    pub message: String,
}

/// Reply to `POST /chat-message`
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessageResponse {
    pub message: String,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Where an error surfaced, which picks the generic server-side message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    Planning,
    Chat,
}

/// Domain error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError {
    error: DomainError,
    context: ErrorContext,
}

impl ApiError {
    pub const fn planning(error: DomainError) -> Self {
        Self {
            error,
            context: ErrorContext::Planning,
        }
    }

    pub const fn chat(error: DomainError) -> Self {
        Self {
            error,
            context: ErrorContext::Chat,
        }
    }

    pub fn status(&self) -> StatusCode {
        match &self.error {
            DomainError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::ChatUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        if self.status() != StatusCode::INTERNAL_SERVER_ERROR {
            return self.error.to_string();
        }
        match self.context {
            ErrorContext::Planning => PATH_CREATION_FAILED.to_string(),
            ErrorContext::Chat => CHAT_FAILED.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.error, code = self.error.code(), "request failed");
        } else {
            tracing::debug!(error = %self.error, code = self.error.code(), "request rejected");
        }
        let body = ErrorResponse {
            error: self.message(),
            code: self.error.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::planning(DomainError::ValidationFailed(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::planning(DomainError::ValidationFailed(rejection.body_text()))
    }
}

/// JSON body extractor that rejects with an [`ApiError`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Query string extractor that rejects with an [`ApiError`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{DangerGaps, LearningPath};

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::planning(DomainError::SessionNotFound("sess_x".to_string()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad_key = ApiError::planning(DomainError::InvalidAnswerKey {
            chapter: "Abstand".to_string(),
            key: "z".to_string(),
        });
        assert_eq!(bad_key.status(), StatusCode::BAD_REQUEST);

        let unavailable = ApiError::chat(DomainError::ChatUnavailable("no index".to_string()));
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_server_errors_use_generic_message() {
        let err = ApiError::planning(DomainError::JustificationFailed("timeout".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), PATH_CREATION_FAILED);

        let err = ApiError::chat(DomainError::ExecutionFailed("boom".to_string()));
        assert_eq!(err.message(), CHAT_FAILED);
    }

    #[test]
    fn test_step_response_shape() {
        let json = serde_json::to_value(StepResponse::NeedsVerification {
            pending_chapters: vec!["Abstand".to_string()],
        })
        .unwrap();
        assert_eq!(json["status"], "needs_verification");
        assert_eq!(json["pendingChapters"][0], "Abstand");

        let bundle = AnalysisBundle {
            danger_gaps: DangerGaps::new(),
            mandatory_chapters: vec![],
            final_path: LearningPath::from_chapters(vec!["a".into(), "r".into(), "c".into()]),
            justification: "ok".to_string(),
            current_chapter: "a".to_string(),
            verification: vec![],
        };
        let json = serde_json::to_value(StepResponse::Ready(bundle)).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["finalPath"][1], "r");
        assert_eq!(json["currentChapter"], "a");
    }
}
