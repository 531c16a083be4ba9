//! Route handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use super::server::AppState;
use super::types::{
    AnswerRequest, ApiError, ApiJson, ApiQuery, ChapterResponse, ChatMessageRequest,
    ChatMessageResponse, RespondRequest, SessionRequest, StartChatRequest, StartResponse,
    StepResponse,
};
use crate::domain::errors::DomainError;
use crate::domain::models::{Advance, ProgressView, QuestionView};
use crate::services::{ChatStart, HandbookAssistant};

type Shared = State<Arc<AppState>>;
type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn start_session(State(state): Shared) -> ApiResult<StartResponse> {
    let session_id = state
        .planning
        .start_session()
        .await
        .map_err(ApiError::planning)?;
    Ok(Json(StartResponse {
        session_id,
        policy: state.planning.policy().to_string(),
    }))
}

pub async fn submit_scores(
    State(state): Shared,
    ApiJson(req): ApiJson<RespondRequest>,
) -> ApiResult<StepResponse> {
    let outcome = state
        .planning
        .submit_scores(&req.session_id, req.scores, req.open_answer)
        .await
        .map_err(ApiError::planning)?;
    Ok(Json(outcome.into()))
}

pub async fn next_question(
    State(state): Shared,
    ApiQuery(query): ApiQuery<SessionRequest>,
) -> ApiResult<QuestionView> {
    let question = state
        .planning
        .next_question(&query.session_id)
        .await
        .map_err(ApiError::planning)?;
    Ok(Json(question))
}

pub async fn submit_answer(
    State(state): Shared,
    ApiJson(req): ApiJson<AnswerRequest>,
) -> ApiResult<StepResponse> {
    let outcome = state
        .planning
        .submit_answer(&req.session_id, &req.chapter, &req.choice)
        .await
        .map_err(ApiError::planning)?;
    Ok(Json(outcome.into()))
}

pub async fn advance(
    State(state): Shared,
    ApiJson(req): ApiJson<SessionRequest>,
) -> ApiResult<Advance> {
    let step = state
        .planning
        .advance(&req.session_id)
        .await
        .map_err(ApiError::planning)?;
    Ok(Json(step))
}

pub async fn progress(
    State(state): Shared,
    ApiQuery(query): ApiQuery<SessionRequest>,
) -> ApiResult<ProgressView> {
    let view = state
        .planning
        .progress(&query.session_id)
        .await
        .map_err(ApiError::planning)?;
    Ok(Json(view))
}

pub async fn end_session(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .planning
        .end_session(&id)
        .await
        .map_err(ApiError::planning)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_chapters(State(state): Shared) -> Json<Vec<ChapterResponse>> {
    let curriculum = state.planning.curriculum();
    Json(
        curriculum
            .catalog
            .iter()
            .map(|c| ChapterResponse::new(c, curriculum.questions.get(&c.id).is_some()))
            .collect(),
    )
}

fn assistant(state: &AppState) -> Result<&HandbookAssistant, ApiError> {
    state.assistant.as_deref().ok_or_else(|| {
        ApiError::chat(DomainError::ChatUnavailable(
            "the handbook assistant is disabled".to_string(),
        ))
    })
}

pub async fn start_chat(
    State(state): Shared,
    ApiJson(req): ApiJson<StartChatRequest>,
) -> ApiResult<ChatStart> {
    let started = assistant(&state)?
        .start_chat(&req.scores)
        .await
        .map_err(ApiError::chat)?;
    Ok(Json(started))
}

pub async fn chat_message(
    State(state): Shared,
    ApiJson(req): ApiJson<ChatMessageRequest>,
) -> ApiResult<ChatMessageResponse> {
    let message = assistant(&state)?
        .chat(&req.session_id, &req.message)
        .await
        .map_err(ApiError::chat)?;
    Ok(Json(ChatMessageResponse { message }))
}
