//! Learning-path planning protocol.
//!
//! Each public method is one protocol step against one session. A step loads
//! the session, mutates a local copy and writes it back only when the whole
//! step succeeded, so a rejected or failed step leaves the stored session
//! untouched.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::chapter_selector::{order_confirmed, select_direct, verification_queue, SelectorPolicy};
use super::gap_analyzer::analyze_gaps;
use super::path_assembler::assemble_path;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Advance, AnalysisBundle, AnswerOutcome, AnswerRecord, Curriculum, JustificationRequest,
    PlanningSession, ProgressView, QuestionView, ScoreMap, ScoreOutcome, SessionPhase,
};
use crate::domain::ports::{JustificationProvider, SessionStore};

/// Orchestrates the planning protocol for all sessions
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use cielo::adapters::InMemorySessionStore;
/// use cielo::domain::models::{Curriculum, ScoreMap, ScoreOutcome};
/// use cielo::services::{PlanningService, SelectorPolicy, TemplateJustifier};
///
/// # async fn example() -> cielo::domain::DomainResult<()> {
/// let service = PlanningService::new(
///     Arc::new(Curriculum::builtin()),
///     SelectorPolicy::direct(),
///     Arc::new(InMemorySessionStore::default()),
///     Arc::new(TemplateJustifier::new()),
/// );
///
/// let id = service.start_session().await?;
/// let scores = ScoreMap::new().with("Abstand", 7, 2);
/// if let ScoreOutcome::Ready(bundle) = service.submit_scores(&id, scores, String::new()).await? {
///     println!("{:?}", bundle.final_path);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PlanningService {
    curriculum: Arc<Curriculum>,
    policy: SelectorPolicy,
    store: Arc<dyn SessionStore<PlanningSession>>,
    justifier: Arc<dyn JustificationProvider>,
}

impl PlanningService {
    pub fn new(
        curriculum: Arc<Curriculum>,
        policy: SelectorPolicy,
        store: Arc<dyn SessionStore<PlanningSession>>,
        justifier: Arc<dyn JustificationProvider>,
    ) -> Self {
        Self {
            curriculum,
            policy,
            store,
            justifier,
        }
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub const fn policy(&self) -> SelectorPolicy {
        self.policy
    }

    /// Create a session waiting for scores and return its id
    #[instrument(skip(self), err)]
    pub async fn start_session(&self) -> DomainResult<String> {
        let session = PlanningSession::new_with_uuid();
        let id = session.id.clone();
        self.store.put(&id, session).await?;
        info!(session_id = %id, policy = %self.policy, "planning session started");
        Ok(id)
    }

    async fn load(&self, id: &str) -> DomainResult<PlanningSession> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::SessionNotFound(id.to_string()))
    }

    async fn save(&self, mut session: PlanningSession) -> DomainResult<()> {
        session.touch();
        let id = session.id.clone();
        self.store.put(&id, session).await
    }

    /// Submit the self-assessment
    ///
    /// Under the direct policy, and under the verified policy when no gap is
    /// positive, the path is finished in this step. Otherwise the positive-gap
    /// chapters are queued for scenario questions.
    #[instrument(skip(self, scores, open_answer), fields(session_id = %id), err)]
    pub async fn submit_scores(
        &self,
        id: &str,
        scores: ScoreMap,
        open_answer: String,
    ) -> DomainResult<ScoreOutcome> {
        let mut session = self.load(id).await?;
        if session.phase != SessionPhase::AwaitingScores {
            return Err(DomainError::InvalidProtocolStep {
                phase: session.phase.to_string(),
                reason: "scores were already submitted for this session".to_string(),
            });
        }

        let catalog = &self.curriculum.catalog;
        scores.validate(catalog)?;
        let gaps = analyze_gaps(catalog, &scores);

        session.scores = scores;
        session.gaps = gaps;
        session.open_answer = open_answer;

        let mandatory = match self.policy {
            SelectorPolicy::Direct {
                filter_mastered,
                mastery_threshold,
            } => select_direct(
                &session.gaps,
                &session.scores,
                filter_mastered,
                mastery_threshold,
            ),
            SelectorPolicy::Verified => {
                let queue = verification_queue(&session.gaps);
                if !queue.is_empty() {
                    if let Some(missing) = queue
                        .iter()
                        .find(|chapter| self.curriculum.questions.get(chapter).is_none())
                    {
                        return Err(DomainError::MissingScenarioQuestion(missing.clone()));
                    }

                    info!(
                        session_id = %id,
                        pending = queue.len(),
                        "scores submitted, verification required"
                    );
                    session.pending = queue.iter().cloned().collect();
                    session.phase = SessionPhase::AwaitingQuestion;
                    self.save(session).await?;
                    return Ok(ScoreOutcome::NeedsVerification { pending: queue });
                }
                Vec::new()
            }
        };

        let bundle = self.finalize(&mut session, mandatory).await?;
        self.save(session).await?;
        Ok(ScoreOutcome::Ready(bundle))
    }

    /// Serve the scenario question for the head of the queue
    ///
    /// Serving again before the answer arrives returns the same question.
    #[instrument(skip(self), fields(session_id = %id), err)]
    pub async fn next_question(&self, id: &str) -> DomainResult<QuestionView> {
        let mut session = self.load(id).await?;
        if !session.phase.is_verifying() {
            return Err(DomainError::NoPendingQuestion(id.to_string()));
        }

        let head = session
            .pending_head()
            .ok_or_else(|| DomainError::NoPendingQuestion(id.to_string()))?;
        let question = self
            .curriculum
            .questions
            .get(head)
            .ok_or_else(|| DomainError::MissingScenarioQuestion(head.to_string()))?;
        let view = QuestionView::new(question, session.pending.len());

        session.phase = SessionPhase::AwaitingAnswer;
        self.save(session).await?;
        info!(session_id = %id, chapter = %view.chapter, "scenario question served");
        Ok(view)
    }

    /// Record the answer for the head of the queue
    ///
    /// The chapter must be the queue head and the choice key must belong to its
    /// question. Both are checked before anything changes.
    #[instrument(skip(self), fields(session_id = %id), err)]
    pub async fn submit_answer(
        &self,
        id: &str,
        chapter: &str,
        choice: &str,
    ) -> DomainResult<AnswerOutcome> {
        let mut session = self.load(id).await?;
        match session.phase {
            SessionPhase::AwaitingAnswer => {}
            SessionPhase::AwaitingQuestion => {
                return Err(DomainError::InvalidProtocolStep {
                    phase: session.phase.to_string(),
                    reason: "the next question has not been served yet".to_string(),
                });
            }
            other => {
                return Err(DomainError::InvalidProtocolStep {
                    phase: other.to_string(),
                    reason: "no scenario question is awaiting an answer".to_string(),
                });
            }
        }

        let head = session
            .pending_head()
            .ok_or_else(|| DomainError::NoPendingQuestion(id.to_string()))?;
        if head != chapter {
            return Err(DomainError::ChapterNotAtHead {
                expected: head.to_string(),
                got: chapter.to_string(),
            });
        }

        let question = self
            .curriculum
            .questions
            .get(chapter)
            .ok_or_else(|| DomainError::MissingScenarioQuestion(chapter.to_string()))?;
        let archetype =
            question
                .archetype_for(choice)
                .ok_or_else(|| DomainError::InvalidAnswerKey {
                    chapter: chapter.to_string(),
                    key: choice.to_string(),
                })?;

        session.pending.pop_front();
        let record = AnswerRecord::new(chapter, choice, archetype);
        if record.confirmed {
            session.confirmed.push(chapter.to_string());
        }
        info!(
            session_id = %id,
            chapter = %chapter,
            archetype = %archetype,
            confirmed = record.confirmed,
            "scenario answer recorded"
        );
        session.answers.push(record);

        if !session.pending.is_empty() {
            let remaining = session.pending.len();
            session.phase = SessionPhase::AwaitingQuestion;
            self.save(session).await?;
            return Ok(AnswerOutcome::MorePending { remaining });
        }

        let mandatory = order_confirmed(&session.confirmed, &session.gaps);
        let bundle = self.finalize(&mut session, mandatory).await?;
        self.save(session).await?;
        Ok(AnswerOutcome::Ready(bundle))
    }

    /// Assemble the path, request the justification and start the cursor
    async fn finalize(
        &self,
        session: &mut PlanningSession,
        mandatory: Vec<String>,
    ) -> DomainResult<AnalysisBundle> {
        let path = assemble_path(&self.curriculum.catalog, &mandatory);
        let request = JustificationRequest {
            scores: session.scores.clone(),
            danger_gaps: session.gaps.clone(),
            open_answer: session.open_answer.clone(),
            final_path: path.clone(),
        };

        let justification = self.justifier.justify(&request).await.map_err(|err| {
            warn!(
                session_id = %session.id,
                provider = self.justifier.name(),
                error = %err,
                "justification failed"
            );
            match err {
                DomainError::JustificationFailed(_) => err,
                other => DomainError::JustificationFailed(other.to_string()),
            }
        })?;

        let current_chapter = path
            .get(0)
            .map(str::to_string)
            .unwrap_or_default();

        session.mandatory = mandatory.clone();
        session.path = Some(path.clone());
        session.justification = Some(justification.clone());
        session.phase = SessionPhase::InProgress { cursor: 0 };

        info!(
            session_id = %session.id,
            mandatory = mandatory.len(),
            path_len = path.len(),
            "learning path ready"
        );

        Ok(AnalysisBundle {
            danger_gaps: session.gaps.clone(),
            mandatory_chapters: mandatory,
            final_path: path,
            justification,
            current_chapter,
            verification: session.answers.clone(),
        })
    }

    /// Move the cursor to the next chapter, or complete the path
    #[instrument(skip(self), fields(session_id = %id), err)]
    pub async fn advance(&self, id: &str) -> DomainResult<Advance> {
        let mut session = self.load(id).await?;
        let SessionPhase::InProgress { cursor } = session.phase else {
            let reason = if session.phase == SessionPhase::Complete {
                "the learning path is already complete"
            } else {
                "no learning path has been assembled yet"
            };
            return Err(DomainError::InvalidProtocolStep {
                phase: session.phase.to_string(),
                reason: reason.to_string(),
            });
        };

        let path_len = session.path.as_ref().map_or(0, |p| p.len());
        let next = cursor + 1;
        let outcome = if next < path_len {
            session.phase = SessionPhase::InProgress { cursor: next };
            let chapter = session.current_chapter().unwrap_or_default().to_string();
            info!(session_id = %id, chapter = %chapter, index = next, "advanced");
            Advance::Chapter {
                index: next,
                chapter,
            }
        } else {
            session.phase = SessionPhase::Complete;
            info!(session_id = %id, "learning path complete");
            Advance::Complete
        };

        self.save(session).await?;
        Ok(outcome)
    }

    /// Read-only snapshot of the session
    pub async fn progress(&self, id: &str) -> DomainResult<ProgressView> {
        let session = self.load(id).await?;
        Ok(ProgressView::from(&session))
    }

    /// Discard a session
    #[instrument(skip(self), err)]
    pub async fn end_session(&self, id: &str) -> DomainResult<()> {
        if self.store.delete(id).await? {
            info!(session_id = %id, "planning session ended");
            Ok(())
        } else {
            Err(DomainError::SessionNotFound(id.to_string()))
        }
    }

    /// Drop idle planning sessions
    pub async fn purge_expired(&self) -> DomainResult<usize> {
        self.store.purge_expired().await
    }
}
