//! Implementation of the `cielo plan` command.
//!
//! Runs the planning protocol offline with the template justifier. Under the
//! verified policy the scenario questions are asked on the terminal.

use anyhow::{bail, Context, Result};
use clap::Args;
use console::{style, Term};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::errors::DomainError;
use crate::domain::models::{
    AnalysisBundle, AnswerOutcome, PolicyKind, QuestionView, ScoreMap, ScoreOutcome,
};
use crate::services::{PlanningService, SelectorPolicy, TemplateJustifier};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Scores as a JSON file or an inline JSON object
    #[arg(long)]
    pub scores: String,

    /// Selection policy (defaults to `planner.policy`)
    #[arg(long)]
    pub policy: Option<PolicyKind>,

    /// Free-text answer passed on to the justification
    #[arg(long, default_value = "")]
    pub open_answer: String,

    /// Keep chapters the user has mastered (direct policy only)
    #[arg(long)]
    pub keep_mastered: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOutput {
    pub policy: PolicyKind,
    #[serde(flatten)]
    pub bundle: AnalysisBundle,
    #[serde(skip)]
    scores: ScoreMap,
    #[serde(skip)]
    curriculum: Arc<crate::domain::models::Curriculum>,
}

impl CommandOutput for PlanOutput {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let mut sections = Vec::new();

        if self.bundle.danger_gaps.is_empty() {
            sections.push("Keine Kapitel bewertet.".to_string());
        } else {
            sections.push(style("Gefahrenlücken").bold().to_string());
            sections.push(formatter.format_gaps(&self.bundle.danger_gaps, &self.scores));
        }

        if !self.bundle.verification.is_empty() {
            sections.push(style("Szenariofragen").bold().to_string());
            sections.push(formatter.format_answers(&self.bundle.verification));
        }

        sections.push(style(format!("Lernpfad ({})", self.policy.as_str())).bold().to_string());
        sections.push(formatter.format_path(
            &self.bundle.final_path,
            &self.bundle.mandatory_chapters,
            &self.curriculum.catalog,
        ));
        sections.push(self.bundle.justification.clone());
        sections.join("\n\n")
    }
}

/// Parse `--scores`, which is either inline JSON or a path to a JSON file
fn read_scores(raw: &str) -> Result<ScoreMap> {
    let trimmed = raw.trim_start();
    let json = if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        let path = PathBuf::from(raw);
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scores from {}", path.display()))?
    };
    serde_json::from_str(&json).context("Scores must be a JSON object of {capability, limitation}")
}

pub async fn execute(args: PlanArgs, ctx: AppContext, json_mode: bool) -> Result<()> {
    let scores = read_scores(&args.scores)?;
    let policy_kind = args.policy.unwrap_or(ctx.config.planner.policy);
    let mut planner_config = ctx.config.planner.clone();
    planner_config.policy = policy_kind;
    if args.keep_mastered {
        planner_config.filter_mastered = false;
    }

    let service = ctx.planning_service(
        SelectorPolicy::from_config(&planner_config),
        Arc::new(TemplateJustifier::new()),
    );
    let session_id = service.start_session().await?;

    let bundle = match service
        .submit_scores(&session_id, scores.clone(), args.open_answer)
        .await?
    {
        ScoreOutcome::Ready(bundle) => bundle,
        ScoreOutcome::NeedsVerification { pending } => {
            tracing::debug!(pending = ?pending, "asking scenario questions");
            ask_questions(&service, &session_id).await?
        }
    };
    service.end_session(&session_id).await?;

    output(
        &PlanOutput {
            policy: policy_kind,
            bundle,
            scores,
            curriculum: Arc::clone(&ctx.curriculum),
        },
        json_mode,
    );
    Ok(())
}

/// Serve every queued question on stderr and read the answers from stdin
async fn ask_questions(service: &PlanningService, session_id: &str) -> Result<AnalysisBundle> {
    let term = Term::stderr();
    loop {
        let question = service.next_question(session_id).await?;
        let choice = prompt_choice(&term, &question)?;

        match service
            .submit_answer(session_id, &question.chapter, &choice)
            .await
        {
            Ok(AnswerOutcome::Ready(bundle)) => return Ok(bundle),
            Ok(AnswerOutcome::MorePending { .. }) => {}
            Err(DomainError::InvalidAnswerKey { key, .. }) => {
                term.write_line(&format!("{} '{key}' ist keine Antwortoption.", style("!").yellow()))?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn prompt_choice(term: &Term, question: &QuestionView) -> Result<String> {
    term.write_line("")?;
    term.write_line(&format!(
        "{} {}",
        style(format!("[{}]", question.chapter)).cyan(),
        style(&question.question_text).bold()
    ))?;
    for choice in &question.choices {
        term.write_line(&format!("  {}) {}", choice.key, choice.text))?;
    }
    term.write_str("Antwort: ")?;

    let answer = term.read_line().context("Failed to read answer")?;
    let answer = answer.trim();
    if answer.is_empty() {
        bail!("No answer given for chapter '{}'", question.chapter);
    }
    Ok(answer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_inline_scores() {
        let scores = read_scores(r#"{"Abstand":{"capability":7,"limitation":2}}"#).unwrap();
        assert_eq!(scores.get("Abstand").map(|e| e.gap()), Some(5));
    }

    #[test]
    fn test_read_scores_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        std::fs::write(&path, r#"{"Parken":{"capability":3,"limitation":1}}"#).unwrap();
        let scores = read_scores(path.to_str().unwrap()).unwrap();
        assert_eq!(scores.len(), 1);
    }

    #[test]
    fn test_read_scores_rejects_garbage() {
        assert!(read_scores("{not json").is_err());
        assert!(read_scores("/nonexistent/scores.json").is_err());
    }

    #[tokio::test]
    async fn test_direct_plan_output_json() {
        let ctx = AppContext::new(crate::domain::models::Config::default()).unwrap();
        let curriculum = Arc::clone(&ctx.curriculum);
        let service = ctx.planning_service(SelectorPolicy::direct(), Arc::new(TemplateJustifier::new()));
        let id = service.start_session().await.unwrap();
        let scores = ScoreMap::new().with("Abstand", 7, 2);
        let ScoreOutcome::Ready(bundle) = service
            .submit_scores(&id, scores.clone(), String::new())
            .await
            .unwrap()
        else {
            panic!("direct policy must finish immediately");
        };

        let out = PlanOutput {
            policy: PolicyKind::Direct,
            bundle,
            scores,
            curriculum,
        };
        let json = out.to_json();
        assert_eq!(json["policy"], "direct");
        assert_eq!(json["mandatoryChapters"][0], "Abstand");
        assert!(out.to_human().contains("Abstand"));
    }
}
