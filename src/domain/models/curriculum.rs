//! Curriculum: the chapter catalog together with its scenario question bank.
//!
//! The built-in curriculum is the German driver-assistance tutorial. An
//! alternative curriculum can be loaded from YAML:
//!
//! ```yaml
//! chapters:
//!   - id: Aktivierung
//!     description: Wie man das System aktiviert.
//!     role: fixed-opening
//! questions:
//!   - chapter: Abstand
//!     text: ...
//!     choices:
//!       - { key: a, text: ..., archetype: correct }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::chapter::{Chapter, ChapterCatalog, ChapterRole};
use super::scenario::{Archetype, Choice, QuestionBank, ScenarioQuestion};
use crate::domain::errors::{DomainError, DomainResult};

pub const OPENING_CHAPTER: &str = "Aktivierung";
pub const RISK_CHAPTER: &str = "Risiken/Verantwortung";
pub const CLOSING_CHAPTER: &str = "Deaktivierung";

/// Catalog and question bank, loaded once and shared read-only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curriculum {
    #[serde(rename = "chapters")]
    pub catalog: ChapterCatalog,

    #[serde(default)]
    pub questions: QuestionBank,
}

impl Curriculum {
    /// Build and validate a curriculum
    pub fn new(catalog: ChapterCatalog, questions: QuestionBank) -> DomainResult<Self> {
        let curriculum = Self { catalog, questions };
        curriculum.validate()?;
        Ok(curriculum)
    }

    /// Parse a curriculum from YAML text
    pub fn from_yaml_str(yaml: &str) -> DomainResult<Self> {
        let curriculum: Self = serde_yaml::from_str(yaml)?;
        curriculum.validate()?;
        Ok(curriculum)
    }

    /// Load a curriculum from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> DomainResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            DomainError::InvalidCurriculum(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check question bank consistency against the catalog
    ///
    /// Catalog-level invariants are already enforced by [`ChapterCatalog::new`].
    pub fn validate(&self) -> DomainResult<()> {
        let mut seen_chapters = HashSet::new();

        for question in self.questions.iter() {
            let Some(chapter) = self.catalog.get(&question.chapter) else {
                return Err(DomainError::InvalidCurriculum(format!(
                    "question registered for unknown chapter '{}'",
                    question.chapter
                )));
            };
            if !chapter.is_adaptive() {
                return Err(DomainError::InvalidCurriculum(format!(
                    "question registered for {} chapter '{}'",
                    chapter.role, chapter.id
                )));
            }
            if !seen_chapters.insert(question.chapter.as_str()) {
                return Err(DomainError::InvalidCurriculum(format!(
                    "more than one question for chapter '{}'",
                    question.chapter
                )));
            }
            if question.choices.is_empty() {
                return Err(DomainError::InvalidCurriculum(format!(
                    "question for chapter '{}' has no choices",
                    question.chapter
                )));
            }

            let mut keys = HashSet::new();
            for key in question.choice_keys() {
                if !keys.insert(key) {
                    return Err(DomainError::InvalidCurriculum(format!(
                        "duplicate choice key '{key}' in question for chapter '{}'",
                        question.chapter
                    )));
                }
            }
        }

        Ok(())
    }

    /// Adaptive chapters that have no scenario question
    pub fn chapters_without_question(&self) -> Vec<&str> {
        self.catalog
            .adaptive()
            .filter(|c| self.questions.get(&c.id).is_none())
            .map(|c| c.id.as_str())
            .collect()
    }

    /// The German driver-assistance tutorial
    pub fn builtin() -> Self {
        let chapters = vec![
            Chapter::new(
                OPENING_CHAPTER,
                "Wie man das System aktiviert und welche Voraussetzungen dafür gelten.",
                ChapterRole::FixedOpening,
            ),
            Chapter::new(
                "Verkehrszeichen",
                "Wie das Auto Tempolimits und Verkehrszeichen erkennt.",
                ChapterRole::Adaptive,
            ),
            Chapter::new(
                "Abstand",
                "Wie der Abstandsregeltempomat den Abstand zum Vordermann hält.",
                ChapterRole::Adaptive,
            ),
            Chapter::new(
                "Ampelerkennung",
                "Wie das System Ampeln erkennt und darauf reagiert.",
                ChapterRole::Adaptive,
            ),
            Chapter::new(
                "Spurführung",
                "Wie das Fahrzeug selbstständig die Spur hält.",
                ChapterRole::Adaptive,
            ),
            Chapter::new(
                "Notbremsung",
                "Wie der Notbremsassistent in kritischen Situationen eingreift.",
                ChapterRole::Adaptive,
            ),
            Chapter::new(
                RISK_CHAPTER,
                "Die Wichtigkeit der Fahrerüberwachung und Ihre Verantwortung als Fahrer.",
                ChapterRole::FixedRisk,
            ),
            Chapter::new(
                CLOSING_CHAPTER,
                "Wie man das System manuell deaktiviert und die Kontrolle übernimmt.",
                ChapterRole::FixedClosing,
            ),
        ];

        let catalog = ChapterCatalog {
            chapters,
            opening: 0,
            risk: 6,
            closing: 7,
        };

        Self {
            catalog,
            questions: QuestionBank::new(builtin_questions()),
        }
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::builtin()
    }
}

fn question(chapter: &str, text: &str, choices: [(&str, &str, Archetype); 3]) -> ScenarioQuestion {
    ScenarioQuestion {
        chapter: chapter.to_string(),
        text: text.to_string(),
        choices: choices
            .into_iter()
            .map(|(key, text, archetype)| Choice::new(key, text, archetype))
            .collect(),
    }
}

fn builtin_questions() -> Vec<ScenarioQuestion> {
    use Archetype::{Clueless, Correct, Overconfident};

    vec![
        question(
            "Verkehrszeichen",
            "Sie fahren auf der Landstraße. Das Fahrzeug zeigt 100 km/h als Limit an, \
             ein Baustellenschild mit 60 km/h ist jedoch teilweise verdeckt. Was tun Sie?",
            [
                (
                    "a",
                    "Ich achte selbst auf die Beschilderung und passe die Geschwindigkeit an, \
                     auch wenn das System etwas anderes anzeigt.",
                    Correct,
                ),
                (
                    "b",
                    "Das System erkennt alle Schilder zuverlässig, ich verlasse mich auf die Anzeige.",
                    Overconfident,
                ),
                (
                    "c",
                    "Ich weiß nicht, woher das System die Tempolimits bezieht.",
                    Clueless,
                ),
            ],
        ),
        question(
            "Abstand",
            "Auf der Autobahn ist der Abstandsregeltempomat aktiv. Vor Ihnen steht am \
             Stauende ein Fahrzeug still. Was erwarten Sie?",
            [
                (
                    "a",
                    "Das System bremst in jeder Situation sicher bis zum Stillstand ab.",
                    Overconfident,
                ),
                (
                    "b",
                    "Stehende Hindernisse werden nicht immer erkannt, ich bleibe bremsbereit \
                     und greife notfalls ein.",
                    Correct,
                ),
                (
                    "c",
                    "Ich bin unsicher, ob das System überhaupt selbst bremsen kann.",
                    Clueless,
                ),
            ],
        ),
        question(
            "Ampelerkennung",
            "Sie nähern sich einer Kreuzung, die Ampel springt auf Gelb. Das System \
             reagiert nicht sichtbar. Wie handeln Sie?",
            [
                (
                    "a",
                    "Ich entscheide selbst, ob ich anhalte, und bremse gegebenenfalls aktiv.",
                    Correct,
                ),
                (
                    "b",
                    "Ich weiß nicht, ob das System Ampeln überhaupt berücksichtigt.",
                    Clueless,
                ),
                (
                    "c",
                    "Das System würde bei Rot ohnehin anhalten, ich lasse es weiterfahren.",
                    Overconfident,
                ),
            ],
        ),
        question(
            "Spurführung",
            "Auf einer Landstraße mit verblassten Fahrbahnmarkierungen ist der \
             Spurführungsassistent aktiv. Was tun Sie?",
            [
                (
                    "a",
                    "Ich nehme kurz die Hände vom Lenkrad, das System hält die Spur zuverlässig.",
                    Overconfident,
                ),
                (
                    "b",
                    "Ich habe keine Vorstellung, wie das System die Spur erkennt.",
                    Clueless,
                ),
                (
                    "c",
                    "Ich behalte die Hände am Lenkrad, weil schlechte Markierungen die \
                     Erkennung stören können.",
                    Correct,
                ),
            ],
        ),
        question(
            "Notbremsung",
            "In der Stadt läuft plötzlich ein Kind zwischen parkenden Autos auf die \
             Straße. Was gilt für den Notbremsassistenten?",
            [
                (
                    "a",
                    "Er kann einen Unfall nicht in jedem Fall verhindern, ich bremse sofort selbst.",
                    Correct,
                ),
                (
                    "b",
                    "Er verhindert jede Kollision, ich muss nicht reagieren.",
                    Overconfident,
                ),
                (
                    "c",
                    "Ich weiß nicht, wann der Notbremsassistent eingreift.",
                    Clueless,
                ),
            ],
        ),
    ]
}
