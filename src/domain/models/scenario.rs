//! Scenario questions used to verify a suspected danger gap.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a scenario-question answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Shows adequate practical understanding
    #[serde(rename = "correct")]
    Correct,
    /// Trusts the system beyond its limits
    #[serde(rename = "overconfident")]
    Overconfident,
    /// Does not know how the system behaves
    #[serde(rename = "incorrect/clueless", alias = "clueless", alias = "incorrect")]
    Clueless,
}

impl Archetype {
    /// Whether an answer of this archetype confirms the chapter as mandatory
    pub const fn confirms_gap(self) -> bool {
        matches!(self, Self::Overconfident | Self::Clueless)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Overconfident => "overconfident",
            Self::Clueless => "incorrect/clueless",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answer option of a scenario question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub key: String,
    pub text: String,
    pub archetype: Archetype,
}

impl Choice {
    pub fn new(key: impl Into<String>, text: impl Into<String>, archetype: Archetype) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
            archetype,
        }
    }
}

/// Multiple-choice scenario question attached to one adaptive chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioQuestion {
    pub chapter: String,
    pub text: String,
    pub choices: Vec<Choice>,
}

impl ScenarioQuestion {
    /// Archetype of the choice with `key`, if the key is registered
    pub fn archetype_for(&self, key: &str) -> Option<Archetype> {
        self.choices
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.archetype)
    }

    pub fn choice_keys(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(|c| c.key.as_str())
    }
}

/// Registry of scenario questions keyed by chapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionBank {
    questions: Vec<ScenarioQuestion>,
}

impl QuestionBank {
    pub fn new(questions: Vec<ScenarioQuestion>) -> Self {
        Self { questions }
    }

    pub fn get(&self, chapter: &str) -> Option<&ScenarioQuestion> {
        self.questions.iter().find(|q| q.chapter == chapter)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioQuestion> {
        self.questions.iter()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
