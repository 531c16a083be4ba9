//! Assembled learning path.

use serde::{Deserialize, Serialize};

/// Ordered chapter ids, always `[opening] ++ middle ++ [risk, closing]`
///
/// Only the path assembler builds paths from scratch, so the bookends are
/// guaranteed by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearningPath(Vec<String>);

impl LearningPath {
    pub(crate) fn from_chapters(chapters: Vec<String>) -> Self {
        Self(chapters)
    }

    pub fn chapters(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.0.len().checked_sub(1)
    }

    /// The personalized segment between the opening and the risk chapter
    pub fn middle(&self) -> &[String] {
        if self.0.len() < 3 {
            return &[];
        }
        &self.0[1..self.0.len() - 2]
    }
}

impl AsRef<[String]> for LearningPath {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}
