//! Chapter catalog for the tutorial.
//!
//! The catalog is an ordered, immutable list of chapters. Catalog order is the
//! tie-breaking order used wherever chapters with equal danger gaps are sorted.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::domain::errors::{DomainError, DomainResult};

/// Role a chapter plays in an assembled learning path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChapterRole {
    /// First chapter of every path
    FixedOpening,
    /// Included or skipped depending on the user's scores
    Adaptive,
    /// Risk/responsibility chapter, always second to last
    FixedRisk,
    /// Deactivation chapter, always last
    FixedClosing,
}

impl ChapterRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FixedOpening => "fixed-opening",
            Self::Adaptive => "adaptive",
            Self::FixedRisk => "fixed-risk",
            Self::FixedClosing => "fixed-closing",
        }
    }

    pub const fn is_fixed(self) -> bool {
        !matches!(self, Self::Adaptive)
    }
}

impl fmt::Display for ChapterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tutorial chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Stable identifier, also used as the score key
    pub id: String,

    /// Human-readable description shown to the user
    pub description: String,

    /// Role in the path
    pub role: ChapterRole,
}

impl Chapter {
    pub fn new(id: impl Into<String>, description: impl Into<String>, role: ChapterRole) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            role,
        }
    }

    pub fn is_adaptive(&self) -> bool {
        self.role == ChapterRole::Adaptive
    }
}

/// Ordered registry of all chapters
///
/// A catalog always contains exactly one opening, one risk and one closing
/// chapter. Construction goes through [`ChapterCatalog::new`], which enforces
/// that, so the accessors for the fixed chapters cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Chapter>", into = "Vec<Chapter>")]
pub struct ChapterCatalog {
    pub(super) chapters: Vec<Chapter>,
    pub(super) opening: usize,
    pub(super) risk: usize,
    pub(super) closing: usize,
}

impl ChapterCatalog {
    /// Build a catalog, validating ids and fixed roles
    pub fn new(chapters: Vec<Chapter>) -> DomainResult<Self> {
        let mut seen = HashSet::new();
        for chapter in &chapters {
            if chapter.id.trim().is_empty() {
                return Err(DomainError::InvalidCurriculum(
                    "chapter id cannot be empty".to_string(),
                ));
            }
            if !seen.insert(chapter.id.as_str()) {
                return Err(DomainError::InvalidCurriculum(format!(
                    "duplicate chapter id '{}'",
                    chapter.id
                )));
            }
        }

        let opening = Self::single_role(&chapters, ChapterRole::FixedOpening)?;
        let risk = Self::single_role(&chapters, ChapterRole::FixedRisk)?;
        let closing = Self::single_role(&chapters, ChapterRole::FixedClosing)?;

        Ok(Self {
            chapters,
            opening,
            risk,
            closing,
        })
    }

    fn single_role(chapters: &[Chapter], role: ChapterRole) -> DomainResult<usize> {
        let mut positions = chapters
            .iter()
            .enumerate()
            .filter(|(_, c)| c.role == role)
            .map(|(i, _)| i);

        match (positions.next(), positions.next()) {
            (Some(index), None) => Ok(index),
            (None, _) => Err(DomainError::InvalidCurriculum(format!(
                "catalog has no {role} chapter"
            ))),
            (Some(_), Some(_)) => Err(DomainError::InvalidCurriculum(format!(
                "catalog has more than one {role} chapter"
            ))),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Position of a chapter in catalog order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.chapters.iter().position(|c| c.id == id)
    }

    pub fn is_adaptive(&self, id: &str) -> bool {
        self.get(id).is_some_and(Chapter::is_adaptive)
    }

    /// Adaptive chapters in catalog order
    pub fn adaptive(&self) -> impl Iterator<Item = &Chapter> {
        self.chapters.iter().filter(|c| c.is_adaptive())
    }

    pub fn opening(&self) -> &Chapter {
        &self.chapters[self.opening]
    }

    pub fn risk(&self) -> &Chapter {
        &self.chapters[self.risk]
    }

    pub fn closing(&self) -> &Chapter {
        &self.chapters[self.closing]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chapter> {
        self.chapters.iter()
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}

impl TryFrom<Vec<Chapter>> for ChapterCatalog {
    type Error = DomainError;

    fn try_from(chapters: Vec<Chapter>) -> DomainResult<Self> {
        Self::new(chapters)
    }
}

impl From<ChapterCatalog> for Vec<Chapter> {
    fn from(catalog: ChapterCatalog) -> Self {
        catalog.chapters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapters() -> Vec<Chapter> {
        vec![
            Chapter::new("open", "Opening", ChapterRole::FixedOpening),
            Chapter::new("a", "A", ChapterRole::Adaptive),
            Chapter::new("b", "B", ChapterRole::Adaptive),
            Chapter::new("risk", "Risk", ChapterRole::FixedRisk),
            Chapter::new("close", "Closing", ChapterRole::FixedClosing),
        ]
    }

    #[test]
    fn test_catalog_accessors() {
        let catalog = ChapterCatalog::new(chapters()).unwrap();
        assert_eq!(catalog.opening().id, "open");
        assert_eq!(catalog.risk().id, "risk");
        assert_eq!(catalog.closing().id, "close");
        let adaptive: Vec<_> = catalog.adaptive().map(|c| c.id.as_str()).collect();
        assert_eq!(adaptive, vec!["a", "b"]);
        assert_eq!(catalog.position("b"), Some(2));
        assert!(catalog.is_adaptive("a"));
        assert!(!catalog.is_adaptive("risk"));
        assert!(!catalog.contains("missing"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut list = chapters();
        list.push(Chapter::new("a", "again", ChapterRole::Adaptive));
        let err = ChapterCatalog::new(list).unwrap_err();
        assert!(matches!(err, DomainError::InvalidCurriculum(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_missing_fixed_role_rejected() {
        let list: Vec<_> = chapters()
            .into_iter()
            .filter(|c| c.role != ChapterRole::FixedRisk)
            .collect();
        let err = ChapterCatalog::new(list).unwrap_err();
        assert!(matches!(err, DomainError::InvalidCurriculum(msg) if msg.contains("fixed-risk")));
    }

    #[test]
    fn test_second_opening_rejected() {
        let mut list = chapters();
        list.push(Chapter::new("open2", "Another", ChapterRole::FixedOpening));
        assert!(ChapterCatalog::new(list).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"[{"id":"a","description":"A","role":"adaptive"}]"#;
        let result: Result<ChapterCatalog, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
