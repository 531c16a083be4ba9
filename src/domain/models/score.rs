//! Self-assessment scores and the danger gaps derived from them.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::chapter::ChapterCatalog;
use crate::domain::errors::{DomainError, DomainResult};

/// Lowest accepted rating
pub const SCORE_MIN: u8 = 1;

/// Highest accepted rating
pub const SCORE_MAX: u8 = 7;

/// Capability rating at or above which a non-positive gap may be skipped
pub const DEFAULT_MASTERY_THRESHOLD: u8 = 6;

/// Ratings for one adaptive chapter
///
/// Fields hold whatever integer the client sent; `validate` is the only range
/// check, so entries for non-adaptive chapters can be ignored instead of
/// failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Self-rated theoretical knowledge (1-7)
    pub capability: i64,

    /// Practical experience / awareness of the system's limits (1-7)
    pub limitation: i64,
}

impl ScoreEntry {
    pub const fn new(capability: i64, limitation: i64) -> Self {
        Self {
            capability,
            limitation,
        }
    }

    /// Danger gap: capability minus limitation
    ///
    /// Saturates for unvalidated entries.
    pub fn gap(self) -> i32 {
        let gap = self.capability.saturating_sub(self.limitation);
        i32::try_from(gap).unwrap_or(if gap < 0 { i32::MIN } else { i32::MAX })
    }

    fn check_range(chapter: &str, field: &'static str, value: i64) -> DomainResult<()> {
        if (i64::from(SCORE_MIN)..=i64::from(SCORE_MAX)).contains(&value) {
            Ok(())
        } else {
            Err(DomainError::ScoreOutOfRange {
                chapter: chapter.to_string(),
                field,
                value,
                min: SCORE_MIN,
                max: SCORE_MAX,
            })
        }
    }

    /// Ensure both ratings lie within 1..=7
    pub fn validate(&self, chapter: &str) -> DomainResult<()> {
        Self::check_range(chapter, "capability", self.capability)?;
        Self::check_range(chapter, "limitation", self.limitation)
    }
}

/// Submitted ratings keyed by chapter id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreMap(BTreeMap<String, ScoreEntry>);

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chapter: impl Into<String>, entry: ScoreEntry) -> Option<ScoreEntry> {
        self.0.insert(chapter.into(), entry)
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, chapter: impl Into<String>, capability: i64, limitation: i64) -> Self {
        self.insert(chapter, ScoreEntry::new(capability, limitation));
        self
    }

    pub fn get(&self, chapter: &str) -> Option<&ScoreEntry> {
        self.0.get(chapter)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScoreEntry)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validate the entries that take part in gap analysis
    ///
    /// Entries for chapters that are not adaptive are ignored here and by the
    /// gap analyzer, so they are never rejected.
    pub fn validate(&self, catalog: &ChapterCatalog) -> DomainResult<()> {
        for (chapter, entry) in &self.0 {
            if catalog.is_adaptive(chapter) {
                entry.validate(chapter)?;
            } else {
                tracing::debug!(chapter = %chapter, "ignoring score for non-adaptive chapter");
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, ScoreEntry)> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = (String, ScoreEntry)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Danger gap per adaptive chapter, kept in catalog order
///
/// Serialized as a JSON object. Chapters without a submitted score are absent,
/// never defaulted to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DangerGaps {
    entries: Vec<(String, i32)>,
}

impl DangerGaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chapter: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|(c, _)| c == chapter)
            .map(|(_, gap)| *gap)
    }

    pub fn contains(&self, chapter: &str) -> bool {
        self.get(chapter).is_some()
    }

    /// Entries in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.entries.iter().map(|(c, g)| (c.as_str(), *g))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest gap, if any chapter was scored
    pub fn max_gap(&self) -> Option<i32> {
        self.entries.iter().map(|(_, g)| *g).max()
    }
}

impl FromIterator<(String, i32)> for DangerGaps {
    fn from_iter<I: IntoIterator<Item = (String, i32)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for DangerGaps {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (chapter, gap) in &self.entries {
            map.serialize_entry(chapter, gap)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DangerGaps {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GapsVisitor;

        impl<'de> Visitor<'de> for GapsVisitor {
            type Value = DangerGaps;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of chapter ids to integer gaps")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((chapter, gap)) = access.next_entry::<String, i32>()? {
                    entries.push((chapter, gap));
                }
                Ok(DangerGaps { entries })
            }
        }

        deserializer.deserialize_map(GapsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::curriculum::Curriculum;

    #[test]
    fn test_gap_is_capability_minus_limitation() {
        assert_eq!(ScoreEntry::new(7, 2).gap(), 5);
        assert_eq!(ScoreEntry::new(2, 7).gap(), -5);
        assert_eq!(ScoreEntry::new(4, 4).gap(), 0);
    }

    #[test]
    fn test_entry_range_validation() {
        assert!(ScoreEntry::new(1, 7).validate("Abstand").is_ok());

        let err = ScoreEntry::new(0, 3).validate("Abstand").unwrap_err();
        assert!(matches!(
            err,
            DomainError::ScoreOutOfRange { field: "capability", value: 0, .. }
        ));

        let err = ScoreEntry::new(3, 8).validate("Abstand").unwrap_err();
        assert!(matches!(
            err,
            DomainError::ScoreOutOfRange { field: "limitation", value: 8, .. }
        ));
    }

    #[test]
    fn test_map_validation_ignores_non_adaptive_entries() {
        let catalog = Curriculum::builtin().catalog;
        let scores = ScoreMap::new()
            .with("Abstand", 5, 3)
            .with("Aktivierung", 0, 99)
            .with("Parken", 9, 9);
        assert!(scores.validate(&catalog).is_ok());

        let scores = scores.with("Notbremsung", 8, 1);
        assert!(scores.validate(&catalog).is_err());
    }

    #[test]
    fn test_danger_gaps_serialize_in_insertion_order() {
        let gaps: DangerGaps = vec![
            ("Verkehrszeichen".to_string(), 2),
            ("Abstand".to_string(), -1),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&gaps).unwrap();
        assert_eq!(json, r#"{"Verkehrszeichen":2,"Abstand":-1}"#);

        let parsed: DangerGaps = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, gaps);
        assert_eq!(parsed.max_gap(), Some(2));
    }

    #[test]
    fn test_wide_ratings_reach_validation() {
        let json = r#"{"Abstand":{"capability":300,"limitation":-1},"Parken":{"capability":-5,"limitation":999}}"#;
        let scores: ScoreMap = serde_json::from_str(json).unwrap();
        assert_eq!(scores.get("Parken"), Some(&ScoreEntry::new(-5, 999)));

        let err = scores.validate(&Curriculum::builtin().catalog).unwrap_err();
        assert!(matches!(
            err,
            DomainError::ScoreOutOfRange { field: "capability", value: 300, .. }
        ));
        assert_eq!(ScoreEntry::new(i64::MAX, i64::MIN).gap(), i32::MAX);
    }

    #[test]
    fn test_score_map_json_shape() {
        let json = r#"{"Abstand":{"capability":6,"limitation":2}}"#;
        let scores: ScoreMap = serde_json::from_str(json).unwrap();
        assert_eq!(scores.get("Abstand"), Some(&ScoreEntry::new(6, 2)));
    }
}
