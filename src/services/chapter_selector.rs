//! Mandatory chapter selection.
//!
//! Two policies share the same ordering rule: descending danger gap, ties kept
//! in catalog order. `DangerGaps` is already in catalog order, so a stable sort
//! over it is all that is needed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::models::{DangerGaps, PlannerConfig, PolicyKind, ScoreMap, DEFAULT_MASTERY_THRESHOLD};

/// How mandatory chapters are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectorPolicy {
    /// Decide from the scores alone
    Direct {
        /// Drop chapters with `gap <= 0` and `capability >= mastery_threshold`
        filter_mastered: bool,
        mastery_threshold: u8,
    },
    /// Confirm every positive gap with a scenario question
    Verified,
}

impl SelectorPolicy {
    /// Direct policy with mastery filtering at the default threshold
    pub const fn direct() -> Self {
        Self::Direct {
            filter_mastered: true,
            mastery_threshold: DEFAULT_MASTERY_THRESHOLD,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        match config.policy {
            PolicyKind::Direct => Self::Direct {
                filter_mastered: config.filter_mastered,
                mastery_threshold: config.mastery_threshold,
            },
            PolicyKind::Verified => Self::Verified,
        }
    }

    pub const fn kind(self) -> PolicyKind {
        match self {
            Self::Direct { .. } => PolicyKind::Direct,
            Self::Verified => PolicyKind::Verified,
        }
    }
}

impl Default for SelectorPolicy {
    fn default() -> Self {
        Self::Verified
    }
}

impl fmt::Display for SelectorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind().as_str())
    }
}

/// Chapters sorted by descending gap, stable on catalog order
fn sort_descending<'a>(entries: impl Iterator<Item = (&'a str, i32)>) -> Vec<String> {
    let mut sorted: Vec<(&str, i32)> = entries.collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted.into_iter().map(|(c, _)| c.to_string()).collect()
}

/// Direct policy
///
/// A chapter survives the mastery filter if `gap > 0` or
/// `capability < mastery_threshold`. With `filter_mastered` off every scored
/// chapter is kept.
pub fn select_direct(
    gaps: &DangerGaps,
    scores: &ScoreMap,
    filter_mastered: bool,
    mastery_threshold: u8,
) -> Vec<String> {
    sort_descending(gaps.iter().filter(|(chapter, gap)| {
        if !filter_mastered || *gap > 0 {
            return true;
        }
        scores
            .get(chapter)
            .is_some_and(|entry| entry.capability < i64::from(mastery_threshold))
    }))
}

/// Verification candidates: every chapter with `gap > 0`, highest gap first
pub fn verification_queue(gaps: &DangerGaps) -> Vec<String> {
    sort_descending(gaps.iter().filter(|(_, gap)| *gap > 0))
}

/// Final order of the chapters confirmed by scenario answers
pub fn order_confirmed(confirmed: &[String], gaps: &DangerGaps) -> Vec<String> {
    sort_descending(
        gaps.iter()
            .filter(|(chapter, _)| confirmed.iter().any(|c| c == chapter)),
    )
}
