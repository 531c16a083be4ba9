//! Danger gap computation.

use crate::domain::models::{ChapterCatalog, DangerGaps, ScoreMap};

/// Compute `capability - limitation` for every adaptive chapter with a score
///
/// Chapters without a submitted score are left out of the result rather than
/// defaulted to zero. Scores for chapters that are not adaptive are ignored.
/// Output follows catalog order.
pub fn analyze_gaps(catalog: &ChapterCatalog, scores: &ScoreMap) -> DangerGaps {
    catalog
        .adaptive()
        .filter_map(|chapter| {
            scores
                .get(&chapter.id)
                .map(|entry| (chapter.id.clone(), entry.gap()))
        })
        .collect()
}
