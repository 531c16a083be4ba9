//! Learning path assembly.

use crate::domain::models::{ChapterCatalog, LearningPath};

/// Wrap the mandatory chapters in the fixed bookends
///
/// Produces `[opening] ++ mandatory ++ [risk, closing]`. An empty list still
/// yields the three-chapter minimal path. Ids that are not adaptive chapters of
/// `catalog` are skipped so the bookends can never be duplicated.
pub fn assemble_path(catalog: &ChapterCatalog, mandatory: &[String]) -> LearningPath {
    let mut chapters = Vec::with_capacity(mandatory.len() + 3);
    chapters.push(catalog.opening().id.clone());
    for id in mandatory {
        if catalog.is_adaptive(id) {
            chapters.push(id.clone());
        } else {
            tracing::warn!(chapter = %id, "skipping non-adaptive chapter in mandatory list");
        }
    }
    chapters.push(catalog.risk().id.clone());
    chapters.push(catalog.closing().id.clone());
    LearningPath::from_chapters(chapters)
}
