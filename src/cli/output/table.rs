//! Table output formatting for CLI commands
//!
//! Renders danger gaps and learning paths with comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use super::truncate;
use crate::domain::models::{AnswerRecord, ChapterCatalog, DangerGaps, LearningPath, ScoreMap};

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Scores and gaps per scored adaptive chapter, in catalog order
    pub fn format_gaps(&self, gaps: &DangerGaps, scores: &ScoreMap) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("Kapitel").add_attribute(Attribute::Bold),
            Cell::new("Wissen").add_attribute(Attribute::Bold),
            Cell::new("Erfahrung").add_attribute(Attribute::Bold),
            Cell::new("Differenz").add_attribute(Attribute::Bold),
        ]);

        for (chapter, gap) in gaps.iter() {
            let (capability, limitation) = scores
                .get(chapter)
                .map_or((String::from("-"), String::from("-")), |e| {
                    (e.capability.to_string(), e.limitation.to_string())
                });
            let gap_cell = if self.use_colors {
                Cell::new(format!("{gap:+}")).fg(gap_color(gap))
            } else {
                Cell::new(format!("{gap:+}"))
            };
            table.add_row(vec![
                Cell::new(chapter),
                Cell::new(capability),
                Cell::new(limitation),
                gap_cell,
            ]);
        }

        table.to_string()
    }

    /// Learning path with one row per chapter
    pub fn format_path(
        &self,
        path: &LearningPath,
        mandatory: &[String],
        catalog: &ChapterCatalog,
    ) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Kapitel").add_attribute(Attribute::Bold),
            Cell::new("Art").add_attribute(Attribute::Bold),
            Cell::new("Beschreibung").add_attribute(Attribute::Bold),
        ]);

        for (index, chapter) in path.chapters().iter().enumerate() {
            let is_mandatory = mandatory.contains(chapter);
            let kind = if is_mandatory { "Pflicht" } else { "fest" };
            let kind_cell = if self.use_colors && is_mandatory {
                Cell::new(kind).fg(Color::Yellow)
            } else {
                Cell::new(kind)
            };
            let description = catalog
                .get(chapter)
                .map_or_else(String::new, |c| truncate(&c.description, 60));
            table.add_row(vec![
                Cell::new(index + 1),
                Cell::new(chapter),
                kind_cell,
                Cell::new(description),
            ]);
        }

        table.to_string()
    }

    /// Scenario answers given during verification
    pub fn format_answers(&self, answers: &[AnswerRecord]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("Kapitel").add_attribute(Attribute::Bold),
            Cell::new("Antwort").add_attribute(Attribute::Bold),
            Cell::new("Einordnung").add_attribute(Attribute::Bold),
            Cell::new("Pflicht").add_attribute(Attribute::Bold),
        ]);
        for answer in answers {
            table.add_row(vec![
                Cell::new(&answer.chapter),
                Cell::new(&answer.choice),
                Cell::new(answer.archetype.as_str()),
                Cell::new(if answer.confirmed { "ja" } else { "nein" }),
            ]);
        }
        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if let Some(width) = self.max_width {
            table.set_width(width);
        }
        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if the terminal supports colors
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    env::var("TERM").map_or(true, |term| term != "dumb")
}

const fn gap_color(gap: i32) -> Color {
    match gap {
        i32::MIN..=0 => Color::Green,
        1..=2 => Color::Yellow,
        _ => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Archetype, Curriculum};
    use crate::services::{analyze_gaps, assemble_path};

    #[test]
    fn test_format_gaps_lists_scored_chapters() {
        let catalog = Curriculum::builtin().catalog;
        let scores = ScoreMap::new().with("Abstand", 7, 2);
        let gaps = analyze_gaps(&catalog, &scores);
        let out = TableFormatter::with_config(false, Some(100)).format_gaps(&gaps, &scores);
        assert!(out.contains("Abstand"));
        assert!(out.contains("+5"));
    }

    #[test]
    fn test_format_path_marks_mandatory() {
        let catalog = Curriculum::builtin().catalog;
        let mandatory = vec!["Abstand".to_string()];
        let path = assemble_path(&catalog, &mandatory);
        let out = TableFormatter::with_config(false, Some(120)).format_path(&path, &mandatory, &catalog);
        assert!(out.contains("Pflicht"));
        assert!(out.contains("Aktivierung"));
        assert!(out.contains("Deaktivierung"));
    }

    #[test]
    fn test_format_answers() {
        let answers = vec![AnswerRecord::new("Abstand", "a", Archetype::Overconfident)];
        let out = TableFormatter::with_config(false, None).format_answers(&answers);
        assert!(out.contains("overconfident"));
    }
}
