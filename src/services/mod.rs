//! Service layer
//!
//! Pure selection logic (gap analysis, chapter selection, path assembly) and
//! the async services built on it: the planning protocol, justification
//! providers and the handbook assistant.

pub mod chapter_selector;
pub mod gap_analyzer;
pub mod justification;
pub mod path_assembler;
pub mod planning_service;
pub mod rag_service;

pub use chapter_selector::{order_confirmed, select_direct, verification_queue, SelectorPolicy};
pub use gap_analyzer::analyze_gaps;
pub use justification::{LlmJustifier, TemplateJustifier};
pub use path_assembler::assemble_path;
pub use planning_service::PlanningService;
pub use rag_service::{ChatStart, HandbookAssistant, ASSISTANT_NAME};
