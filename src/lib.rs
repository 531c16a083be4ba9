//! Cielo - adaptive learning paths for a driver-assistance tutorial
//!
//! Users rate each adaptive chapter on theoretical knowledge (capability) and
//! practical experience (limitation). Chapters where knowledge outruns
//! experience carry a positive danger gap and become mandatory, optionally
//! after a scenario question confirms the gap. Every path is wrapped as
//! opening chapter, mandatory chapters, risk chapter, closing chapter. A
//! retrieval-augmented chat assistant answers questions from the handbook.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, ports and errors
//! - **Service Layer** (`services`): planning protocol, selection, RAG chat
//! - **Adapters** (`adapters`): HTTP transport, session store, embedding API
//! - **Infrastructure Layer** (`infrastructure`): config, logging, LLM client, vector index
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```
//! use cielo::domain::models::{Curriculum, ScoreMap};
//! use cielo::services::{analyze_gaps, assemble_path, select_direct};
//!
//! let curriculum = Curriculum::builtin();
//! let scores = ScoreMap::new().with("Abstand", 7, 2);
//! let gaps = analyze_gaps(&curriculum.catalog, &scores);
//! let mandatory = select_direct(&gaps, &scores, true, 6);
//! let path = assemble_path(&curriculum.catalog, &mandatory);
//! assert_eq!(path.chapters(), ["Aktivierung", "Abstand", "Risiken/Verantwortung", "Deaktivierung"]);
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AnalysisBundle, Config, Curriculum, DangerGaps, LearningPath, ScoreEntry, ScoreMap,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{HandbookAssistant, PlanningService, SelectorPolicy};
