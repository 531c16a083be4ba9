//! Vector infrastructure components
//!
//! Text chunking and an in-memory similarity index for the handbook assistant.

pub mod chunker;
pub mod errors;
pub mod index;

pub use chunker::Chunker;
pub use errors::IndexError;
pub use index::{cosine_similarity, VectorIndex};
