//! In-memory vector index with JSON persistence
//!
//! Holds every handbook chunk next to its embedding and answers top-k cosine
//! similarity queries with a linear scan. A handbook has a few hundred chunks
//! at most.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::errors::IndexError;
use crate::domain::models::{HandbookChunk, ScoredChunk};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    chunk: HandbookChunk,
    vector: Vec<f32>,
}

/// Cosine similarity of two equally long vectors, 0 for zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Chunks and vectors of one embedding model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    /// Embedding provider/model that produced the vectors
    model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            model: model.into(),
            dimension,
            entries: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a chunk, returning its id
    pub fn add(&mut self, text: impl Into<String>, vector: Vec<f32>) -> Result<usize, IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }
        let id = self.entries.len();
        self.entries.push(IndexEntry {
            chunk: HandbookChunk {
                id,
                text: text.into(),
            },
            vector,
        });
        Ok(id)
    }

    /// The `k` most similar chunks, best first
    ///
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.vector),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    /// Write the index as JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), IndexError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), chunks = self.len(), "vector index saved");
        Ok(())
    }

    /// Read an index written by [`VectorIndex::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let index: Self = serde_json::from_str(&json)?;
        if let Some(bad) = index.entries.iter().find(|e| e.vector.len() != index.dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: index.dimension,
                got: bad.vector.len(),
            });
        }
        tracing::info!(path = %path.display(), chunks = index.len(), "vector index loaded");
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn index() -> VectorIndex {
        let mut index = VectorIndex::new("test", 3);
        index.add("Abstand", vec![1.0, 0.0, 0.0]).unwrap();
        index.add("Ampel", vec![0.0, 1.0, 0.0]).unwrap();
        index.add("Abstand und Ampel", vec![1.0, 1.0, 0.0]).unwrap();
        index
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let results = index().search(&[1.0, 0.1, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.text, "Abstand");
        assert_eq!(results[1].chunk.text, "Abstand und Ampel");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_dimension_checked() {
        let mut index = index();
        assert!(matches!(
            index.add("x", vec![1.0]),
            Err(IndexError::DimensionMismatch { expected: 3, got: 1 })
        ));
        assert!(index.search(&[1.0, 0.0], 1).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("index.json");
        index().save(&path).unwrap();

        let loaded = VectorIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.model(), "test");
        assert_eq!(loaded.search(&[0.0, 1.0, 0.0], 1).unwrap()[0].chunk.text, "Ampel");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            VectorIndex::load("/nonexistent/index.json"),
            Err(IndexError::Io(_))
        ));
    }
}
