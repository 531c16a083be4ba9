//! Recursive character text splitting
//!
//! Splits on the coarsest separator that occurs in the text (paragraphs, then
//! lines, then words, then single characters), merging small pieces back up to
//! `chunk_size` characters with `chunk_overlap` characters carried between
//! neighbouring chunks. Sizes count `char`s, not bytes.

use std::collections::VecDeque;

use super::errors::IndexError;

/// Default chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Recursive character splitter
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Chunker {
    /// Create a chunker with default separators
    ///
    /// # Errors
    /// Returns `IndexError::InvalidChunking` if `chunk_size` is zero or the
    /// overlap is not smaller than the chunk size
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, IndexError> {
        if chunk_size == 0 {
            return Err(IndexError::InvalidChunking(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(IndexError::InvalidChunking(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| (*s).to_string()).collect(),
        })
    }

    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub const fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into chunks of at most `chunk_size` characters
    ///
    /// Chunks are trimmed and never empty.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep.as_str()))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).map_or("", String::as_str);
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut small = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge(&small, separator));
                small.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_with(&piece, remaining));
            }
        }
        if !small.is_empty() {
            chunks.extend(self.merge(&small, separator));
        }
        chunks
    }

    /// Greedily join pieces up to `chunk_size`, keeping an overlap tail
    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut merged = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joiner = if window.is_empty() { 0 } else { sep_len };

            if total + len + joiner > self.chunk_size && !window.is_empty() {
                push_joined(&mut merged, &window, separator);

                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if window.is_empty() { 0 } else { sep_len }
                            > self.chunk_size)
                {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + if window.is_empty() { 0 } else { sep_len };
                }
            }

            if !window.is_empty() {
                total += sep_len;
            }
            window.push_back(piece);
            total += len;
        }

        push_joined(&mut merged, &window, separator);
        merged
    }
}

fn push_joined(out: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config() {
        assert!(Chunker::new(0, 0).is_err());
        assert!(Chunker::new(100, 100).is_err());
        assert!(Chunker::new(100, 10).is_ok());
    }

    #[test]
    fn test_empty_text() {
        assert!(Chunker::default().split("").is_empty());
        assert!(Chunker::default().split(" \n\n ").is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = Chunker::default().split("Das System hält Abstand.");
        assert_eq!(chunks, vec!["Das System hält Abstand."]);
    }

    #[test]
    fn test_paragraphs_are_merged_up_to_size() {
        let chunker = Chunker::new(30, 0).unwrap();
        let text = "Absatz eins ist da.\n\nAbsatz zwei.\n\nDrei.";
        let chunks = chunker.split(text);
        assert_eq!(chunks, vec!["Absatz eins ist da.", "Absatz zwei.\n\nDrei."]);
    }

    #[test]
    fn test_chunks_respect_size_in_chars() {
        let chunker = Chunker::new(20, 5).unwrap();
        let text = "Überholassistent äußerst übermäßig größer ".repeat(10);
        let chunks = chunker.split(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 20, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn test_overlap_carries_words() {
        let chunker = Chunker::new(15, 6).unwrap();
        let chunks = chunker.split("eins zwei drei vier fuenf sechs");
        assert!(chunks.len() >= 2);
        let first_last_word = chunks[0].split(' ').next_back().unwrap();
        assert!(chunks[1].starts_with(first_last_word));
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let chunker = Chunker::new(4, 0).unwrap();
        let chunks = chunker.split("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }
}
