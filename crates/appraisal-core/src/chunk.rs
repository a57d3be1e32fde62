//! Fixed-window text chunker.
//!
//! Splits document text into overlapping windows of `chunk_size`
//! characters. Consecutive windows share `overlap` characters so a
//! sentence cut at one boundary still appears whole in a neighbour.
//!
//! # Algorithm
//!
//! 1. Start at character offset 0.
//! 2. Emit `text[start .. start + chunk_size]` (clamped to the end).
//! 3. Advance `start` by `chunk_size - overlap`.
//! 4. Repeat while `start < len(text)`.
//!
//! Offsets are counted in Unicode scalar values, never bytes, so
//! multibyte text is never split inside a character.
//!
//! # Example
//!
//! ```rust
//! use appraisal_core::chunk::{split_text, ChunkingParams};
//!
//! let params = ChunkingParams { chunk_size: 4, overlap: 1 };
//! let chunks = split_text("abcdefghij", &params).unwrap();
//! assert_eq!(chunks, vec!["abcd", "defg", "ghij", "j"]);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Window geometry for [`split_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingParams {
    /// Characters per chunk.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks. Must be `< chunk_size`.
    pub overlap: usize,
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            overlap: 200,
        }
    }
}

impl ChunkingParams {
    /// Reject geometries where the window would never advance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Split `text` into overlapping chunks.
///
/// Empty text yields an empty vector, which callers treat as "nothing
/// to index".
///
/// # Errors
///
/// [`ConfigError`] when `overlap >= chunk_size` or `chunk_size == 0`.
pub fn split_text(text: &str, params: &ChunkingParams) -> Result<Vec<String>, ConfigError> {
    params.validate()?;

    // Byte offset of every char, plus the end of the string.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = bounds.len() - 1;

    let mut chunks = Vec::with_capacity(expected_chunk_count(char_len, params));
    let mut start = 0;
    while start < char_len {
        let end = (start + params.chunk_size).min(char_len);
        chunks.push(text[bounds[start]..bounds[end]].to_string());
        start += params.step();
    }

    tracing::debug!(chunks = chunks.len(), chars = char_len, "split text");
    Ok(chunks)
}

/// Number of chunks [`split_text`] produces for `char_len` characters.
pub fn expected_chunk_count(char_len: usize, params: &ChunkingParams) -> usize {
    if char_len == 0 || params.validate().is_err() {
        return 0;
    }
    char_len.div_ceil(params.step())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(chunk_size: usize, overlap: usize) -> ChunkingParams {
        ChunkingParams {
            chunk_size,
            overlap,
        }
    }

    #[test]
    fn test_empty_text() {
        let chunks = split_text("", &params(10, 2)).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = split_text("Hello", &params(10, 2)).unwrap();
        assert_eq!(chunks, vec!["Hello"]);
    }

    #[test]
    fn test_overlap_shared_between_neighbours() {
        let chunks = split_text("0123456789", &params(6, 2)).unwrap();
        assert_eq!(chunks, vec!["012345", "456789", "89"]);
        assert_eq!(&chunks[0][4..], &chunks[1][..2]);
    }

    #[test]
    fn test_overlap_equal_to_size_rejected() {
        let err = split_text("abc", &params(5, 5)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::OverlapTooLarge {
                chunk_size: 5,
                overlap: 5
            }
        );
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert_eq!(
            split_text("abc", &params(0, 0)).unwrap_err(),
            ConfigError::ZeroChunkSize
        );
    }

    #[test]
    fn test_every_offset_covered() {
        let text: String = (0..997).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        for (size, overlap) in [(10, 0), (10, 3), (100, 99), (1, 0), (64, 7)] {
            let p = params(size, overlap);
            let chunks = split_text(&text, &p).unwrap();
            let step = size - overlap;
            let mut covered = vec![false; text.len()];
            for (i, chunk) in chunks.iter().enumerate() {
                let start = i * step;
                assert!(chunk.chars().count() <= size);
                assert_eq!(chunk.as_str(), &text[start..start + chunk.len()]);
                for c in covered.iter_mut().skip(start).take(chunk.len()) {
                    *c = true;
                }
            }
            assert!(covered.iter().all(|&c| c), "gap for size={size} overlap={overlap}");
            assert_eq!(chunks.len(), expected_chunk_count(text.len(), &p));
        }
    }

    #[test]
    fn test_multibyte_characters_counted_as_chars() {
        let text = "가나다라마바사아자차";
        let chunks = split_text(text, &params(4, 1)).unwrap();
        assert_eq!(chunks[0], "가나다라");
        assert_eq!(chunks[1], "라마바사");
        for c in &chunks {
            assert!(c.chars().count() <= 4);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta gamma delta epsilon zeta eta theta";
        let p = params(12, 4);
        assert_eq!(split_text(text, &p).unwrap(), split_text(text, &p).unwrap());
    }
}
