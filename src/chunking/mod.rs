//! Overlapping text segmentation for course content.
//!
//! Splits lesson bodies into bounded, overlap-linked segments. Consecutive
//! segments share a fixed-length overlap region so that boundary context is
//! never lost: each chunk after the first begins `chunk_overlap` characters
//! before the previous chunk's end, and every character of the input appears
//! in at least one chunk.

use crate::error::{PensumError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for text segmentation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
        }
    }
}

impl ChunkingConfig {
    /// Validate that the configuration can make forward progress.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(PensumError::Config("chunk_size must be > 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(PensumError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Split text into overlapping chunks of at most `chunk_size` characters.
///
/// Chunk boundaries prefer sentence ends (or newlines) within the size
/// window and fall back to a hard cut. Each chunk after the first begins
/// exactly `chunk_overlap` characters before the previous chunk's end, so
/// the overlap region between index-adjacent chunks is character-identical
/// and the original text can be reconstructed by dropping each subsequent
/// chunk's first `chunk_overlap` characters.
///
/// Sizes are measured in characters, not bytes; multi-byte input is safe.
pub fn split_with_overlap(text: &str, config: &ChunkingConfig) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    // Char classification alongside byte offsets for slicing.
    let chars: Vec<char> = text.chars().collect();
    let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    offsets.push(text.len());

    let n = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let hard_end = (start + config.chunk_size).min(n);
        let end = if hard_end < n {
            find_break(&chars, start, hard_end, config.chunk_overlap)
        } else {
            hard_end
        };

        chunks.push(text[offsets[start]..offsets[end]].to_string());

        if end >= n {
            break;
        }
        start = end - config.chunk_overlap;
    }

    chunks
}

/// Find the best break position in `(start + overlap, hard_end]`.
///
/// Prefers the latest sentence boundary (terminator followed by whitespace)
/// or newline; falls back to `hard_end`. The lower bound keeps the next
/// chunk's start strictly past the current one.
fn find_break(chars: &[char], start: usize, hard_end: usize, overlap: usize) -> usize {
    let min_end = start + overlap + 1;

    for p in (min_end..=hard_end).rev() {
        if chars[p - 1] == '\n' {
            return p;
        }
        if chars[p - 1].is_whitespace()
            && p >= 2
            && matches!(chars[p - 2], '.' | '!' | '?')
        {
            return p;
        }
    }

    hard_end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(chunk);
            } else {
                out.extend(chunk.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn test_short_text_single_chunk() {
        let config = ChunkingConfig::default();
        let chunks = split_with_overlap("A short lesson body.", &config);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "A short lesson body.");
    }

    #[test]
    fn test_empty_text() {
        let config = ChunkingConfig::default();
        assert!(split_with_overlap("", &config).is_empty());
    }

    #[test]
    fn test_hard_cut_positions() {
        // 2000 chars without sentence boundaries: hard cuts apply, so chunks
        // start at 0, 700, 1400 with chunk_size=800 and chunk_overlap=100.
        let body: String = "abcdefghij".repeat(200);
        let config = ChunkingConfig {
            chunk_size: 800,
            chunk_overlap: 100,
        };

        let chunks = split_with_overlap(&body, &config);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], body[0..800]);
        assert_eq!(chunks[1], body[700..1500]);
        assert_eq!(chunks[2], body[1400..2000]);
    }

    #[test]
    fn test_no_chunk_exceeds_size() {
        let body = "The quick brown fox jumps over the lazy dog. ".repeat(100);
        let config = ChunkingConfig {
            chunk_size: 300,
            chunk_overlap: 50,
        };

        for chunk in split_with_overlap(&body, &config) {
            assert!(chunk.chars().count() <= 300);
        }
    }

    #[test]
    fn test_adjacent_chunks_share_overlap() {
        let body = "Sentence one is here. Sentence two follows it. ".repeat(60);
        let config = ChunkingConfig {
            chunk_size: 400,
            chunk_overlap: 80,
        };

        let chunks = split_with_overlap(&body, &config);
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let suffix: String = pair[0]
                .chars()
                .skip(pair[0].chars().count() - 80)
                .collect();
            let prefix: String = pair[1].chars().take(80).collect();
            assert_eq!(suffix, prefix);
        }
    }

    #[test]
    fn test_reconstruction_is_exact() {
        let body = "One sentence here. Another one there! A question too? Plain text tail. "
            .repeat(40);
        let config = ChunkingConfig {
            chunk_size: 500,
            chunk_overlap: 60,
        };

        let chunks = split_with_overlap(&body, &config);
        assert_eq!(reconstruct(&chunks, 60), body);
    }

    #[test]
    fn test_prefers_sentence_boundary() {
        let body = format!("{}. {}", "a".repeat(500), "b".repeat(600));
        let config = ChunkingConfig {
            chunk_size: 800,
            chunk_overlap: 100,
        };

        let chunks = split_with_overlap(&body, &config);
        // First chunk should end right after ". " rather than at the hard cut.
        assert_eq!(chunks[0].chars().count(), 502);
        assert!(chunks[0].ends_with(". "));
    }

    #[test]
    fn test_multibyte_input_is_safe() {
        let body = "Kurset dekker æøå og π på norsk. ".repeat(50);
        let config = ChunkingConfig {
            chunk_size: 200,
            chunk_overlap: 40,
        };

        let chunks = split_with_overlap(&body, &config);
        assert_eq!(reconstruct(&chunks, 40), body);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 100,
        };
        assert!(config.validate().is_err());

        let config = ChunkingConfig {
            chunk_size: 0,
            chunk_overlap: 0,
        };
        assert!(config.validate().is_err());
    }
}
