//! Plain-text chunking for the corpus build path.
//!
//! Documents are split into overlapping windows sized in estimated tokens
//! so that each chunk fits comfortably in an embedding request while
//! neighboring chunks share enough context to survive boundary cuts.

use tracing::debug;

/// Rough token estimate: ~4 characters per token for English prose.
const CHARS_PER_TOKEN: usize = 4;

/// Configuration for the text chunker.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Target tokens per chunk.
    pub chunk_tokens: usize,

    /// Token overlap between consecutive chunks.
    pub overlap_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_tokens: 750,
            overlap_tokens: 100,
        }
    }
}

/// Splits plain text into overlapping chunks.
pub struct TextChunker {
    config: ChunkerConfig,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(ChunkerConfig::default())
    }
}

impl TextChunker {
    /// Create a chunker with the given configuration.
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Estimate the token count of a text.
    pub fn estimated_tokens(text: &str) -> usize {
        text.len() / CHARS_PER_TOKEN
    }

    /// Split `text` into chunks of at most `chunk_tokens` estimated tokens,
    /// consecutive chunks overlapping by about `overlap_tokens`.
    ///
    /// Windows never split inside a word. Whitespace-only input yields no
    /// chunks; input within the budget yields a single chunk.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let max_chars = self.config.chunk_tokens * CHARS_PER_TOKEN;
        let overlap_chars = self.config.overlap_tokens * CHARS_PER_TOKEN;

        if text.len() <= max_chars {
            return vec![text.to_string()];
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < words.len() {
            let mut end = start;
            let mut chars = 0;
            while end < words.len() && chars + words[end].len() + 1 <= max_chars {
                chars += words[end].len() + 1;
                end += 1;
            }
            // A single word longer than the whole budget still gets emitted.
            if end == start {
                end = start + 1;
            }

            chunks.push(words[start..end].join(" "));

            if end >= words.len() {
                break;
            }

            // Back up far enough to carry the overlap into the next window,
            // always advancing by at least one word.
            let mut next_start = end;
            let mut carried = 0;
            while next_start > start + 1 && carried < overlap_chars {
                next_start -= 1;
                carried += words[next_start].len() + 1;
            }
            start = next_start;
        }

        debug!(
            "Chunked {} chars into {} chunks",
            text.len(),
            chunks.len()
        );

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn small_chunker() -> TextChunker {
        TextChunker::new(ChunkerConfig {
            chunk_tokens: 10,
            overlap_tokens: 2,
        })
    }

    #[test]
    fn test_empty_input() {
        assert!(TextChunker::default().chunk("   \n  ").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = TextChunker::default().chunk("Zero trust is a security model.");
        assert_eq!(chunks, vec!["Zero trust is a security model.".to_string()]);
    }

    #[test]
    fn test_long_text_splits_within_budget() {
        let text = "word ".repeat(100);
        let chunks = small_chunker().chunk(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            // 10 tokens * 4 chars budget
            assert!(chunk.len() <= 40, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text: String = (0..60).map(|i| format!("w{i} ")).collect();
        let chunks = small_chunker().chunk(&text);
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let first_words: Vec<&str> = pair[0].split_whitespace().collect();
            let last = first_words[first_words.len() - 1];
            assert!(
                pair[1].split_whitespace().any(|w| w == last),
                "no overlap between '{}' and '{}'",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_all_words_preserved_in_order() {
        let text: String = (0..60).map(|i| format!("w{i} ")).collect();
        let chunks = small_chunker().chunk(&text);

        // Every source word appears somewhere in the output.
        let joined = chunks.join(" ");
        for i in 0..60 {
            let word = format!("w{i}");
            assert!(joined.split_whitespace().any(|w| w == word));
        }
    }

    #[test]
    fn test_estimated_tokens() {
        assert_eq!(TextChunker::estimated_tokens("abcdefgh"), 2);
    }
}
