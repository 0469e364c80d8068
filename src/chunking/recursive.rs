//! Recursive boundary-seeking text splitter.
//!
//! Prefers splitting at paragraph, then line, then word boundaries before
//! falling back to a hard character cut. Consecutive chunks overlap so that a
//! cut mid-thought still leaves the surrounding context retrievable.

use std::collections::VecDeque;

/// Deterministic recursive character splitter.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    /// Create a splitter with the default boundary preference
    /// (paragraph > line > word > character).
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }

    /// Override the separator preference order. The empty string must come
    /// last; it selects the hard character cut.
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    /// Split text into overlapping chunks. Pure and deterministic: the same
    /// input always yields the same ordered chunk sequence.
    pub fn split(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if text.len() <= self.chunk_size {
            return vec![text.to_string()];
        }
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let (sep_index, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_empty() && text.contains(s.as_str()))
            .map(|(i, s)| (i, s.clone()))
            .unwrap_or((separators.len().saturating_sub(1), String::new()));

        if separator.is_empty() {
            return self.hard_cut(text);
        }

        let deeper = &separators[sep_index + 1..];
        let pieces: Vec<&str> = text
            .split(separator.as_str())
            .filter(|p| !p.trim().is_empty())
            .collect();

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in pieces {
            if piece.len() <= self.chunk_size {
                pending.push(piece.to_string());
            } else {
                // Oversized piece: flush what we have, then recurse with the
                // next boundary preference.
                if !pending.is_empty() {
                    chunks.extend(self.merge(&pending, &separator));
                    pending.clear();
                }
                chunks.extend(self.split_with(piece, deeper));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, &separator));
        }

        chunks
    }

    /// Greedily pack pieces into chunks up to `chunk_size`, retaining a tail
    /// of roughly `chunk_overlap` characters as the start of the next chunk.
    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let joined_len = |window: &VecDeque<&String>| -> usize {
            if window.is_empty() {
                0
            } else {
                window.iter().map(|p| p.len()).sum::<usize>()
                    + separator.len() * (window.len() - 1)
            }
        };
        let join = |window: &VecDeque<&String>| -> String {
            window
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(separator)
        };

        let mut chunks = Vec::new();
        let mut window: VecDeque<&String> = VecDeque::new();

        for piece in pieces {
            let would_be = joined_len(&window) + separator.len() + piece.len();
            if !window.is_empty() && would_be > self.chunk_size {
                chunks.push(join(&window));
                while !window.is_empty()
                    && (joined_len(&window) > self.chunk_overlap
                        || joined_len(&window) + separator.len() + piece.len() > self.chunk_size)
                {
                    window.pop_front();
                }
            }
            window.push_back(piece);
        }

        if !window.is_empty() {
            chunks.push(join(&window));
        }

        chunks
    }

    /// Fixed-width cut for text with no usable boundaries.
    fn hard_cut(&self, text: &str) -> Vec<String> {
        let step = (self.chunk_size - self.chunk_overlap).max(1);
        let chars: Vec<char> = text.chars().collect();

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_text(words: usize) -> String {
        (0..words)
            .map(|i| format!("word{:04}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = RecursiveSplitter::new(1000, 200);
        let chunks = splitter.split("a short transcript");
        assert_eq!(chunks, vec!["a short transcript".to_string()]);
    }

    #[test]
    fn test_empty_text() {
        let splitter = RecursiveSplitter::new(1000, 200);
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n ").is_empty());
    }

    #[test]
    fn test_chunks_respect_size() {
        let splitter = RecursiveSplitter::new(1000, 200);
        let text = word_text(2000);
        let chunks = splitter.split(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 1000, "chunk of {} chars", chunk.len());
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let splitter = RecursiveSplitter::new(1000, 200);
        let text = word_text(1500);
        assert_eq!(splitter.split(&text), splitter.split(&text));
    }

    #[test]
    fn test_adjacent_chunks_overlap() {
        let splitter = RecursiveSplitter::new(1000, 200);
        let text = word_text(2000);
        let chunks = splitter.split(&text);

        for pair in chunks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            // The head of the next chunk must be a tail of the previous one,
            // close to the configured overlap (word boundaries make it
            // slightly smaller).
            let shared = (1..=next.len().min(prev.len()))
                .rev()
                .find(|&k| prev.ends_with(&next[..k]))
                .unwrap_or(0);
            assert!(
                shared >= 150,
                "expected ~200 chars of overlap, found {}",
                shared
            );
        }
    }

    #[test]
    fn test_no_content_lost() {
        let splitter = RecursiveSplitter::new(1000, 200);
        let text = word_text(2000);
        let chunks = splitter.split(&text);

        // Every word must land in at least one chunk.
        for i in 0..2000 {
            let word = format!("word{:04}", i);
            assert!(
                chunks.iter().any(|c| c.contains(&word)),
                "{} missing",
                word
            );
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let splitter = RecursiveSplitter::new(100, 20);
        let text = format!("{}\n\n{}", "a".repeat(80), "b".repeat(80));
        let chunks = splitter.split(&text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(80));
        assert_eq!(chunks[1], "b".repeat(80));
    }

    #[test]
    fn test_hard_cut_on_unbroken_text() {
        let splitter = RecursiveSplitter::new(100, 20);
        let text = "x".repeat(250);
        let chunks = splitter.split(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 100);
        }
        // Hard cut steps by size - overlap, so adjacent chunks share 20 chars.
        assert_eq!(chunks[0].len(), 100);
        assert!(chunks[1].starts_with(&"x".repeat(20)));
    }
}
