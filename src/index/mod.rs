//! In-memory semantic index over transcript chunks.
//!
//! One index per video, immutable once built, safely shared across
//! concurrent readers.

use crate::chunking::RecursiveSplitter;
use crate::embedding::Embedder;
use crate::error::{Result, TubetalkError};
use std::sync::Arc;
use tracing::{debug, instrument};

/// A chunk of transcript text paired with its embedding.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// Chunk text content.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

/// A retrieval hit with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// Chunk text content.
    pub content: String,
    /// Cosine similarity to the query (higher is better).
    pub score: f32,
}

/// Immutable nearest-neighbor index over the chunks of one transcript.
#[derive(Debug)]
pub struct SemanticIndex {
    entries: Vec<IndexEntry>,
}

impl SemanticIndex {
    /// Build an index directly from entries. Order is preserved.
    pub fn from_entries(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the `limit` chunks most similar to the query embedding.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<ScoredChunk> {
        let mut results: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                content: entry.content.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);
        results
    }
}

/// Builds a [`SemanticIndex`] from raw transcript text.
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    splitter: RecursiveSplitter,
}

impl IndexBuilder {
    /// Create a builder with the given chunking parameters.
    pub fn new(embedder: Arc<dyn Embedder>, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            embedder,
            splitter: RecursiveSplitter::new(chunk_size, chunk_overlap),
        }
    }

    /// Split the text, embed each chunk (batched, order preserved), and
    /// assemble the index. No partial index is returned on failure.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn build(&self, text: &str) -> Result<SemanticIndex> {
        let chunks = self.splitter.split(text);
        debug!("Split transcript into {} chunks", chunks.len());

        let embeddings = self
            .embedder
            .embed_batch(&chunks)
            .await
            .map_err(|e| TubetalkError::IndexBuild(e.to_string()))?;

        if embeddings.len() != chunks.len() {
            return Err(TubetalkError::IndexBuild(format!(
                "Embedding count mismatch: {} chunks, {} vectors",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(content, embedding)| IndexEntry { content, embedding })
            .collect();

        Ok(SemanticIndex::from_entries(entries))
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let index = SemanticIndex::from_entries(vec![
            IndexEntry {
                content: "about cats".to_string(),
                embedding: vec![1.0, 0.0, 0.0],
            },
            IndexEntry {
                content: "about dogs".to_string(),
                embedding: vec![0.0, 1.0, 0.0],
            },
            IndexEntry {
                content: "about cats mostly".to_string(),
                embedding: vec![0.9, 0.1, 0.0],
            },
        ]);

        let results = index.search(&[1.0, 0.0, 0.0], 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "about cats");
        assert_eq!(results[1].content, "about cats mostly");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_search_limit_exceeds_entries() {
        let index = SemanticIndex::from_entries(vec![IndexEntry {
            content: "only one".to_string(),
            embedding: vec![1.0, 0.0],
        }]);

        let results = index.search(&[1.0, 0.0], 5);
        assert_eq!(results.len(), 1);
    }
}
