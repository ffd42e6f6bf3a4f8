mod in_memory_vec_store;

pub use in_memory_vec_store::InMemoryVectorStore;

use crate::embeddings::Embedding;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VectorStoreError {
    #[error("Embedding not found")]
    EmbeddingNotFound,
    #[error("Embedding has {found} dimensions, store expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("Vector store provider error: {0}")]
    Provider(String),
}

/// Storage of embeddings with nearest-neighbour lookup.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Embedding, VectorStoreError>;

    /// Insert the embedding, replacing any embedding with the same id.
    async fn store(&self, embedding: Embedding) -> Result<(), VectorStoreError>;

    /// Remove the embedding with the given id, returns whether it was present.
    async fn delete(&self, id: &str) -> Result<bool, VectorStoreError>;

    async fn all(&self) -> Result<Vec<Embedding>, VectorStoreError>;

    /// The `n` embeddings closest to `query`, best match first, paired with their similarity.
    async fn top_n(&self, query: &[f64], n: usize)
        -> Result<Vec<(f64, Embedding)>, VectorStoreError>;

    async fn reset(&self) -> Result<(), VectorStoreError>;
}

/// Cosine similarity of two vectors, `0.0` when either has zero magnitude or
/// their lengths differ.
#[must_use]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
