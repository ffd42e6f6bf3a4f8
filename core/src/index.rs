use async_trait::async_trait;
use thiserror::Error;

use crate::{
    document::{Document, DocumentId},
    embeddings::EmbedderError,
    vector_store::VectorStoreError,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("Failed to embed text: {0}")]
    Embedder(#[from] EmbedderError),
    #[error("Vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

/// A single match from [`VectorIndex::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: DocumentId,
    pub content: String,
    pub score: f64,
}

/// Similarity index over document text.
///
/// The index is the source of truth for the corpus: it holds the text of every
/// document next to its vector, and [`VectorIndex::documents`] is how the
/// corpus gets listed.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace the document with the given id.
    async fn index(&self, id: &DocumentId, text: &str) -> Result<(), IndexError>;

    /// At most `k` documents most similar to `text`, best match first.
    async fn search(&self, text: &str, k: usize) -> Result<Vec<SearchHit>, IndexError>;

    /// Remove a document, a no-op when the id is unknown.
    async fn delete(&self, id: &DocumentId) -> Result<(), IndexError>;

    async fn documents(&self) -> Result<Vec<Document>, IndexError>;

    /// Drop every document.
    async fn reset(&self) -> Result<(), IndexError>;
}
