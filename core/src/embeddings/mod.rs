use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::{
    document::{Document, DocumentId},
    index::{IndexError, SearchHit, VectorIndex},
    vector_store::VectorStore,
};

/// Embedding of a document
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding {
    /// A unique identifier for the embedding.
    pub id: String,
    /// The numerical embedding vector of the document's content.
    pub embedded_data: Vec<f64>,
    /// The raw text data from which the embedding was generated.
    pub raw_data: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmbedderError {
    #[error("RequestError: {0}")]
    RequestError(String),
    #[error("ParseError: {0}")]
    ParseError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
}

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, data: &str) -> Result<Vec<f64>, EmbedderError>;
}

/// Text-level vector index: embeds documents and queries with `M` and keeps the
/// vectors in `V`.
pub struct Embedder<V: VectorStore, M: EmbeddingModel> {
    vector_store: V,
    embedding_model: M,
}

impl<V: VectorStore, M: EmbeddingModel> Embedder<V, M> {
    pub fn new(vector_store: V, embedding_model: M) -> Self {
        Self {
            vector_store,
            embedding_model,
        }
    }
}

#[async_trait]
impl<V: VectorStore, M: EmbeddingModel> VectorIndex for Embedder<V, M> {
    async fn index(&self, id: &DocumentId, text: &str) -> Result<(), IndexError> {
        let embedded_data = self.embedding_model.embed(text).await?;
        self.vector_store
            .store(Embedding {
                id: id.as_str().to_string(),
                embedded_data,
                raw_data: text.to_string(),
            })
            .await?;
        Ok(())
    }

    async fn search(&self, text: &str, k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if k == 0 {
            return Ok(vec![]);
        }
        let query = self.embedding_model.embed(text).await?;
        let matches = self.vector_store.top_n(&query, k).await?;
        debug!("vector search returned {} of at most {k} matches", matches.len());
        Ok(matches
            .into_iter()
            .map(|(score, embedding)| SearchHit {
                id: DocumentId::for_content(&embedding.id),
                content: embedding.raw_data,
                score,
            })
            .collect())
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), IndexError> {
        self.vector_store.delete(id.as_str()).await?;
        Ok(())
    }

    async fn documents(&self) -> Result<Vec<Document>, IndexError> {
        Ok(self
            .vector_store
            .all()
            .await?
            .into_iter()
            .map(|embedding| Document {
                id: DocumentId::for_content(&embedding.id),
                content: embedding.raw_data,
            })
            .collect())
    }

    async fn reset(&self) -> Result<(), IndexError> {
        self.vector_store.reset().await?;
        Ok(())
    }
}
