use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{cosine_similarity, VectorStore, VectorStoreError};
use crate::embeddings::Embedding;

#[derive(Default)]
pub struct InMemoryVectorStore {
    embeddings: RwLock<HashMap<String, Embedding>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn get_by_id(&self, id: &str) -> Result<Embedding, VectorStoreError> {
        let embeddings = self.embeddings.read().await;
        embeddings
            .get(id)
            .cloned()
            .ok_or(VectorStoreError::EmbeddingNotFound)
    }

    async fn store(&self, embedding: Embedding) -> Result<(), VectorStoreError> {
        let mut embeddings = self.embeddings.write().await;
        // all vectors in the store share the dimension of the first one
        if let Some(existing) = embeddings.values().find(|e| e.id != embedding.id) {
            let expected = existing.embedded_data.len();
            if expected != embedding.embedded_data.len() {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    found: embedding.embedded_data.len(),
                });
            }
        }
        embeddings.insert(embedding.id.clone(), embedding);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, VectorStoreError> {
        let mut embeddings = self.embeddings.write().await;
        Ok(embeddings.remove(id).is_some())
    }

    async fn all(&self) -> Result<Vec<Embedding>, VectorStoreError> {
        let embeddings = self.embeddings.read().await;
        Ok(embeddings.values().cloned().collect())
    }

    async fn top_n(
        &self,
        query: &[f64],
        n: usize,
    ) -> Result<Vec<(f64, Embedding)>, VectorStoreError> {
        let embeddings = self.embeddings.read().await;
        let mut results = embeddings
            .values()
            .map(|embedding| {
                let score = cosine_similarity(query, &embedding.embedded_data);
                (score, embedding.clone())
            })
            .collect::<Vec<_>>();
        results.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(n);
        Ok(results)
    }

    async fn reset(&self) -> Result<(), VectorStoreError> {
        self.embeddings.write().await.clear();
        Ok(())
    }
}
