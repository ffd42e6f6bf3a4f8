//! The document corpus.
//!
//! [`DocumentStore`] is the only writer of the underlying [`VectorIndex`]. It
//! validates input, applies the content-addressed identity rule and serializes
//! mutations against reads.

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{
    document::{DocumentId, RetrievedDocument},
    index::{IndexError, VectorIndex},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CorpusError {
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
    #[error(transparent)]
    Index(#[from] IndexError),
}

pub struct DocumentStore<I: VectorIndex> {
    index: RwLock<I>,
}

impl<I: VectorIndex> DocumentStore<I> {
    pub fn new(index: I) -> Self {
        Self {
            index: RwLock::new(index),
        }
    }

    /// Add a document. Adding content that is already in the corpus overwrites
    /// it with an identical value.
    ///
    /// # Errors
    /// [`CorpusError::InvalidInput`] on empty content, [`CorpusError::Index`]
    /// if the index rejects the document
    pub async fn add(&self, content: &str) -> Result<(), CorpusError> {
        require_content(content, "missing content")?;
        let index = self.index.write().await;
        Self::add_locked(&index, content).await
    }

    /// Remove the document whose text is `content`. Unknown content is not an
    /// error.
    ///
    /// # Errors
    /// [`CorpusError::InvalidInput`] on empty content, [`CorpusError::Index`]
    /// if the index fails
    pub async fn remove(&self, content: &str) -> Result<(), CorpusError> {
        require_content(content, "missing content")?;
        let index = self.index.write().await;
        Self::remove_locked(&index, content).await
    }

    /// Replace `old_content` with `new_content`.
    ///
    /// Runs as a remove followed by an add. Readers never see the intermediate
    /// state, but the two steps are not atomic: if the add fails the old
    /// document stays removed.
    ///
    /// # Errors
    /// [`CorpusError::InvalidInput`] if either side is empty (nothing is
    /// changed), [`CorpusError::Index`] if either step fails
    pub async fn update(&self, old_content: &str, new_content: &str) -> Result<(), CorpusError> {
        require_content(old_content, "missing old content")?;
        require_content(new_content, "missing new content")?;
        let index = self.index.write().await;
        Self::remove_locked(&index, old_content).await?;
        Self::add_locked(&index, new_content).await
    }

    /// Contents of every live document, in the index's own order.
    ///
    /// # Errors
    /// [`CorpusError::Index`] if the index can't be read
    pub async fn list_all(&self) -> Result<Vec<String>, CorpusError> {
        let index = self.index.read().await;
        Ok(index
            .documents()
            .await?
            .into_iter()
            .map(|d| d.content)
            .collect())
    }

    /// # Errors
    /// [`CorpusError::Index`] if the index can't be read
    pub async fn len(&self) -> Result<usize, CorpusError> {
        Ok(self.index.read().await.documents().await?.len())
    }

    /// # Errors
    /// [`CorpusError::Index`] if the index can't be read
    pub async fn is_empty(&self) -> Result<bool, CorpusError> {
        Ok(self.len().await? == 0)
    }

    /// Up to `k` documents most similar to `query`, best match first.
    ///
    /// # Errors
    /// [`CorpusError::InvalidInput`] on an empty query, [`CorpusError::Index`]
    /// if the search fails
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, CorpusError> {
        require_content(query, "missing query")?;
        let index = self.index.read().await;
        let hits = index.search(query, k).await?;
        debug!("retrieved {} documents for query (k = {k})", hits.len());
        Ok(hits
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(i, hit)| RetrievedDocument {
                content: hit.content,
                rank: i + 1,
                score: hit.score,
            })
            .collect())
    }

    /// Remove every document.
    ///
    /// # Errors
    /// [`CorpusError::Index`] if the index can't be reset
    pub async fn clear_all(&self) -> Result<(), CorpusError> {
        let index = self.index.write().await;
        index.reset().await?;
        info!("cleared all documents");
        Ok(())
    }

    async fn add_locked(index: &I, content: &str) -> Result<(), CorpusError> {
        index
            .index(&DocumentId::for_content(content), content)
            .await?;
        info!("added document ({} bytes)", content.len());
        Ok(())
    }

    async fn remove_locked(index: &I, content: &str) -> Result<(), CorpusError> {
        index.delete(&DocumentId::for_content(content)).await?;
        info!("removed document ({} bytes)", content.len());
        Ok(())
    }
}

fn require_content(content: &str, what: &'static str) -> Result<(), CorpusError> {
    if content.is_empty() {
        Err(CorpusError::InvalidInput(what))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::Document,
        embeddings::{Embedder, EmbedderError},
        index::SearchHit,
        providers::embeddings::HashingEmbedding,
        vector_store::InMemoryVectorStore,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    fn store() -> DocumentStore<Embedder<InMemoryVectorStore, HashingEmbedding>> {
        DocumentStore::new(Embedder::new(
            InMemoryVectorStore::new(),
            HashingEmbedding::default(),
        ))
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[tokio::test]
    async fn test_repeated_add_lists_once() {
        let store = store();
        for _ in 0..3 {
            assert!(store.add("The sky is blue").await.is_ok());
        }
        assert_eq!(store.list_all().await.unwrap(), vec!["The sky is blue"]);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let store = store();
        assert_eq!(
            store.add("").await,
            Err(CorpusError::InvalidInput("missing content"))
        );
        assert_eq!(
            store.remove("").await,
            Err(CorpusError::InvalidInput("missing content"))
        );
        assert_eq!(
            store.retrieve("", 2).await,
            Err(CorpusError::InvalidInput("missing query"))
        );
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = store();
        store.add("a document").await.unwrap();
        store.add("another document").await.unwrap();

        assert!(store.remove("a document").await.is_ok());
        let after_first = store.list_all().await.unwrap();
        assert!(store.remove("a document").await.is_ok());
        assert_eq!(store.list_all().await.unwrap(), after_first);
        assert_eq!(after_first, vec!["another document"]);

        // never added
        assert!(store.remove("unknown").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_replaces_document() {
        let store = store();
        store.add("old text").await.unwrap();
        store.add("unrelated").await.unwrap();

        store.update("old text", "new text").await.unwrap();
        assert_eq!(
            sorted(store.list_all().await.unwrap()),
            vec!["new text", "unrelated"]
        );
    }

    #[tokio::test]
    async fn test_update_validates_before_mutating() {
        let store = store();
        store.add("old text").await.unwrap();

        assert_eq!(
            store.update("old text", "").await,
            Err(CorpusError::InvalidInput("missing new content"))
        );
        assert_eq!(
            store.update("", "new text").await,
            Err(CorpusError::InvalidInput("missing old content"))
        );
        assert_eq!(store.list_all().await.unwrap(), vec!["old text"]);
    }

    #[tokio::test]
    async fn test_retrieve_bounds() {
        let store = store();
        assert!(store.retrieve("anything", 2).await.unwrap().is_empty());

        store.add("The sky is blue").await.unwrap();
        let results = store.retrieve("sky color", 2).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "The sky is blue");
        assert_eq!(results[0].rank, 1);

        store.add("Grass is green").await.unwrap();
        store.add("Snow is white").await.unwrap();
        let results = store.retrieve("what color is the sky", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "The sky is blue");
        assert_eq!(
            results.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(results[0].score >= results[1].score);

        assert_eq!(store.retrieve("sky", 10).await.unwrap().len(), 3);
        assert!(store.retrieve("sky", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let store = store();
        store.add("one").await.unwrap();
        store.add("two").await.unwrap();

        store.clear_all().await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(store.retrieve("one", 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_adds() {
        let store = Arc::new(store());
        let handles = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.add(&format!("document {}", i % 4)).await })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.len().await.unwrap(), 4);
    }

    /// Index whose `index` call always fails, to exercise the non-atomic update.
    struct RejectingIndex {
        inner: Embedder<InMemoryVectorStore, HashingEmbedding>,
        reject: &'static str,
    }

    #[async_trait]
    impl VectorIndex for RejectingIndex {
        async fn index(&self, id: &DocumentId, text: &str) -> Result<(), IndexError> {
            if text == self.reject {
                return Err(IndexError::Embedder(EmbedderError::RequestError(
                    "embedding service down".to_string(),
                )));
            }
            self.inner.index(id, text).await
        }
        async fn search(&self, text: &str, k: usize) -> Result<Vec<SearchHit>, IndexError> {
            self.inner.search(text, k).await
        }
        async fn delete(&self, id: &DocumentId) -> Result<(), IndexError> {
            self.inner.delete(id).await
        }
        async fn documents(&self) -> Result<Vec<Document>, IndexError> {
            self.inner.documents().await
        }
        async fn reset(&self) -> Result<(), IndexError> {
            self.inner.reset().await
        }
    }

    // Known limitation: update is remove-then-add, so a failing add loses the
    // old document.
    #[tokio::test]
    async fn test_update_failing_add_loses_old_document() {
        let store = DocumentStore::new(RejectingIndex {
            inner: Embedder::new(InMemoryVectorStore::new(), HashingEmbedding::default()),
            reject: "new text",
        });
        store.add("old text").await.unwrap();

        let result = store.update("old text", "new text").await;
        assert!(matches!(result, Err(CorpusError::Index(_))));
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
