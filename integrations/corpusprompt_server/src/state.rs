use std::sync::Arc;

use corpusprompt::{
    config::{Config, ConfiguredEmbedding},
    corpus::DocumentStore,
    embeddings::Embedder,
    pipeline::QueryPipeline,
    providers::completions::LlamaCpp,
    snapshot::SnapshotManager,
    vector_store::InMemoryVectorStore,
};

pub type Index = Embedder<InMemoryVectorStore, ConfiguredEmbedding>;

/// Shared state behind every route.
pub struct AppState {
    pub pipeline: QueryPipeline<Index, LlamaCpp>,
    pub snapshots: SnapshotManager,
    pub allowed_origins: Vec<String>,
}

impl AppState {
    /// # Errors
    /// if the embedding model or the completion client can't be built
    pub fn from_config(config: &Config) -> corpusprompt::error::Result<Self> {
        let embedding = config.embedding.build()?;
        let store = Arc::new(DocumentStore::new(Embedder::new(
            InMemoryVectorStore::new(),
            embedding,
        )));

        let completion_url = Some(config.completion_url.clone());
        let completion_model = match config.request_timeout() {
            Some(timeout) => LlamaCpp::with_timeout(completion_url, timeout)?,
            None => LlamaCpp::new(completion_url),
        };

        Ok(Self {
            pipeline: QueryPipeline::new(store, completion_model)
                .with_options(config.pipeline_options()),
            snapshots: SnapshotManager::new(config.snapshot_path.clone()),
            allowed_origins: config.allowed_origins.clone(),
        })
    }

    #[must_use]
    pub fn store(&self) -> &Arc<DocumentStore<Index>> {
        self.pipeline.store()
    }
}
