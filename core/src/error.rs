use crate::{
    completion::CompletionError, config::ConfigError, corpus::CorpusError,
    embeddings::EmbedderError, index::IndexError, pipeline::PipelineError,
    snapshot::SnapshotError, vector_store::VectorStoreError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),
    #[error("Embedder error: {0}")]
    Embedder(#[from] EmbedderError),
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("VectorStore error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

pub type Result<T> = std::result::Result<T, Error>;
