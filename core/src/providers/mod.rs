/// Text generation engines implementing [`crate::completion::CompletionModel`]
pub mod completions;

/// Embedding models implementing [`crate::embeddings::EmbeddingModel`]
pub mod embeddings;
