//! # corpusprompt - Core API Documentation
//!
//! corpusprompt keeps a small corpus of reference documents indexed for
//! similarity search and answers queries with retrieval-augmented prompts sent
//! to a text generation engine.
//!
//! ## Features
//!
//! - **Content-addressed corpus**: a document's id is its own text, adding the
//!   same text twice keeps a single document
//! - **Modular Architecture** with clearly defined components:
//!   - **Vector Stores**: Embedding storage and nearest-neighbour lookup
//!   - **Embedders**: Text embedding providers, local or over HTTP
//!   - **Completion models**: llama.cpp style `/completion` engines
//!   - **Snapshots**: periodic best-effort backup of the corpus to a JSON file
//!
//! ## Answering a query
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use corpusprompt::{
//!     corpus::DocumentStore,
//!     embeddings::Embedder,
//!     pipeline::QueryPipeline,
//!     providers::{completions::LlamaCpp, embeddings::HashingEmbedding},
//!     vector_store::InMemoryVectorStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> corpusprompt::error::Result<()> {
//!     let store = Arc::new(DocumentStore::new(Embedder::new(
//!         InMemoryVectorStore::new(),
//!         HashingEmbedding::default(),
//!     )));
//!     store.add("The sky is blue").await?;
//!
//!     let pipeline = QueryPipeline::new(store, LlamaCpp::new(None));
//!     let answer = pipeline.process_query("What color is the sky?").await?;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```
//!
//! ## Snapshots
//!
//! ```rust,no_run
//! # use std::{sync::Arc, time::Duration};
//! # use corpusprompt::{corpus::DocumentStore, embeddings::Embedder,
//! #     providers::embeddings::HashingEmbedding, vector_store::InMemoryVectorStore};
//! use corpusprompt::snapshot::{SnapshotManager, SnapshotTask};
//!
//! # #[tokio::main]
//! # async fn main() -> corpusprompt::error::Result<()> {
//! # let store = Arc::new(DocumentStore::new(Embedder::new(
//! #     InMemoryVectorStore::new(),
//! #     HashingEmbedding::default(),
//! # )));
//! let manager = SnapshotManager::new("./documents/datas.json");
//! manager.rehydrate(&store).await?;
//! let task = SnapshotTask::spawn(store, manager, Duration::from_secs(60));
//! // ...
//! task.shutdown().await;
//! # Ok(())
//! # }
//! ```

/// Text generation engine abstraction
pub mod completion;

/// Service configuration
pub mod config;

/// The document corpus and its identity rules
pub mod corpus;

/// Document types
pub mod document;

/// Text embeddings support
pub mod embeddings;

/// Error types for all library operations
pub mod error;

/// Text-level similarity index
pub mod index;

/// Retrieve, assemble, complete
pub mod pipeline;

/// Prompt template and assembly
pub mod prompt;

/// Builtin completion and embedding model providers
pub mod providers;

/// Periodic best-effort persistence of the corpus
pub mod snapshot;

/// Vector storage and retrieval
pub mod vector_store;
