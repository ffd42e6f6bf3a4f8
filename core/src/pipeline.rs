use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    completion::{CompletionError, CompletionModel},
    corpus::{CorpusError, DocumentStore},
    document::RetrievedDocument,
    index::VectorIndex,
    prompt::{default_stop_sequences, PromptAssembler},
};

const DEFAULT_TOP_K: usize = 2;
const DEFAULT_MAX_TOKENS: usize = 1024;

/// Stage of the query pipeline an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validation,
    Retrieval,
    Completion,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("Failed to retrieve context: {0}")]
    Retrieval(#[from] CorpusError),
    #[error("Failed to generate answer: {0}")]
    Completion(#[from] CompletionError),
}

impl PipelineError {
    #[must_use]
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::InvalidInput(_) => PipelineStage::Validation,
            Self::Retrieval(_) => PipelineStage::Retrieval,
            Self::Completion(_) => PipelineStage::Completion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Number of documents retrieved as context
    pub top_k: usize,
    pub max_tokens: usize,
    pub stop_sequences: Vec<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_tokens: DEFAULT_MAX_TOKENS,
            stop_sequences: default_stop_sequences(),
        }
    }
}

/// Answers queries: retrieve context, assemble the prompt, complete it.
pub struct QueryPipeline<I: VectorIndex, M: CompletionModel> {
    store: Arc<DocumentStore<I>>,
    completion_model: M,
    assembler: PromptAssembler,
    options: PipelineOptions,
}

impl<I: VectorIndex, M: CompletionModel> QueryPipeline<I, M> {
    pub fn new(store: Arc<DocumentStore<I>>, completion_model: M) -> Self {
        Self {
            store,
            completion_model,
            assembler: PromptAssembler,
            options: PipelineOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<DocumentStore<I>> {
        &self.store
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Answer `query` using the most similar documents as context.
    ///
    /// # Errors
    /// [`PipelineError::InvalidInput`] on an empty query, otherwise the error
    /// of the failing stage. Nothing is retried.
    pub async fn process_query(&self, query: &str) -> Result<String, PipelineError> {
        let retrieved = self.query_documents(query).await?;
        let context = retrieved
            .into_iter()
            .map(|doc| doc.content)
            .collect::<Vec<_>>();

        let prompt = self.assembler.build(&context, query);
        debug!(
            "assembled prompt of {} bytes from {} documents",
            prompt.len(),
            context.len()
        );

        let answer = self
            .completion_model
            .complete(&prompt, self.options.max_tokens, &self.options.stop_sequences)
            .await?;
        info!("answered query with {} bytes", answer.len());
        Ok(answer)
    }

    /// The documents [`Self::process_query`] would use as context.
    ///
    /// # Errors
    /// [`PipelineError::InvalidInput`] on an empty query,
    /// [`PipelineError::Retrieval`] if the search fails
    pub async fn query_documents(
        &self,
        query: &str,
    ) -> Result<Vec<RetrievedDocument>, PipelineError> {
        if query.is_empty() {
            return Err(PipelineError::InvalidInput("missing content"));
        }
        Ok(self.store.retrieve(query, self.options.top_k).await?)
    }
}
