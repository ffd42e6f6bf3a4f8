use std::sync::Arc;

use corpusprompt::{
    corpus::DocumentStore,
    embeddings::Embedder,
    pipeline::QueryPipeline,
    providers::{completions::LlamaCpp, embeddings::HashingEmbedding},
    vector_store::InMemoryVectorStore,
};

// expects a llama.cpp server on http://localhost:8080
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let store = Arc::new(DocumentStore::new(Embedder::new(
        InMemoryVectorStore::new(),
        HashingEmbedding::default(),
    )));
    for doc in [
        "The sky is blue on a clear day",
        "Grass is green because of chlorophyll",
        "Snow is white",
    ] {
        store.add(doc).await.unwrap();
    }

    let pipeline = QueryPipeline::new(store, LlamaCpp::new(None));
    _ = dbg!(pipeline.query_documents("what color is the sky").await);
    _ = dbg!(pipeline.process_query("What color is the sky?").await);
}
