pub(crate) mod hashing;
pub(crate) mod openai;

pub use hashing::HashingEmbedding;
pub use openai::OpenAIEmbeddingModel as OpenAIEmbedding;
