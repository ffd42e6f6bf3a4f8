pub(crate) mod llamacpp;

pub use llamacpp::LlamaCppCompletionModel as LlamaCpp;
