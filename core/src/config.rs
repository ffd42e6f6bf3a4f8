//! Service configuration.
//!
//! Read from an optional JSON file, then overridden from `CORPUSPROMPT_*`
//! environment variables.
//!
//! ```json
//! {
//!     "bind_addr": "127.0.0.1:5000",
//!     "completion_url": "http://localhost:8080/completion",
//!     "snapshot_path": "./documents/datas.json",
//!     "snapshot_interval_secs": 60,
//!     "embedding": { "provider": "openai", "model": "text-embedding-3-small", "api_key_var": "OPENAI_API_KEY" }
//! }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use thiserror::Error;

use crate::{
    embeddings::{EmbedderError, EmbeddingModel},
    pipeline::PipelineOptions,
    prompt::{default_stop_sequences, ANSWER_TERMINATOR},
    providers::embeddings::{HashingEmbedding, OpenAIEmbedding},
};

pub const CONFIG_PATH_ENV_VAR: &str = "CORPUSPROMPT_CONFIG";
const BIND_ADDR_ENV_VAR: &str = "CORPUSPROMPT_BIND_ADDR";
const COMPLETION_URL_ENV_VAR: &str = "CORPUSPROMPT_COMPLETION_URL";
const SNAPSHOT_PATH_ENV_VAR: &str = "CORPUSPROMPT_SNAPSHOT_PATH";
const DEFAULT_OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value for `{0}`: {1}")]
    Invalid(&'static str, String),
    #[error("Failed to fetch env var `{0}`")]
    MissingEnvVar(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum EmbeddingConfig {
    Hashing {
        #[serde(default = "default_dimensions")]
        dimensions: usize,
    },
    OpenAI {
        #[serde(default)]
        api_url: Option<String>,
        model: String,
        #[serde(default)]
        api_key_var: Option<String>,
    },
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::Hashing {
            dimensions: default_dimensions(),
        }
    }
}

fn default_dimensions() -> usize {
    HashingEmbedding::default().dimensions()
}

/// The embedding model built from an [`EmbeddingConfig`].
pub enum ConfiguredEmbedding {
    Hashing(HashingEmbedding),
    OpenAI(OpenAIEmbedding),
}

#[async_trait]
impl EmbeddingModel for ConfiguredEmbedding {
    async fn embed(&self, data: &str) -> Result<Vec<f64>, EmbedderError> {
        match self {
            Self::Hashing(model) => model.embed(data).await,
            Self::OpenAI(model) => model.embed(data).await,
        }
    }
}

impl EmbeddingConfig {
    /// # Errors
    /// [`ConfigError::MissingEnvVar`] if the api key variable is not set
    pub fn build(&self) -> Result<ConfiguredEmbedding, ConfigError> {
        match self {
            Self::Hashing { dimensions } => {
                Ok(ConfiguredEmbedding::Hashing(HashingEmbedding::new(*dimensions)))
            }
            Self::OpenAI {
                api_url,
                model,
                api_key_var,
            } => {
                let var = api_key_var.as_deref().unwrap_or(DEFAULT_OPENAI_KEY_VAR);
                let api_key =
                    std::env::var(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))?;
                Ok(ConfiguredEmbedding::OpenAI(OpenAIEmbedding::new(
                    api_key,
                    api_url.clone(),
                    model.clone(),
                )))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub bind_addr: String,
    pub completion_url: String,
    /// Abort completion requests after this many seconds
    pub request_timeout_secs: Option<u64>,
    pub snapshot_path: PathBuf,
    pub snapshot_interval_secs: u64,
    /// Re-index the documents of the last snapshot at startup
    pub rehydrate_from_snapshot: bool,
    pub top_k: usize,
    pub max_tokens: usize,
    /// Must contain the prompt template's answer terminator `+++`
    pub stop_sequences: Vec<String>,
    pub allowed_origins: Vec<String>,
    pub embedding: EmbeddingConfig,
}

impl Default for Config {
    fn default() -> Self {
        let pipeline = PipelineOptions::default();
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            completion_url: "http://localhost:8080/completion".to_string(),
            request_timeout_secs: None,
            snapshot_path: PathBuf::from("./documents/datas.json"),
            snapshot_interval_secs: 60,
            rehydrate_from_snapshot: true,
            top_k: pipeline.top_k,
            max_tokens: pipeline.max_tokens,
            stop_sequences: default_stop_sequences(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Config {
    /// Parse and validate a JSON config, missing fields take their defaults.
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on malformed JSON or unknown fields,
    /// [`ConfigError::Invalid`] on out of range values
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `CORPUSPROMPT_CONFIG` (defaults when unset) and
    /// apply environment overrides.
    ///
    /// # Errors
    /// any [`ConfigError`]
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV_VAR) {
            Ok(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = var(BIND_ADDR_ENV_VAR) {
            self.bind_addr = addr;
        }
        if let Some(url) = var(COMPLETION_URL_ENV_VAR) {
            self.completion_url = url;
        }
        if let Some(path) = var(SNAPSHOT_PATH_ENV_VAR) {
            self.snapshot_path = PathBuf::from(path);
        }
    }

    /// # Errors
    /// [`ConfigError::Invalid`] naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("top_k", "must be positive".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens", "must be positive".to_string()));
        }
        if self.snapshot_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "snapshot_interval_secs",
                "must be positive".to_string(),
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "request_timeout_secs",
                "must be positive".to_string(),
            ));
        }
        if !self.stop_sequences.iter().any(|s| s == ANSWER_TERMINATOR) {
            return Err(ConfigError::Invalid(
                "stop_sequences",
                format!("must contain the answer terminator `{ANSWER_TERMINATOR}`"),
            ));
        }
        if let EmbeddingConfig::Hashing { dimensions: 0 } = self.embedding {
            return Err(ConfigError::Invalid(
                "embedding.dimensions",
                "must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// # Errors
    /// [`ConfigError::Invalid`] if `bind_addr` is not a socket address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid("bind_addr", e.to_string()))
    }

    #[must_use]
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            top_k: self.top_k,
            max_tokens: self.max_tokens,
            stop_sequences: self.stop_sequences.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_the_service() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.top_k, 2);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.stop_sequences, vec!["+++", "Q:"]);
        assert_eq!(config.snapshot_interval(), Duration::from_secs(60));
        assert_eq!(config.socket_addr().unwrap().port(), 5000);
        assert_eq!(config.pipeline_options(), PipelineOptions::default());
    }

    #[test]
    fn test_config_deserialization() {
        let json = r#"{
            "bind_addr": "0.0.0.0:8000",
            "request_timeout_secs": 30,
            "top_k": 4,
            "embedding": { "provider": "openai", "model": "text-embedding-3-small", "api_key_var": "MY_KEY" }
        }"#;

        let config = Config::from_json_str(json);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.top_k, 4);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(
            config.embedding,
            EmbeddingConfig::OpenAI {
                api_url: None,
                model: "text-embedding-3-small".to_string(),
                api_key_var: Some("MY_KEY".to_string()),
            }
        );
    }

    #[test]
    fn test_hashing_embedding_config() {
        let config =
            Config::from_json_str(r#"{"embedding": {"provider": "hashing", "dimensions": 64}}"#)
                .unwrap();
        assert_eq!(config.embedding, EmbeddingConfig::Hashing { dimensions: 64 });
        assert!(matches!(
            config.embedding.build(),
            Ok(ConfiguredEmbedding::Hashing(e)) if e.dimensions() == 64
        ));
    }

    #[test]
    fn test_rejects_unknown_fields_and_bad_values() {
        assert!(matches!(
            Config::from_json_str(r#"{"nope": 1}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{"top_k": 0}"#),
            Err(ConfigError::Invalid("top_k", _))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{"bind_addr": "localhost"}"#),
            Err(ConfigError::Invalid("bind_addr", _))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{"embedding": {"provider": "hashing", "dimensions": 0}}"#),
            Err(ConfigError::Invalid("embedding.dimensions", _))
        ));
    }

    #[test]
    fn test_stop_sequences_keep_the_answer_terminator() {
        let config = Config::from_json_str(r#"{"stop_sequences": ["+++", "Q:", "\n\n"]}"#).unwrap();
        assert_eq!(config.stop_sequences.len(), 3);

        assert!(matches!(
            Config::from_json_str(r#"{"stop_sequences": ["Q:"]}"#),
            Err(ConfigError::Invalid("stop_sequences", _))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{"stop_sequences": []}"#),
            Err(ConfigError::Invalid("stop_sequences", _))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars = HashMap::from([
            (COMPLETION_URL_ENV_VAR, "http://engine:9000/completion"),
            (SNAPSHOT_PATH_ENV_VAR, "/tmp/snap.json"),
        ]);
        let mut config = Config::default();
        config.apply_env_overrides(|key| vars.get(key).map(ToString::to_string));
        assert_eq!(config.completion_url, "http://engine:9000/completion");
        assert_eq!(config.snapshot_path, PathBuf::from("/tmp/snap.json"));
        assert_eq!(config.bind_addr, "127.0.0.1:5000");
    }

    #[test]
    fn test_openai_embedding_requires_key() {
        let config = EmbeddingConfig::OpenAI {
            api_url: None,
            model: "m".to_string(),
            api_key_var: Some("CORPUSPROMPT_TEST_SURELY_UNSET_KEY".to_string()),
        };
        assert!(matches!(
            config.build(),
            Err(ConfigError::MissingEnvVar(var)) if var == "CORPUSPROMPT_TEST_SURELY_UNSET_KEY"
        ));
    }
}
