use crate::embeddings::{EmbedderError, EmbeddingModel};
use async_trait::async_trait;

const DEFAULT_DIMENSIONS: usize = 256;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Local bag-of-words embedding.
///
/// Every lowercased alphanumeric token is hashed into one of `dimensions`
/// buckets and the resulting count vector is L2 normalised. Texts sharing more
/// words end up closer under cosine similarity. No network, no model files.
#[derive(Debug, Clone)]
pub struct HashingEmbedding {
    dimensions: usize,
}

impl HashingEmbedding {
    /// # Panics
    /// if `dimensions` is zero
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        assert!(dimensions > 0, "embedding dimensions must be positive");
        Self { dimensions }
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn vectorize(&self, data: &str) -> Vec<f64> {
        let mut vector = vec![0.0; self.dimensions];
        for token in data
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = fnv1a(&token.to_lowercase()) % self.dimensions as u64;
            #[allow(clippy::cast_possible_truncation)]
            {
                vector[bucket as usize] += 1.0;
            }
        }
        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedding {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

#[async_trait]
impl EmbeddingModel for HashingEmbedding {
    async fn embed(&self, data: &str) -> Result<Vec<f64>, EmbedderError> {
        Ok(self.vectorize(data))
    }
}
