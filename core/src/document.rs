use serde::{Deserialize, Serialize};

/// Identifier of a document in the corpus.
///
/// Identity is content-addressed: the id of a document is its own text, so two
/// documents with the same text are the same document.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    #[must_use]
    pub fn for_content(content: &str) -> Self {
        Self(content.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub content: String,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: DocumentId::for_content(&content),
            content,
        }
    }
}

/// A document returned by a similarity search, best match first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub content: String,
    /// 1-based position in the result list
    pub rank: usize,
    pub score: f64,
}
