//! The document store seam.
//!
//! A document store is anything able to answer a similarity search: given a free-text
//! query it returns an ordered list of [Document]s, most relevant first. How the store
//! embeds the query, how many documents it returns and how it scores them is entirely up
//! to the implementation.
use std::collections::HashMap;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    /// Json error (e.g.: serialization, deserialization, etc.)
    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Datastore error: {0}")]
    DatastoreError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A unit of retrieved context.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Adds a metadata entry to the document.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.metadata.is_empty() {
            write!(f, "Document {{ id: {}, content: {:?} }}", self.id, self.content)
        } else {
            let mut sorted_metadata = self.metadata.iter().collect::<Vec<_>>();
            sorted_metadata.sort_by(|a, b| a.0.cmp(b.0));
            let metadata = sorted_metadata
                .iter()
                .map(|(k, v)| format!("{k}: {v:?}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(
                f,
                "Document {{ id: {}, metadata: {{{}}}, content: {:?} }}",
                self.id, metadata, self.content
            )
        }
    }
}

/// Trait for document stores able to run a similarity search.
pub trait VectorStoreIndex: Send + Sync {
    /// Get the documents most similar to `query`, most relevant first.
    fn similarity_search(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Document>, VectorStoreError>> + Send;
}

pub type SimilaritySearchResult = Result<Vec<Document>, VectorStoreError>;

/// Object-safe version of [VectorStoreIndex], implemented for every index.
/// Use `Box<dyn VectorStoreIndexDyn>` to pick a store at runtime.
pub trait VectorStoreIndexDyn: Send + Sync {
    fn similarity_search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, SimilaritySearchResult>;
}

impl<I: VectorStoreIndex> VectorStoreIndexDyn for I {
    fn similarity_search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, SimilaritySearchResult> {
        Box::pin(VectorStoreIndex::similarity_search(self, query))
    }
}

impl VectorStoreIndex for Box<dyn VectorStoreIndexDyn> {
    async fn similarity_search(&self, query: &str) -> SimilaritySearchResult {
        VectorStoreIndexDyn::similarity_search(self.as_ref(), query).await
    }
}
