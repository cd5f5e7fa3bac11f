//! In-process test doubles for the document store and the chat model.
//!
//! Both doubles are cheap to clone and share their call log between clones, so a test
//! can hand one copy to a [Responder](crate::responder::Responder) and inspect another.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    completion::{CompletionError, CompletionModel, CompletionRequest, CompletionResponse},
    vector_store::{Document, VectorStoreError, VectorStoreIndex},
};

#[derive(Clone, Debug)]
enum SearchBehavior {
    Fixed(Vec<Document>),
    ByQuery(HashMap<String, Vec<Document>>),
    Fail(String),
}

/// A document store returning canned search results.
#[derive(Clone, Debug)]
pub struct MockVectorStore {
    behavior: SearchBehavior,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockVectorStore {
    fn from_behavior(behavior: SearchBehavior) -> Self {
        Self {
            behavior,
            queries: Arc::default(),
        }
    }

    /// Returns `documents` for every query.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self::from_behavior(SearchBehavior::Fixed(documents))
    }

    /// Returns no documents at all.
    pub fn empty() -> Self {
        Self::with_documents(vec![])
    }

    /// Returns the documents registered for the exact query, or none.
    pub fn by_query<Q, D>(results: impl IntoIterator<Item = (Q, D)>) -> Self
    where
        Q: Into<String>,
        D: IntoIterator<Item = Document>,
    {
        Self::from_behavior(SearchBehavior::ByQuery(
            results
                .into_iter()
                .map(|(query, docs)| (query.into(), docs.into_iter().collect()))
                .collect(),
        ))
    }

    /// Fails every search with a [VectorStoreError::DatastoreError].
    pub fn failing(message: impl Into<String>) -> Self {
        Self::from_behavior(SearchBehavior::Fail(message.into()))
    }

    /// Every query received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl VectorStoreIndex for MockVectorStore {
    async fn similarity_search(&self, query: &str) -> Result<Vec<Document>, VectorStoreError> {
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(query.to_string());

        match &self.behavior {
            SearchBehavior::Fixed(documents) => Ok(documents.clone()),
            SearchBehavior::ByQuery(results) => Ok(results.get(query).cloned().unwrap_or_default()),
            SearchBehavior::Fail(message) => {
                Err(VectorStoreError::DatastoreError(message.clone().into()))
            }
        }
    }
}

#[derive(Clone, Debug)]
enum ReplyBehavior {
    Echo,
    Fixed(String),
    Fail(String),
}

/// A chat model that echoes the last user message, replies with a fixed text, or fails.
#[derive(Clone, Debug)]
pub struct MockCompletionModel {
    behavior: ReplyBehavior,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompletionModel {
    fn from_behavior(behavior: ReplyBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::default(),
        }
    }

    pub fn echo() -> Self {
        Self::from_behavior(ReplyBehavior::Echo)
    }

    pub fn replying(reply: impl Into<String>) -> Self {
        Self::from_behavior(ReplyBehavior::Fixed(reply.into()))
    }

    /// Fails every request with a [CompletionError::ProviderError].
    pub fn failing(message: impl Into<String>) -> Self {
        Self::from_behavior(ReplyBehavior::Fail(message.into()))
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = ();

    async fn completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse<()>, CompletionError> {
        let content = match &self.behavior {
            ReplyBehavior::Echo => request
                .last_user_message()
                .map(str::to_string)
                .ok_or_else(|| CompletionError::ResponseError("No user message to echo".into())),
            ReplyBehavior::Fixed(reply) => Ok(reply.clone()),
            ReplyBehavior::Fail(message) => Err(CompletionError::ProviderError(message.clone())),
        };

        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        Ok(CompletionResponse {
            content: content?,
            raw_response: (),
        })
    }
}
