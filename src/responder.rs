//! This module contains the implementation of the [Responder] struct and its builder.
//!
//! The [Responder] answers a free-text message in a single pass:
//! 1. the document store is searched with the raw message;
//! 2. the contents of the returned documents are joined with newlines, in retrieval order;
//! 3. the joined context is rendered into the system prompt template;
//! 4. the system message and the user message are sent to the chat model;
//! 5. the model's reply is returned verbatim.
//!
//! Nothing is cached between calls and nothing is retried: collaborator failures are
//! returned to the caller as they are.
//!
//! # Example
//! ```ignore
//! use rig_responder::{responder::Responder, prompt::PromptTemplate};
//!
//! let responder = Responder::builder(model, index)
//!     .system_prompt(PromptTemplate::new("Answer using only:\n{documents}")?)
//!     .temperature(0.0)
//!     .build()?;
//!
//! let answer = responder.retrieve("Who produced Nevermind?").await?;
//! ```
use std::path::PathBuf;

use thiserror::Error;
use tracing::Instrument;

use crate::{
    completion::{CompletionError, CompletionModel, Message, Prompt},
    config::ResponderConfig,
    json_utils,
    prompt::{PromptTemplate, TemplateError, TemplateSource},
    vector_store::{Document, VectorStoreError, VectorStoreIndex},
};

#[derive(Debug, Error)]
pub enum RetrieveError {
    /// The search succeeded but returned no documents
    #[error("No documents retrieved for query {query:?}")]
    EmptyRetrieval { query: String },

    #[error("VectorStoreError: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    #[error("CompletionError: {0}")]
    CompletionError(#[from] CompletionError),
}

/// Joins the contents of `documents` with newlines, in the given order.
pub fn join_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A retrieval-augmented responder over a document store `I` and a chat model `M`.
pub struct Responder<M: CompletionModel, I: VectorStoreIndex> {
    /// Chat model generating the answers
    model: M,
    /// Document store providing the context
    index: I,
    /// System prompt, parsed once at construction
    template: PromptTemplate,
    /// Temperature of the model
    temperature: Option<f64>,
    /// Additional parameters to be passed to the model
    additional_params: Option<serde_json::Value>,
}

impl<M, I> Responder<M, I>
where
    M: CompletionModel,
    I: VectorStoreIndex,
{
    pub fn builder(model: M, index: I) -> ResponderBuilder<M, I> {
        ResponderBuilder::new(model, index)
    }

    /// Answer `message` using the documents the store finds for it.
    pub async fn retrieve(&self, message: &str) -> Result<String, RetrieveError> {
        let span = tracing::info_span!(
            target: "rig_responder",
            "retrieve",
            documents = tracing::field::Empty
        );

        self.retrieve_in_span(message).instrument(span).await
    }

    async fn retrieve_in_span(&self, message: &str) -> Result<String, RetrieveError> {
        let documents = self.index.similarity_search(message).await?;
        tracing::Span::current().record("documents", documents.len());

        let Some(first) = documents.first() else {
            return Err(RetrieveError::EmptyRetrieval {
                query: message.to_string(),
            });
        };
        tracing::info!(target: "rig_responder", "first doc retrieved {first}");

        let system_message = self.system_message(&documents);
        tracing::info!(target: "rig_responder", "system message rendered {system_message:?}");

        let response = self
            .model
            .completion_request()
            .message(system_message)
            .message(Message::user(message))
            .temperature_opt(self.temperature)
            .additional_params_opt(self.additional_params.clone())
            .send()
            .await?;

        Ok(response.content)
    }

    /// The system message built from `documents`.
    pub fn system_message(&self, documents: &[Document]) -> Message {
        Message::system(self.template.render(&join_documents(documents)))
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }
}

impl<M, I> Prompt for Responder<M, I>
where
    M: CompletionModel,
    I: VectorStoreIndex,
{
    type Error = RetrieveError;

    async fn prompt(&self, prompt: &str) -> Result<String, RetrieveError> {
        self.retrieve(prompt).await
    }
}

enum TemplateChoice {
    Parsed(PromptTemplate),
    Source(TemplateSource),
}

/// A builder for creating a [Responder].
///
/// Without an explicit system prompt the bundled question-answering prompt
/// ([crate::prompt::SYSTEM_QA_PROMPT]) is used.
pub struct ResponderBuilder<M, I>
where
    M: CompletionModel,
    I: VectorStoreIndex,
{
    model: M,
    index: I,
    template: TemplateChoice,
    temperature: Option<f64>,
    additional_params: Option<serde_json::Value>,
}

impl<M, I> ResponderBuilder<M, I>
where
    M: CompletionModel,
    I: VectorStoreIndex,
{
    pub fn new(model: M, index: I) -> Self {
        Self {
            model,
            index,
            template: TemplateChoice::Source(TemplateSource::default()),
            temperature: None,
            additional_params: None,
        }
    }

    /// Use an already parsed system prompt.
    pub fn system_prompt(mut self, template: PromptTemplate) -> Self {
        self.template = TemplateChoice::Parsed(template);
        self
    }

    /// Load the system prompt from `source` when the responder is built.
    pub fn system_prompt_source(mut self, source: TemplateSource) -> Self {
        self.template = TemplateChoice::Source(source);
        self
    }

    /// Read the system prompt from a file when the responder is built.
    pub fn system_prompt_file(self, path: impl Into<PathBuf>) -> Self {
        self.system_prompt_source(TemplateSource::Path(path.into()))
    }

    /// Set the temperature of the model
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set additional parameters to be passed to the model
    pub fn additional_params(mut self, params: serde_json::Value) -> Self {
        self.additional_params = match self.additional_params {
            Some(existing) => Some(json_utils::merge(existing, params)),
            None => Some(params),
        };
        self
    }

    /// Apply the settings a [ResponderConfig] carries. Unset fields leave the builder as is.
    pub fn config(mut self, config: ResponderConfig) -> Self {
        if let Some(source) = config.system_prompt {
            self = self.system_prompt_source(source);
        }
        if let Some(temperature) = config.temperature {
            self = self.temperature(temperature);
        }
        if let Some(params) = config.additional_params {
            self = self.additional_params(params);
        }
        self
    }

    /// Build the responder. Fails if the system prompt cannot be loaded or parsed.
    pub fn build(self) -> Result<Responder<M, I>, TemplateError> {
        let template = match self.template {
            TemplateChoice::Parsed(template) => template,
            TemplateChoice::Source(source) => PromptTemplate::from_source(&source)?,
        };

        Ok(Responder {
            model: self.model,
            index: self.index,
            template,
            temperature: self.temperature,
            additional_params: self.additional_params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockCompletionModel, MockVectorStore};
    use serde_json::json;

    fn albums() -> Vec<Document> {
        vec![
            Document::new("1", "Abbey Road by The Beatles, 1969"),
            Document::new("2", "Rumours by Fleetwood Mac, 1977"),
        ]
    }

    #[test]
    fn test_join_documents() {
        assert_eq!(
            join_documents(&albums()),
            "Abbey Road by The Beatles, 1969\nRumours by Fleetwood Mac, 1977"
        );
        assert_eq!(join_documents(&[]), "");
        assert_eq!(join_documents(&[Document::new("x", "only")]), "only");
    }

    #[test]
    fn test_system_message() {
        let responder = Responder::builder(MockCompletionModel::echo(), MockVectorStore::empty())
            .system_prompt(PromptTemplate::new("Albums:\n{documents}").unwrap())
            .build()
            .unwrap();

        assert_eq!(
            responder.system_message(&albums()),
            Message::system(
                "Albums:\nAbbey Road by The Beatles, 1969\nRumours by Fleetwood Mac, 1977"
            )
        );
    }

    #[test]
    fn test_default_template_is_system_qa() {
        let responder = Responder::builder(MockCompletionModel::echo(), MockVectorStore::empty())
            .build()
            .unwrap();

        assert_eq!(responder.template(), &PromptTemplate::system_qa().unwrap());
    }

    #[test]
    fn test_build_fails_on_bad_template() {
        let result = Responder::builder(MockCompletionModel::echo(), MockVectorStore::empty())
            .system_prompt_source(TemplateSource::Inline("no placeholder".into()))
            .build();

        assert!(matches!(result, Err(TemplateError::MissingPlaceholder)));
    }

    #[tokio::test]
    async fn test_retrieve_sends_system_then_user() {
        let model = MockCompletionModel::replying("Abbey Road");
        let responder = Responder::builder(model.clone(), MockVectorStore::with_documents(albums()))
            .system_prompt(PromptTemplate::new("{documents}").unwrap())
            .build()
            .unwrap();

        let answer = responder.retrieve("Which Beatles album?").await.unwrap();
        assert_eq!(answer, "Abbey Road");

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].messages,
            vec![
                Message::system(
                    "Abbey Road by The Beatles, 1969\nRumours by Fleetwood Mac, 1977"
                ),
                Message::user("Which Beatles album?"),
            ]
        );
    }

    #[tokio::test]
    async fn test_retrieve_passes_model_settings() {
        let model = MockCompletionModel::echo();
        let responder = Responder::builder(model.clone(), MockVectorStore::with_documents(albums()))
            .temperature(0.2)
            .additional_params(json!({"top_p": 0.5}))
            .additional_params(json!({"seed": 42}))
            .build()
            .unwrap();

        responder.retrieve("hi").await.unwrap();

        let requests = model.requests();
        assert_eq!(requests[0].temperature, Some(0.2));
        assert_eq!(
            requests[0].additional_params,
            Some(json!({"top_p": 0.5, "seed": 42}))
        );
    }

    #[tokio::test]
    async fn test_config_without_template_keeps_custom_prompt() {
        let model = MockCompletionModel::echo();
        let responder = Responder::builder(
            model.clone(),
            MockVectorStore::with_documents(vec![Document::new("1", "D")]),
        )
        .system_prompt(PromptTemplate::new("CUSTOM {documents}").unwrap())
        .config(ResponderConfig {
            temperature: Some(0.3),
            ..Default::default()
        })
        .build()
        .unwrap();

        responder.retrieve("q").await.unwrap();

        let requests = model.requests();
        assert_eq!(requests[0].system_message(), Some("CUSTOM D"));
        assert_eq!(requests[0].temperature, Some(0.3));
    }

    #[test]
    fn test_config_template_overrides_builder_prompt() {
        let responder = Responder::builder(MockCompletionModel::echo(), MockVectorStore::empty())
            .system_prompt(PromptTemplate::new("CUSTOM {documents}").unwrap())
            .config(ResponderConfig {
                system_prompt: Some(TemplateSource::Inline("From config: {documents}".into())),
                ..Default::default()
            })
            .build()
            .unwrap();

        assert_eq!(responder.template().as_str(), "From config: {documents}");
    }

    #[tokio::test]
    async fn test_empty_retrieval_does_not_call_the_model() {
        let model = MockCompletionModel::echo();
        let responder = Responder::builder(model.clone(), MockVectorStore::empty())
            .build()
            .unwrap();

        let err = responder.retrieve("anything").await.unwrap_err();
        assert!(matches!(err, RetrieveError::EmptyRetrieval { ref query } if query == "anything"));
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_delegates_to_retrieve() {
        let responder = Responder::builder(
            MockCompletionModel::echo(),
            MockVectorStore::with_documents(albums()),
        )
        .build()
        .unwrap();

        assert_eq!(responder.prompt("hello").await.unwrap(), "hello");
    }
}
