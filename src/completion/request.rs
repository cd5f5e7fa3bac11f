//! The chat model seam: [CompletionModel], its request and response types, and the
//! [CompletionError] every provider reports failures with.
//!
//! [CompletionModel] is the interface between providers and the rest of the crate. To
//! plug a private or third party chat service into a [Responder](crate::responder::Responder),
//! implement it for a client type:
//!
//! ```ignore
//! use rig_responder::completion::*;
//!
//! #[derive(Clone)]
//! struct Shouty;
//!
//! impl CompletionModel for Shouty {
//!     type Response = ();
//!
//!     async fn completion(
//!         &self,
//!         request: CompletionRequest,
//!     ) -> Result<CompletionResponse<()>, CompletionError> {
//!         let user = request.last_user_message().unwrap_or_default();
//!         Ok(CompletionResponse { content: user.to_uppercase(), raw_response: () })
//!     }
//! }
//! ```
use thiserror::Error;

use super::message::Message;
use crate::json_utils;

// Errors
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Http error (e.g.: connection error, timeout, etc.)
    #[error("HttpError: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Json error (e.g.: serialization, deserialization)
    #[error("JsonError: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The endpoint url could not be built
    #[error("UrlError: {0}")]
    UrlError(#[from] url::ParseError),

    /// Error parsing the completion response
    #[error("ResponseError: {0}")]
    ResponseError(String),

    /// Error returned by the completion model provider
    #[error("ProviderError: {0}")]
    ProviderError(String),
}

/// Trait defining a high-level one-shot prompt interface (i.e.: prompt in, response out).
pub trait Prompt: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send a prompt and wait for the complete text response.
    fn prompt(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, Self::Error>> + Send;
}

/// General completion response: the generated text and the provider's raw response.
#[derive(Debug)]
pub struct CompletionResponse<T> {
    /// The text generated by the model
    pub content: String,
    /// The raw response returned by the completion model provider
    pub raw_response: T,
}

/// Trait defining a chat model that turns an ordered list of messages into a single,
/// complete response. Implementations block (asynchronously) until the whole reply is
/// available; there is no streaming.
pub trait CompletionModel: Clone + Send + Sync {
    /// The raw response type returned by the underlying completion model.
    type Response: Send + Sync;

    /// Generates a completion response for the given completion request.
    fn completion(
        &self,
        request: CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse<Self::Response>, CompletionError>>
    + Send;

    /// Generates a completion request builder holding this model.
    fn completion_request(&self) -> CompletionRequestBuilder<Self> {
        CompletionRequestBuilder::new(self.clone())
    }
}

/// A request to a chat model.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    /// The messages to send, in order
    pub messages: Vec<Message>,
    /// The temperature to be sent to the completion model provider
    pub temperature: Option<f64>,
    /// Additional provider-specific parameters to be sent to the completion model provider
    pub additional_params: Option<serde_json::Value>,
}

impl CompletionRequest {
    /// Content of the first system message, if any.
    pub fn system_message(&self) -> Option<&str> {
        self.messages.iter().find_map(|message| match message {
            Message::System { content } => Some(content.as_str()),
            _ => None,
        })
    }

    /// Content of the last user message, if any.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|message| match message {
            Message::User { content } => Some(content.as_str()),
            _ => None,
        })
    }
}

/// Builder struct for constructing a completion request.
///
/// ```ignore
/// let response = model
///     .completion_request()
///     .message(Message::system("You are a music librarian."))
///     .message(Message::user("Who recorded Abbey Road?"))
///     .temperature(0.2)
///     .send()
///     .await?;
/// ```
pub struct CompletionRequestBuilder<M: CompletionModel> {
    model: M,
    messages: Vec<Message>,
    temperature: Option<f64>,
    additional_params: Option<serde_json::Value>,
}

impl<M: CompletionModel> CompletionRequestBuilder<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            messages: Vec::new(),
            temperature: None,
            additional_params: None,
        }
    }

    /// Appends a message to the request.
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Appends a list of messages to the request.
    pub fn messages(self, messages: Vec<Message>) -> Self {
        messages
            .into_iter()
            .fold(self, |builder, msg| builder.message(msg))
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn temperature_opt(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Adds additional parameters to the completion request.
    /// Parameters set by successive calls are merged, later keys win.
    pub fn additional_params(mut self, additional_params: serde_json::Value) -> Self {
        match self.additional_params {
            Some(params) => {
                self.additional_params = Some(json_utils::merge(params, additional_params));
            }
            None => {
                self.additional_params = Some(additional_params);
            }
        }
        self
    }

    pub fn additional_params_opt(mut self, additional_params: Option<serde_json::Value>) -> Self {
        self.additional_params = additional_params;
        self
    }

    pub fn build(self) -> CompletionRequest {
        CompletionRequest {
            messages: self.messages,
            temperature: self.temperature,
            additional_params: self.additional_params,
        }
    }

    /// Sends the completion request to the completion model provider and returns the response.
    pub async fn send(self) -> Result<CompletionResponse<M::Response>, CompletionError> {
        let model = self.model.clone();
        model.completion(self.build()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockCompletionModel;
    use serde_json::json;

    #[test]
    fn test_builder_keeps_message_order() {
        let request = MockCompletionModel::echo()
            .completion_request()
            .message(Message::system("context"))
            .messages(vec![Message::user("first"), Message::user("second")])
            .build();

        assert_eq!(
            request.messages,
            vec![
                Message::system("context"),
                Message::user("first"),
                Message::user("second"),
            ]
        );
        assert_eq!(request.system_message(), Some("context"));
        assert_eq!(request.last_user_message(), Some("second"));
    }

    #[test]
    fn test_builder_merges_additional_params() {
        let request = MockCompletionModel::echo()
            .completion_request()
            .additional_params(json!({"top_p": 0.9, "seed": 1}))
            .additional_params(json!({"seed": 7}))
            .temperature(0.3)
            .build();

        assert_eq!(request.additional_params, Some(json!({"top_p": 0.9, "seed": 7})));
        assert_eq!(request.temperature, Some(0.3));
    }

    #[tokio::test]
    async fn test_send_uses_the_model() {
        let response = MockCompletionModel::echo()
            .completion_request()
            .message(Message::user("ping"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.content, "ping");
    }
}
