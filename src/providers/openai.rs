//! OpenAI API client and chat model. Works with any server exposing the OpenAI
//! `/chat/completions` endpoint (vLLM, LM Studio, Azure proxies, ...).
//!
//! # Example
//! ```ignore
//! use rig_responder::{client::{CompletionClient, ProviderClient}, providers::openai};
//!
//! let client = openai::Client::from_env()?;
//!
//! let gpt4o = client.completion_model(openai::GPT_4O);
//! ```
use std::env::VarError;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    client::{self, ClientBuilderError, CompletionClient, ProviderClient},
    completion::{self, CompletionError, CompletionRequest},
    json_utils,
};

// ================================================================
// Main OpenAI Client
// ================================================================
const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1";

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";

pub struct ClientBuilder<'a> {
    api_key: &'a str,
    base_url: &'a str,
    http_client: Option<reqwest::Client>,
}

impl<'a> ClientBuilder<'a> {
    pub fn new(api_key: &'a str) -> Self {
        Self {
            api_key,
            base_url: OPENAI_API_BASE_URL,
            http_client: None,
        }
    }

    pub fn base_url(mut self, base_url: &'a str) -> Self {
        self.base_url = base_url;
        self
    }

    /// Use a preconfigured `reqwest` client (timeouts, proxies, ...).
    pub fn custom_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<Client, ClientBuilderError> {
        let http_client = if let Some(http_client) = self.http_client {
            http_client
        } else {
            reqwest::Client::builder().build()?
        };

        url::Url::parse(self.base_url)
            .map_err(|_| ClientBuilderError::InvalidProperty("base_url"))?;

        Ok(Client {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_key: self.api_key.to_string(),
            http_client,
        })
    }
}

#[derive(Clone)]
pub struct Client {
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("http_client", &self.http_client)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl Client {
    /// Create a new OpenAI client builder.
    pub fn builder(api_key: &str) -> ClientBuilder<'_> {
        ClientBuilder::new(api_key)
    }

    /// Create a new OpenAI client. For more control, use the `builder` method.
    pub fn new(api_key: &str) -> Result<Self, ClientBuilderError> {
        Self::builder(api_key).build()
    }

    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        self.http_client.post(url).bearer_auth(&self.api_key)
    }
}

impl ProviderClient for Client {
    /// Create a client from `OPENAI_API_KEY` (required) and `OPENAI_BASE_URL` (optional).
    fn from_lookup(
        lookup: impl Fn(&str) -> Result<String, VarError>,
    ) -> Result<Self, ClientBuilderError> {
        let api_key = client::required_var(&lookup, OPENAI_API_KEY_ENV)?;

        match client::optional_var(&lookup, OPENAI_BASE_URL_ENV)? {
            Some(base_url) => Self::builder(&api_key).base_url(&base_url).build(),
            None => Self::new(&api_key),
        }
    }
}

impl CompletionClient for Client {
    type CompletionModel = CompletionModel;

    fn completion_model(&self, model: &str) -> CompletionModel {
        CompletionModel::new(self.clone(), model)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

// ================================================================
// OpenAI Completion API
// ================================================================
pub const GPT_4O: &str = "gpt-4o";
pub const GPT_4O_MINI: &str = "gpt-4o-mini";
pub const GPT_4_1: &str = "gpt-4.1";

#[derive(Debug, Deserialize, Serialize)]
pub struct CompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    #[serde(default)]
    pub system_fingerprint: Option<String>,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Choice {
    pub index: usize,
    pub message: Message,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TryFrom<CompletionResponse> for completion::CompletionResponse<CompletionResponse> {
    type Error = CompletionError;

    fn try_from(response: CompletionResponse) -> Result<Self, Self::Error> {
        let choice = response.choices.first().ok_or_else(|| {
            CompletionError::ResponseError("Response contained no choices".to_owned())
        })?;

        let content = match &choice.message {
            Message::Assistant {
                content, refusal, ..
            } => content.clone().or_else(|| refusal.clone()).ok_or_else(|| {
                CompletionError::ResponseError("Response contained no message content".to_owned())
            })?,
            _ => {
                return Err(CompletionError::ResponseError(
                    "Response did not contain an assistant message".to_owned(),
                ));
            }
        };

        Ok(completion::CompletionResponse {
            content,
            raw_response: response,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        refusal: Option<String>,
    },
}

impl From<completion::Message> for Message {
    fn from(message: completion::Message) -> Self {
        match message {
            completion::Message::System { content } => Message::System { content },
            completion::Message::User { content } => Message::User { content },
            completion::Message::Assistant { content } => Message::Assistant {
                content: Some(content),
                refusal: None,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct CompletionModel {
    client: Client,
    /// Name of the model (e.g.: gpt-4o-mini)
    pub model: String,
}

impl CompletionModel {
    pub fn new(client: Client, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    fn create_completion_request(&self, completion_request: CompletionRequest) -> Value {
        let messages = completion_request
            .messages
            .into_iter()
            .map(Message::from)
            .collect::<Vec<_>>();

        let mut request = json!({
            "model": self.model,
            "messages": messages,
        });

        if let Some(temperature) = completion_request.temperature {
            json_utils::merge_inplace(&mut request, json!({ "temperature": temperature }));
        }
        if let Some(params) = completion_request.additional_params {
            json_utils::merge_inplace(&mut request, params);
        }

        request
    }
}

impl completion::CompletionModel for CompletionModel {
    type Response = CompletionResponse;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<completion::CompletionResponse<CompletionResponse>, CompletionError> {
        let request = self.create_completion_request(completion_request);

        tracing::debug!(target: "rig_responder", "OpenAI completion request: {}", request);

        let response = self
            .client
            .post("/chat/completions")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            tracing::debug!(target: "rig_responder", "OpenAI completion response: {}", text);
            let response: CompletionResponse = serde_json::from_str(&text)?;
            response.try_into()
        } else {
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .map(|err| err.error.message)
                .unwrap_or(text);
            Err(CompletionError::ProviderError(message))
        }
    }
}
