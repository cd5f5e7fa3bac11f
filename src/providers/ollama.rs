//! Ollama API client and chat model
//!
//! # Example
//! ```ignore
//! use rig_responder::{client::CompletionClient, providers::ollama};
//!
//! // Create a new Ollama client (defaults to http://localhost:11434)
//! let client = ollama::Client::new()?;
//!
//! // Create a chat model using, for example, the "llama3.2" model
//! let model = client.completion_model(ollama::LLAMA3_2);
//! ```
use std::env::VarError;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

use crate::{
    client::{self, ClientBuilderError, CompletionClient, ProviderClient},
    completion::{self, CompletionError, CompletionRequest},
    json_utils,
};

// ---------- Main Client ----------

const OLLAMA_API_BASE_URL: &str = "http://localhost:11434";

/// Environment variable overriding the server url in [Client::from_env].
pub const OLLAMA_API_BASE_URL_ENV: &str = "OLLAMA_API_BASE_URL";

pub struct ClientBuilder<'a> {
    base_url: &'a str,
    http_client: Option<reqwest::Client>,
}

impl<'a> ClientBuilder<'a> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            base_url: OLLAMA_API_BASE_URL,
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

        let mut base_url = Url::parse(self.base_url)
            .map_err(|_| ClientBuilderError::InvalidProperty("base_url"))?;
        // endpoint paths are joined onto the base, which drops a last segment without `/`
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Client {
            base_url,
            http_client,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    base_url: Url,
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new Ollama client builder.
    pub fn builder<'a>() -> ClientBuilder<'a> {
        ClientBuilder::new()
    }

    /// Create a new Ollama client for the default url. For more control, use the `builder` method.
    pub fn new() -> Result<Self, ClientBuilderError> {
        Self::builder().build()
    }

    pub(crate) fn post(&self, path: &str) -> Result<reqwest::RequestBuilder, url::ParseError> {
        let url = self.base_url.join(path)?;
        Ok(self.http_client.post(url))
    }
}

impl ProviderClient for Client {
    /// Create a client for `OLLAMA_API_BASE_URL`, or the default url if it is not set.
    fn from_lookup(
        lookup: impl Fn(&str) -> Result<String, VarError>,
    ) -> Result<Self, ClientBuilderError> {
        match client::optional_var(&lookup, OLLAMA_API_BASE_URL_ENV)? {
            Some(api_base) => Self::builder().base_url(&api_base).build(),
            None => Self::new(),
        }
    }
}

impl CompletionClient for Client {
    type CompletionModel = CompletionModel;

    fn completion_model(&self, model: &str) -> CompletionModel {
        CompletionModel::new(self.clone(), model)
    }
}

// ---------- Completion API ----------

pub const LLAMA3_2: &str = "llama3.2";
pub const MISTRAL: &str = "mistral";
pub const QWEN2_5: &str = "qwen2.5";

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub model: String,
    pub created_at: String,
    pub message: Message,
    pub done: bool,
    #[serde(default)]
    pub done_reason: Option<String>,
    #[serde(default)]
    pub total_duration: Option<u64>,
    #[serde(default)]
    pub load_duration: Option<u64>,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl TryFrom<CompletionResponse> for completion::CompletionResponse<CompletionResponse> {
    type Error = CompletionError;

    fn try_from(resp: CompletionResponse) -> Result<Self, Self::Error> {
        let content = match &resp.message {
            Message::Assistant { content, .. } => content.clone(),
            _ => {
                return Err(CompletionError::ResponseError(
                    "Chat response does not include an assistant message".into(),
                ));
            }
        };

        Ok(completion::CompletionResponse {
            content,
            raw_response: resp,
        })
    }
}

// ---------- Completion Model ----------

#[derive(Clone, Debug)]
pub struct CompletionModel {
    client: Client,
    pub model: String,
}

impl CompletionModel {
    pub fn new(client: Client, model: &str) -> Self {
        Self {
            client,
            model: model.to_owned(),
        }
    }

    fn create_completion_request(&self, completion_request: CompletionRequest) -> Value {
        let messages = completion_request
            .messages
            .into_iter()
            .map(Message::from)
            .collect::<Vec<_>>();

        let mut options = json!({});
        if let Some(temperature) = completion_request.temperature {
            options["temperature"] = json!(temperature);
        }
        if let Some(extra) = completion_request.additional_params {
            json_utils::merge_inplace(&mut options, extra);
        }

        let request_payload = json!({
            "model": self.model,
            "messages": messages,
            "options": options,
            "stream": false,
        });

        tracing::debug!(target: "rig_responder", "Ollama chat payload: {}", request_payload);

        request_payload
    }
}

impl completion::CompletionModel for CompletionModel {
    type Response = CompletionResponse;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<completion::CompletionResponse<Self::Response>, CompletionError> {
        let request_payload = self.create_completion_request(completion_request);

        let response = self
            .client
            .post("api/chat")?
            .json(&request_payload)
            .send()
            .await?;

        if response.status().is_success() {
            let text = response.text().await?;
            tracing::debug!(target: "rig_responder", "Ollama chat response: {}", text);
            let chat_resp: CompletionResponse = serde_json::from_str(&text)?;
            chat_resp.try_into()
        } else {
            let err_text = response.text().await?;
            Err(CompletionError::ProviderError(err_text))
        }
    }
}

// ---------- Provider Message Definition ----------

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User {
        content: String,
    },
    Assistant {
        #[serde(default)]
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        thinking: Option<String>,
    },
    System {
        content: String,
    },
}

impl From<completion::Message> for Message {
    fn from(message: completion::Message) -> Self {
        match message {
            completion::Message::System { content } => Message::System { content },
            completion::Message::User { content } => Message::User { content },
            completion::Message::Assistant { content } => Message::Assistant {
                content,
                thinking: None,
            },
        }
    }
}
