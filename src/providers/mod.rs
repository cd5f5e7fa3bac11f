//! Chat model providers.
//!
//! Each provider module exposes a `Client` (implementing
//! [CompletionClient](crate::client::CompletionClient) and
//! [ProviderClient](crate::client::ProviderClient)) and a `CompletionModel` implementing
//! [crate::completion::CompletionModel]. All requests are non-streaming.
//!
//! - [ollama]: a local or remote Ollama server (`/api/chat`).
//! - [openai]: OpenAI and OpenAI-compatible servers (`/chat/completions`).
pub mod ollama;
pub mod openai;
