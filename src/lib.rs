//! `rig_responder` answers free-text questions with context pulled from a document store.
//!
//! # Overview
//! A [Responder](crate::responder::Responder) is a small retrieval-augmented generation (RAG)
//! pipeline built from two collaborators:
//! - a document store implementing [VectorStoreIndex](crate::vector_store::VectorStoreIndex),
//!   which performs the similarity search;
//! - a chat model implementing [CompletionModel](crate::completion::CompletionModel),
//!   which generates the answer.
//!
//! For every call the responder searches the store with the raw user message, joins the
//! contents of the returned documents with newlines, renders them into a system prompt
//! template (placeholder `{documents}`) and sends exactly one system message and one user
//! message to the chat model. The model's text is returned verbatim.
//!
//! # Example
//! ```ignore
//! use rig_responder::{
//!     client::CompletionClient,
//!     prompt::PromptTemplate,
//!     providers::ollama,
//! };
//!
//! let client = ollama::Client::new()?;
//!
//! let responder = client
//!     .responder(ollama::LLAMA3_2, my_index)
//!     .system_prompt(PromptTemplate::system_qa()?)
//!     .build()?;
//!
//! let answer = responder.retrieve("Which albums were released in 1973?").await?;
//! println!("{answer}");
//! ```
//!
//! # Modules
//! - [completion]: role-tagged messages and the chat model seam.
//! - [vector_store]: documents and the similarity search seam.
//! - [prompt]: the system prompt template.
//! - [responder]: the retrieval-augmented responder itself.
//! - [providers]: HTTP chat adapters (Ollama, OpenAI-compatible).
//! - [config]: responder configuration, loadable from the environment.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod completion;
pub mod config;
pub mod json_utils;
pub mod prompt;
pub mod providers;
pub mod responder;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod test_utils;
pub mod vector_store;

pub use completion::{CompletionModel, Message, Prompt};
pub use prompt::PromptTemplate;
pub use responder::{Responder, ResponderBuilder, RetrieveError};
pub use vector_store::{Document, VectorStoreIndex};
