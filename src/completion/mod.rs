//! Chat completion primitives.
//!
//! - [`message`]: the role-tagged [Message] exchanged with a chat model.
//! - [`request`]: the [CompletionModel] trait, requests, responses and errors.
//!
//! A chat model is anything that can turn an ordered list of messages into a single,
//! complete text reply. Providers implement [CompletionModel]; higher level components
//! such as the [Responder](crate::responder::Responder) implement [Prompt].

pub mod message;
pub mod request;

pub use message::Message;
pub use request::*;
