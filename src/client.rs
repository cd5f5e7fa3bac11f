//! Traits shared by provider clients.
//!
//! A provider client (e.g. [crate::providers::ollama::Client]) creates chat models by name
//! through [CompletionClient], and can wire one straight into a [ResponderBuilder]:
//!
//! ```ignore
//! let responder = openai::Client::from_env()?
//!     .responder(openai::GPT_4O_MINI, index)
//!     .build()?;
//! ```
use std::env::VarError;

use thiserror::Error;

use crate::{
    completion::CompletionModel,
    responder::ResponderBuilder,
    vector_store::VectorStoreIndex,
};

#[derive(Debug, Error)]
pub enum ClientBuilderError {
    /// An error occurred in the HTTP client (reqwest).
    #[error("reqwest error: {0}")]
    HttpError(
        #[from]
        #[source]
        reqwest::Error,
    ),

    /// An invalid property value was provided during client construction.
    #[error("invalid property: {0}")]
    InvalidProperty(&'static str),

    /// A required environment variable is not set.
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
}

/// A client that can be created from environment variables.
pub trait ProviderClient: Sized {
    /// Create a client from the process environment.
    fn from_env() -> Result<Self, ClientBuilderError> {
        Self::from_lookup(|name| std::env::var(name))
    }

    /// Create a client through `lookup`, which resolves a variable like [std::env::var].
    fn from_lookup(
        lookup: impl Fn(&str) -> Result<String, VarError>,
    ) -> Result<Self, ClientBuilderError>;
}

/// A variable that must be set.
pub(crate) fn required_var(
    lookup: &impl Fn(&str) -> Result<String, VarError>,
    name: &'static str,
) -> Result<String, ClientBuilderError> {
    optional_var(lookup, name)?.ok_or(ClientBuilderError::MissingEnv(name))
}

/// A variable that may be unset. A value that is not valid unicode is an error.
pub(crate) fn optional_var(
    lookup: &impl Fn(&str) -> Result<String, VarError>,
    name: &'static str,
) -> Result<Option<String>, ClientBuilderError> {
    match lookup(name) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ClientBuilderError::InvalidProperty(name)),
    }
}

/// A client able to create chat models.
pub trait CompletionClient {
    type CompletionModel: CompletionModel;

    /// Create a chat model with the given name.
    fn completion_model(&self, model: &str) -> Self::CompletionModel;

    /// Create a responder builder answering with `model` over `index`.
    fn responder<I: VectorStoreIndex>(
        &self,
        model: &str,
        index: I,
    ) -> ResponderBuilder<Self::CompletionModel, I> {
        ResponderBuilder::new(self.completion_model(model), index)
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    #[test]
    fn test_optional_var() {
        let set = |_: &str| -> Result<String, VarError> { Ok("value".to_string()) };
        let unset = |_: &str| -> Result<String, VarError> { Err(VarError::NotPresent) };
        let garbled = |_: &str| -> Result<String, VarError> {
            Err(VarError::NotUnicode(OsString::from("x")))
        };

        assert_eq!(optional_var(&set, "A").unwrap(), Some("value".to_string()));
        assert_eq!(optional_var(&unset, "A").unwrap(), None);
        assert!(matches!(
            optional_var(&garbled, "A"),
            Err(ClientBuilderError::InvalidProperty("A"))
        ));
    }

    #[test]
    fn test_required_var() {
        let unset = |_: &str| -> Result<String, VarError> { Err(VarError::NotPresent) };
        assert!(matches!(
            required_var(&unset, "KEY"),
            Err(ClientBuilderError::MissingEnv("KEY"))
        ));
    }
}
