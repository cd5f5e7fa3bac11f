use serde::{Deserialize, Serialize};

/// A single chat message, tagged by the role of its author.
///
/// Messages are provider-agnostic. Each provider converts them into its own wire format
/// using `From` conversions (see [crate::providers]).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// Instructions and context for the model.
    System { content: String },

    /// Input written by the user.
    User { content: String },

    /// A reply generated by the model.
    Assistant { content: String },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
        }
    }

    /// The text of the message, regardless of its role.
    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Assistant { content } => content,
        }
    }

    /// The role as it appears on the wire (`system`, `user` or `assistant`).
    pub fn role(&self) -> &'static str {
        match self {
            Message::System { .. } => "system",
            Message::User { .. } => "user",
            Message::Assistant { .. } => "assistant",
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.role(), self.content())
    }
}

impl From<&str> for Message {
    fn from(content: &str) -> Self {
        Message::user(content)
    }
}

impl From<String> for Message {
    fn from(content: String) -> Self {
        Message::user(content)
    }
}
