//! System prompt templates.
//!
//! A [PromptTemplate] is a piece of text with a single `{documents}` placeholder that is
//! substituted with the retrieved context at prompt time. Templates are parsed once, when
//! they are created, so every problem with a template (unreadable file, missing or unknown
//! placeholder) surfaces at construction and rendering itself cannot fail.
//!
//! Syntax:
//! - `{documents}` is replaced by the context (every occurrence).
//! - `\{`, `\}` and `\\` produce a literal brace or backslash, so `\\{documents}` is a
//!   backslash followed by the context.
//! - any other `{identifier}` is rejected with [TemplateError::UnknownPlaceholder].
//! - braces that do not enclose an identifier (e.g. JSON snippets) are kept as-is.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the placeholder substituted with the retrieved context.
pub const DOCUMENTS_PLACEHOLDER: &str = "documents";

/// The bundled question-answering system prompt.
pub const SYSTEM_QA_PROMPT: &str = include_str!("../prompts/system-qa.st");

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read prompt template {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Prompt template has no `{{documents}}` placeholder")]
    MissingPlaceholder,

    #[error("Prompt template references unknown placeholder `{{{0}}}`")]
    UnknownPlaceholder(String),
}

/// Where a prompt template is loaded from.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSource {
    /// A template file on disk, read once at construction
    Path(PathBuf),
    /// The template text itself
    Inline(String),
    /// The bundled question-answering prompt ([SYSTEM_QA_PROMPT])
    #[default]
    SystemQa,
}

#[derive(Clone, Debug, PartialEq)]
enum Segment {
    Text(String),
    Documents,
}

/// A parsed system prompt template.
#[derive(Clone, Debug, PartialEq)]
pub struct PromptTemplate {
    text: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template from its text.
    pub fn new(text: impl Into<String>) -> Result<Self, TemplateError> {
        let text = text.into();
        let segments = parse(&text)?;
        Ok(Self { text, segments })
    }

    /// Read and parse a template file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(text)
    }

    pub fn from_source(source: &TemplateSource) -> Result<Self, TemplateError> {
        match source {
            TemplateSource::Path(path) => Self::from_file(path),
            TemplateSource::Inline(text) => Self::new(text.clone()),
            TemplateSource::SystemQa => Self::system_qa(),
        }
    }

    /// The bundled question-answering prompt.
    pub fn system_qa() -> Result<Self, TemplateError> {
        Self::new(SYSTEM_QA_PROMPT)
    }

    /// The unrendered template text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Substitute `documents` for every `{documents}` placeholder.
    pub fn render(&self, documents: &str) -> String {
        self.segments
            .iter()
            .fold(String::with_capacity(self.text.len()), |mut out, segment| {
                match segment {
                    Segment::Text(text) => out.push_str(text),
                    Segment::Documents => out.push_str(documents),
                }
                out
            })
    }
}

impl std::str::FromStr for PromptTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

fn parse(text: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut has_placeholder = false;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some((_, '{' | '}' | '\\'))) => {
                if let Some((_, escaped)) = chars.next() {
                    literal.push(escaped);
                }
            }
            '{' => match text.get(i + 1..).and_then(placeholder_name) {
                Some(name) if name == DOCUMENTS_PLACEHOLDER => {
                    if !literal.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Documents);
                    has_placeholder = true;
                    // identifiers are ascii: skip the name and the closing brace
                    for _ in 0..=name.len() {
                        chars.next();
                    }
                }
                Some(name) => return Err(TemplateError::UnknownPlaceholder(name.to_string())),
                None => literal.push(c),
            },
            _ => literal.push(c),
        }
    }

    if !has_placeholder {
        return Err(TemplateError::MissingPlaceholder);
    }
    if !literal.is_empty() {
        segments.push(Segment::Text(literal));
    }

    Ok(segments)
}

/// Returns the identifier directly followed by `}` at the start of `rest`, if any.
fn placeholder_name(rest: &str) -> Option<&str> {
    let end = rest.find('}')?;
    let name = rest.get(..end)?;
    let mut chars = name.chars();
    let first = chars.next()?;

    if (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some(name)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_render_substitutes_documents() {
        let template = PromptTemplate::new("Context:\n{documents}\nAnswer briefly.").unwrap();
        assert_eq!(
            template.render("doc one\ndoc two"),
            "Context:\ndoc one\ndoc two\nAnswer briefly."
        );
    }

    #[test]
    fn test_render_every_occurrence() {
        let template = PromptTemplate::new("{documents}|{documents}").unwrap();
        assert_eq!(template.render("x"), "x|x");
    }

    #[test]
    fn test_render_does_not_reinterpret_context() {
        let template = PromptTemplate::new("<{documents}>").unwrap();
        assert_eq!(template.render("{documents} \\{"), "<{documents} \\{>");
    }

    #[test]
    fn test_escaped_and_json_braces_are_literal() {
        let template =
            PromptTemplate::new(r#"Reply as {"answer": "..."} not \{documents\}: {documents}"#)
                .unwrap();
        assert_eq!(
            template.render("ctx"),
            r#"Reply as {"answer": "..."} not {documents}: ctx"#
        );
    }

    #[test]
    fn test_escaped_backslash_before_placeholder() {
        let template = PromptTemplate::new(r"path: C:\\docs\\{documents}").unwrap();
        assert_eq!(template.render("a.txt"), r"path: C:\docs\a.txt");

        let err = PromptTemplate::new(r"\\\{documents}").unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder));
    }

    #[test]
    fn test_missing_placeholder() {
        let err = PromptTemplate::new("No context here").unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder));
    }

    #[test]
    fn test_unknown_placeholder() {
        let err = PromptTemplate::new("{documents} for {question}").unwrap_err();
        match err {
            TemplateError::UnknownPlaceholder(name) => assert_eq!(name, "question"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_system_qa_is_valid() {
        let template = PromptTemplate::system_qa().unwrap();
        let rendered = template.render("Kind of Blue (1959)");
        assert!(rendered.contains("DOCUMENTS:\nKind of Blue (1959)"));
        assert_eq!(
            PromptTemplate::from_source(&TemplateSource::default()).unwrap(),
            template
        );
    }

    #[test]
    fn test_from_file() {
        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child("system-qa.st");
        file.write_str("Use these:\n{documents}").unwrap();

        let template = PromptTemplate::from_file(file.path()).unwrap();
        assert_eq!(template.as_str(), "Use these:\n{documents}");
        assert_eq!(template.render("a"), "Use these:\na");
    }

    #[test]
    fn test_from_missing_file() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = dir.path().join("missing.st");

        let err = PromptTemplate::from_source(&TemplateSource::Path(path.clone())).unwrap_err();
        match err {
            TemplateError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_template_source_deserialization() {
        let source: TemplateSource =
            serde_json::from_str(r#"{"path": "prompts/system-qa.st"}"#).unwrap();
        assert_eq!(source, TemplateSource::Path("prompts/system-qa.st".into()));

        let source: TemplateSource = serde_json::from_str(r#""system_qa""#).unwrap();
        assert_eq!(source, TemplateSource::SystemQa);
    }
}
