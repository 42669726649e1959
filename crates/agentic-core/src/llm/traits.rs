use crate::error::AgenticError;
use serde::{Deserialize, Serialize};

/// Role vocabulary of the completion API. Assistant turns are sent as `model`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompletionRole {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Base64-encoded payload.
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::InlineData { .. } => None,
        }
    }
}

/// One turn of the request payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: CompletionRole,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: CompletionRole::User,
            parts: vec![Part::text(text)],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: CompletionRole::Model,
            parts: vec![Part::text(text)],
        }
    }

    /// Concatenated text of every text part.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCount {
    #[serde(rename = "totalTokens", default)]
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub system_instruction: Option<String>,
}

impl GenerateOptions {
    pub fn with_system_instruction(instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: Some(instruction.into()),
        }
    }
}

/// Events emitted during a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta(String),
    Done,
    Error(String),
}

/// The completion client trait. A stream is finite and cannot be restarted.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Estimate the token count of a payload.
    async fn count_tokens(
        &self,
        model: &str,
        contents: &[Content],
    ) -> Result<TokenCount, AgenticError>;

    /// Open a response stream for a payload.
    async fn stream_generate(
        &self,
        model: &str,
        contents: &[Content],
        options: &GenerateOptions,
    ) -> Result<futures::channel::mpsc::UnboundedReceiver<StreamEvent>, AgenticError>;
}
