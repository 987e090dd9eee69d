//! Conversation log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Session-unique message identifier, increasing in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg_{}", self.0)
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    Human,
    Assistant,
}

/// A labeled substring returned by the language-analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
    pub label: String,
}

impl Annotation {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }

    /// Byte range of the first occurrence of this span in `haystack`.
    pub fn locate(&self, haystack: &str) -> Option<Range<usize>> {
        if self.text.is_empty() {
            return None;
        }
        haystack
            .find(self.text.as_str())
            .map(|start| start..start + self.text.len())
    }
}

/// Typed message content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "author", rename_all = "snake_case")]
pub enum MessageContent {
    Human {
        text: String,
    },
    Assistant {
        text: String,
        #[serde(default)]
        annotations: Vec<Annotation>,
    },
}

impl MessageContent {
    pub fn human(text: impl Into<String>) -> Self {
        Self::Human { text: text.into() }
    }

    /// Assistant entry without annotations (placeholders, notices, summaries)
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            text: text.into(),
            annotations: Vec::new(),
        }
    }

    pub fn annotated(text: impl Into<String>, annotations: Vec<Annotation>) -> Self {
        Self::Assistant {
            text: text.into(),
            annotations,
        }
    }

    pub fn author(&self) -> Author {
        match self {
            Self::Human { .. } => Author::Human,
            Self::Assistant { .. } => Author::Assistant,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Human { text } | Self::Assistant { text, .. } => text,
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        match self {
            Self::Human { .. } => &[],
            Self::Assistant { annotations, .. } => annotations,
        }
    }
}

/// An entry in the conversation log. Never modified once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(flatten)]
    pub content: MessageContent,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn author(&self) -> Author {
        self.content.author()
    }

    pub fn text(&self) -> &str {
        self.content.text()
    }
}
