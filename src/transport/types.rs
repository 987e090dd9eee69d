//! Request and reply types for the chat service

use crate::message::Annotation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical reply to a free-text query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryReply {
    pub content: String,
    pub annotations: Vec<Annotation>,
}

/// Fields of an email draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailPayload {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailPayload {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Raw reply to an email action. Every field of the body is preserved.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailActionReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmailActionReply {
    /// Non-empty `data.summary`, if the server sent one.
    pub fn summary(&self) -> Option<&str> {
        self.data
            .as_ref()?
            .get("summary")?
            .as_str()
            .filter(|summary| !summary.is_empty())
    }
}

/// Result of the service health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub router: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

// ============================================================================
// Wire Formats
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct QueryRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmailActionRequest<'a> {
    pub action: &'a str,
    pub payload: &'a EmailPayload,
}

/// Query reply as servers have shipped it over time
#[derive(Debug, Deserialize)]
pub(crate) struct WireQueryReply {
    #[serde(rename = "responseText")]
    response_text: Option<String>,
    reply: Option<String>,
    text: Option<String>,
    /// Decoded entry by entry; entries without text or label are dropped.
    #[serde(default)]
    entities: Option<Value>,
}

/// Entity as emitted by current (`label`) and older (`type`) servers
#[derive(Debug, Deserialize)]
struct WireEntity {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl WireEntity {
    fn into_annotation(self) -> Option<Annotation> {
        let text = self.text.filter(|t| !t.is_empty())?;
        let label = self.label.or(self.kind).filter(|l| !l.is_empty())?;
        Some(Annotation::new(text, label))
    }
}

fn annotations_from(entities: Option<Value>) -> Vec<Annotation> {
    let Some(Value::Array(entries)) = entities else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<WireEntity>(entry).ok())
        .filter_map(WireEntity::into_annotation)
        .collect()
}

impl From<WireQueryReply> for QueryReply {
    fn from(wire: WireQueryReply) -> Self {
        Self {
            content: wire
                .response_text
                .or(wire.reply)
                .or(wire.text)
                .unwrap_or_default(),
            annotations: annotations_from(wire.entities),
        }
    }
}
