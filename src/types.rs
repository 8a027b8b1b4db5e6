//! Core types for the webhook bridge.
//!
//! Two families of types live here. The inbound family ([`Message`],
//! [`MessageContent`], [`ContentPart`]) mirrors the OpenAI chat-completion
//! wire shapes the bridge accepts. The outbound family ([`OutboundPayload`],
//! [`PayloadMessage`], [`FileAttachment`]) is the exact JSON body the
//! workflow-automation webhook expects, where field *presence* is part of the
//! contract: optional identity fields are omitted entirely when absent rather
//! than serialized as `null` or `""`.

use crate::task::TaskType;
use serde::{Deserialize, Serialize};

/// Message role in the conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One typed part of a multimodal message, OpenAI wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Image reference inside a multimodal part. Either a remote URL or an
/// embeddable `data:<mime>;base64,<data>` URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Message content: plain text or an ordered sequence of typed parts.
///
/// Untagged so both `"content": "hi"` and `"content": [{"type":"text",...}]`
/// deserialize from the inbound request, and serialize back unchanged in
/// passthrough mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Flatten to plain text: text parts joined with newlines in original
    /// order, image parts contributing nothing.
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A chat message in the inbound request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: MessageContent,
}

impl Message {
    pub fn new(role: MessageRole, content: MessageContent) -> Self {
        Self { role, content }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Create a user message with multimodal content parts
    pub fn user_with_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Parts(parts),
        }
    }
}

/// Optional identity attributes attached to a request.
///
/// `None` and `""` are equivalent: both mean the attribute is absent and must
/// not appear in the outbound payload. Use [`UserContext::normalized`] before
/// building a payload so the two collapse to one representation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserContext {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

impl UserContext {
    /// Collapse empty strings to `None` in every field.
    pub fn normalized(self) -> Self {
        Self {
            id: non_empty(self.id),
            email: non_empty(self.email),
            name: non_empty(self.name),
            role: non_empty(self.role),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// A non-system message as it appears in the outbound payload.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadMessage {
    pub role: MessageRole,
    pub content: MessageContent,
}

/// A file extracted from an embeddable image part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    /// Deterministic name: `message_<index>_file_<partIndex>.<ext>`
    pub name: String,
    pub mime_type: String,
    pub base64_data: String,
}

/// The JSON body of the webhook POST.
///
/// `userEmail`/`userName`/`userRole` are omitted when absent; `taskType` is
/// always present (serialized as `null` when no detector matched); `files`
/// only appears when the active file mode inlines extracted files.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundPayload {
    /// System prompt text, possibly empty
    pub system_prompt: String,

    /// Text of the last user message, empty string if none
    pub chat_input: String,

    /// Ordered non-system messages, content normalized per the file mode
    pub messages: Vec<PayloadMessage>,

    /// Caller-provided session identifier
    pub session_id: String,

    /// User id, `"anonymous"` when no value was found anywhere
    pub user_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,

    /// Whether a task detector matched this request
    pub is_task: bool,

    /// Which task type matched, `null` when none did
    pub task_type: Option<TaskType>,

    /// Files extracted inline; omitted entirely when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileAttachment>,
}
