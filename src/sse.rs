//! Inbound-facing SSE frame encoding.
//!
//! Streaming responses toward the inbound caller use the OpenAI
//! chat-completion chunk dialect: every content fragment becomes one
//! `data: {...}\n\n` event carrying `delta.content`, the stream ends with a
//! finish-reason chunk and then `data: [DONE]\n\n`. The HTTP handler that
//! writes these frames lives outside this crate; [`SseEncoder`] only encodes
//! them, keeping one chunk id across a whole response the way OpenAI streams
//! do.

use crate::Result;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// End-of-stream sentinel frame.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

static STREAM_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Serialize)]
struct ChatCompletionChunk<'a> {
    id: &'a str,
    object: &'static str,
    created: u64,
    model: &'a str,
    choices: [ChunkChoice<'a>; 1],
}

#[derive(Serialize)]
struct ChunkChoice<'a> {
    index: u32,
    delta: ChunkDelta<'a>,
    finish_reason: Option<&'static str>,
}

#[derive(Serialize, Default)]
struct ChunkDelta<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

/// Encodes one streaming response as OpenAI-style SSE frames.
pub struct SseEncoder {
    id: String,
    model: String,
    created: u64,
}

impl SseEncoder {
    /// Start a new response stream for the given model id.
    pub fn new(model: impl Into<String>) -> Self {
        let created = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let seq = STREAM_COUNTER.fetch_add(1, Ordering::Relaxed);

        Self {
            id: format!("chatcmpl-{}{}", created, seq),
            model: model.into(),
            created,
        }
    }

    fn frame(&self, delta: ChunkDelta<'_>, finish_reason: Option<&'static str>) -> Result<String> {
        let chunk = ChatCompletionChunk {
            id: &self.id,
            object: "chat.completion.chunk",
            created: self.created,
            model: &self.model,
            choices: [ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        };
        Ok(format!("data: {}\n\n", serde_json::to_string(&chunk)?))
    }

    /// Wrap one content fragment as a delta event.
    pub fn content_frame(&self, fragment: &str) -> Result<String> {
        self.frame(
            ChunkDelta {
                role: Some("assistant"),
                content: Some(fragment),
            },
            None,
        )
    }

    /// The finish-reason chunk that precedes [`DONE_FRAME`].
    pub fn finish_frame(&self) -> Result<String> {
        self.frame(ChunkDelta::default(), Some("stop"))
    }
}
