//! # flowbridge
//!
//! Bridge between two HTTP API dialects: an OpenAI-style chat-completion API
//! on the inbound side and a workflow-automation webhook API on the outbound
//! side. Callers send chat messages and expect either a single JSON
//! completion or an SSE stream; the upstream webhook either returns one JSON
//! body or an unbounded byte stream containing embedded JSON fragments.
//!
//! ## What this crate does
//!
//! - **Builds the outbound payload**: chat messages plus session and user
//!   context become the exact JSON body the webhook expects, including
//!   multimodal normalization and inline file extraction.
//! - **Frames the response stream**: the upstream byte stream may be split at
//!   arbitrary byte boundaries - inside multi-byte characters, inside quoted
//!   JSON strings - and the incremental parser still recovers every complete
//!   JSON fragment in arrival order.
//! - **Executes completions** in both modes: a non-streaming call that joins
//!   all content fragments into one string, and a streaming call that yields
//!   fragments lazily with prompt cancellation on client disconnect.
//! - **Classifies failures** into connection-refused, DNS, TLS, timeout, and
//!   upstream HTTP errors. Nothing is retried locally.
//!
//! ## Example
//!
//! ```rust,no_run
//! use flowbridge::{
//!     build_payload, BridgeOptions, Message, TaskDetectorService, UserContext,
//!     WebhookExecutor,
//! };
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = BridgeOptions::builder()
//!         .timeout_ms(300_000)
//!         .api_key("whk-...")
//!         .build();
//!
//!     let messages = vec![
//!         Message::system("You are a helpful assistant"),
//!         Message::user("What's the capital of France?"),
//!     ];
//!
//!     let detectors = TaskDetectorService::new();
//!     let built = build_payload(&messages, "session-1", UserContext::default(), &options, &detectors);
//!
//!     let executor = WebhookExecutor::new(options)?;
//!
//!     // Non-streaming: one joined string.
//!     let answer = executor
//!         .execute("https://flows.example.com/webhook/chat", &built.payload)
//!         .await?;
//!     println!("{}", answer);
//!
//!     // Streaming: fragments as they arrive.
//!     let mut stream = executor
//!         .execute_streaming("https://flows.example.com/webhook/chat", &built.payload)
//!         .await?;
//!     while let Some(fragment) = stream.next().await {
//!         print!("{}", fragment?);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Out of scope
//!
//! HTTP route dispatch and authentication, rate limiting, model-table
//! hot-reload, change-notification webhooks, and process bootstrap are owned
//! by the embedding service. This crate exposes the seams they plug into:
//! [`ModelRepository`] for URL lookup and [`SseEncoder`] for the inbound SSE
//! dialect.

/// Bridge configuration: timeouts, auth, multimodal file mode.
mod config;

/// Error types and transport failure classification.
mod error;

/// Completion executors for both streaming and non-streaming calls.
mod executor;

/// Incremental JSON fragment extraction from the upstream byte stream.
mod extractor;

/// Outbound payload construction from inbound chat messages.
mod payload;

/// Model-id to webhook-URL lookup seam.
mod registry;

/// Inbound-facing SSE frame encoding (OpenAI chunk dialect).
mod sse;

/// Task detection over the inbound message sequence.
mod task;

/// Inbound message and outbound payload types.
mod types;

// --- Configuration ---

pub use config::{BridgeOptions, BridgeOptionsBuilder, FileMode};

// --- Error Handling ---

pub use error::{Error, Result};

// --- Executors ---

pub use executor::{ContentStream, WebhookExecutor};

// --- Framing Engine ---

pub use extractor::{extract, ChunkExtractor};

// --- Payload Construction ---

pub use payload::{build_payload, BuiltPayload};

// --- Collaborator Seams ---

pub use registry::{ModelRepository, StaticModelRepository};
pub use sse::{SseEncoder, DONE_FRAME};
pub use task::{detector_fn, TaskDecision, TaskDetector, TaskDetectorService, TaskType};

// --- Core Types ---

pub use types::{
    ContentPart, FileAttachment, ImageUrl, Message, MessageContent, MessageRole, OutboundPayload,
    PayloadMessage, UserContext,
};

/// Convenience module containing the most commonly used types and functions.
/// Import with `use flowbridge::prelude::*;`.
pub mod prelude {
    pub use crate::{
        build_payload, BridgeOptions, ChunkExtractor, ContentStream, Error, FileMode, Message,
        MessageContent, MessageRole, Result, TaskDetectorService, UserContext, WebhookExecutor,
    };
}
