//! Completion executors: one outbound webhook call per inbound request.
//!
//! Both executors share the same outbound POST (JSON payload, optional bearer
//! key, configured timeout) and the same framing engine
//! ([`ChunkExtractor`]); they differ only in how results reach the caller.
//!
//! - [`WebhookExecutor::execute`] drains the entire response body and returns
//!   the concatenation of every content fragment, in arrival order.
//! - [`WebhookExecutor::execute_streaming`] returns a lazy, finite,
//!   non-restartable [`ContentStream`]. A producer task reads outbound bytes
//!   and pushes parsed fragments onto a bounded channel; dropping the stream
//!   closes the channel, which aborts the producer and with it the outbound
//!   socket. Nothing is yielded after cancellation and no pending fragment is
//!   replayed.
//!
//! Parser state is created per call and never shared: concurrent requests
//! need no locks because no state crosses request boundaries. Transport and
//! HTTP failures are classified (see [`crate::Error`]) and surfaced without
//! retry.

use crate::config::BridgeOptions;
use crate::extractor::ChunkExtractor;
use crate::types::OutboundPayload;
use crate::{Error, Result};
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// A pinned, boxed stream of content fragments from the webhook.
///
/// Finite and non-restartable: once it ends or is dropped, the underlying
/// call is over. Each item is a fragment's `content` string or a classified
/// error; errors terminate the stream.
pub type ContentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Capacity of the producer-to-consumer fragment queue. Bounded so a slow
/// inbound client applies backpressure to the outbound read.
const FRAGMENT_QUEUE_CAPACITY: usize = 32;

/// Issues outbound webhook calls and frames their responses.
pub struct WebhookExecutor {
    /// Reused across calls for connection pooling. The timeout applies to
    /// the whole call, not to individual fragments.
    http_client: reqwest::Client,
    options: BridgeOptions,
}

impl WebhookExecutor {
    /// Create an executor from bridge options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built.
    pub fn new(options: BridgeOptions) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(options.timeout_ms))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            options,
        })
    }

    /// POST the payload and check the status line before touching the body.
    async fn post(&self, url: &str, payload: &OutboundPayload) -> Result<reqwest::Response> {
        let mut request = self
            .http_client
            .post(url)
            .header("Content-Type", "application/json")
            .json(payload);

        if let Some(key) = &self.options.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(Error::classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });
            return Err(Error::upstream_http(status.as_u16(), message));
        }

        Ok(response)
    }

    /// Non-streaming completion: drain the whole response through the
    /// extractor and return the joined content.
    ///
    /// An empty upstream stream is not an error; it yields `""`.
    pub async fn execute(&self, url: &str, payload: &OutboundPayload) -> Result<String> {
        let response = self.post(url, payload).await?;

        let mut extractor = ChunkExtractor::new();
        let mut body = response.bytes_stream();
        let mut joined = String::new();

        while let Some(chunk) = body.next().await {
            let bytes = chunk.map_err(Error::classify_transport)?;
            for content in extractor.push_bytes(&bytes) {
                joined.push_str(&content);
            }
        }

        Ok(joined)
    }

    /// Streaming completion: fragments are yielded as they become available,
    /// suspending between network chunks without blocking other requests.
    ///
    /// Dropping the returned stream cancels the call: the producer observes
    /// the closed channel at its next suspension point and aborts, which
    /// drops the response and tears down the outbound socket.
    pub async fn execute_streaming(
        &self,
        url: &str,
        payload: &OutboundPayload,
    ) -> Result<ContentStream> {
        let response = self.post(url, payload).await?;

        let (tx, rx) = mpsc::channel::<Result<String>>(FRAGMENT_QUEUE_CAPACITY);

        tokio::spawn(async move {
            let mut extractor = ChunkExtractor::new();
            let mut body = response.bytes_stream();

            loop {
                tokio::select! {
                    _ = tx.closed() => {
                        log::debug!("consumer disconnected, aborting webhook stream");
                        return;
                    }
                    chunk = body.next() => match chunk {
                        Some(Ok(bytes)) => {
                            for content in extractor.push_bytes(&bytes) {
                                if tx.send(Ok(content)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Some(Err(err)) => {
                            let _ = tx.send(Err(Error::classify_transport(err))).await;
                            return;
                        }
                        // Upstream finished; any partial remainder is discarded.
                        None => return,
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    /// The options this executor was built with.
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }
}
