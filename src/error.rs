//! Error types and transport failure classification.
//!
//! Every failure the bridge can surface is one variant of [`Error`]. Transport
//! failures coming out of `reqwest` are opaque nested chains, so
//! [`Error::classify_transport`] walks the source chain and maps the failure
//! into the small taxonomy callers route on: connection refused, DNS
//! resolution, TLS verification, timeout, or a generic HTTP error. Upstream
//! HTTP status failures are carried with the numeric status plus the
//! upstream-reported message, with hints attached for the statuses that almost
//! always mean a configuration mistake (401/403/404).
//!
//! Nothing in this crate retries. Classified errors are surfaced once and the
//! caller decides what to do with them.

use std::error::Error as StdError;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the bridge
#[derive(Error, Debug)]
pub enum Error {
    /// The upstream webhook host actively refused the connection
    #[error("Connection refused by webhook endpoint: {0}")]
    ConnectionRefused(String),

    /// The webhook hostname could not be resolved
    #[error("DNS resolution failed for webhook endpoint: {0}")]
    DnsResolution(String),

    /// TLS certificate verification failed when connecting upstream
    #[error("TLS verification failed for webhook endpoint: {0}")]
    TlsVerification(String),

    /// The outbound call exceeded the configured timeout
    #[error("Webhook request timed out")]
    Timeout,

    /// The webhook answered with a non-success HTTP status
    #[error("Webhook returned {status}: {message}{}", hint_for(*.status))]
    UpstreamHttp {
        /// Numeric HTTP status from the upstream response
        status: u16,
        /// Upstream-reported body or status text
        message: String,
    },

    /// Unclassified HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Streaming error
    #[error("Streaming error: {0}")]
    Stream(String),
}

/// Status-specific guidance appended to upstream HTTP errors.
fn hint_for(status: u16) -> &'static str {
    match status {
        401 => " (check the webhook API key)",
        403 => " (the webhook rejected the provided credentials)",
        404 => " (webhook URL not found - is the workflow active?)",
        _ => "",
    }
}

impl Error {
    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a new stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Error::Stream(msg.into())
    }

    /// Create an upstream HTTP error from a status and the upstream message
    pub fn upstream_http(status: u16, message: impl Into<String>) -> Self {
        Error::UpstreamHttp {
            status,
            message: message.into(),
        }
    }

    /// Classify a `reqwest` transport failure into the bridge taxonomy.
    ///
    /// Timeouts are reported by `reqwest` directly. Everything else hides in
    /// the error source chain: connection refusal is an `io::Error` with
    /// `ConnectionRefused` kind, DNS and TLS failures only identify themselves
    /// through their messages. Failures that match none of the known shapes
    /// stay as [`Error::Http`] so no information is lost.
    pub fn classify_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Error::Timeout;
        }

        let mut source: Option<&(dyn StdError + 'static)> = err.source();
        while let Some(cause) = source {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
                if io_err.kind() == std::io::ErrorKind::ConnectionRefused {
                    return Error::ConnectionRefused(err.to_string());
                }
            }

            let text = cause.to_string().to_lowercase();
            if text.contains("dns error") || text.contains("failed to lookup address") {
                return Error::DnsResolution(err.to_string());
            }
            if text.contains("certificate") || text.contains("tls") {
                return Error::TlsVerification(err.to_string());
            }

            source = cause.source();
        }

        Error::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_config() {
        let err = Error::config("missing webhook url");
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(
            err.to_string(),
            "Invalid configuration: missing webhook url"
        );
    }

    #[test]
    fn test_error_stream() {
        let err = Error::stream("connection lost");
        assert!(matches!(err, Error::Stream(_)));
        assert_eq!(err.to_string(), "Streaming error: connection lost");
    }

    #[test]
    fn test_error_timeout_display() {
        assert_eq!(Error::Timeout.to_string(), "Webhook request timed out");
    }

    #[test]
    fn test_upstream_http_hint_401() {
        let err = Error::upstream_http(401, "Unauthorized");
        assert!(err.to_string().contains("check the webhook API key"));
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_upstream_http_hint_403() {
        let err = Error::upstream_http(403, "Forbidden");
        assert!(err.to_string().contains("rejected the provided credentials"));
    }

    #[test]
    fn test_upstream_http_hint_404() {
        let err = Error::upstream_http(404, "Not Found");
        assert!(err.to_string().contains("is the workflow active?"));
    }

    #[test]
    fn test_upstream_http_no_hint_for_500() {
        let err = Error::upstream_http(500, "Internal Server Error");
        assert_eq!(
            err.to_string(),
            "Webhook returned 500: Internal Server Error"
        );
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn _returns_result() -> Result<i32> {
            Ok(42)
        }

        fn _returns_error() -> Result<i32> {
            Err(Error::Timeout)
        }
    }
}
