//! Error types for request resolution and response normalization.
//!
//! # Design
//! The three caller-visible failure classes are kept apart: `ConfigError`
//! is produced before any I/O, `TransportError` is whatever the transport
//! reported while delivering the response, and `HttpStatusError` is the
//! JSON client's promotion of a >= 400 status into an error. Body decode
//! failures are deliberately absent; they degrade to an empty mapping.

use serde_json::Value;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Misconfiguration detected while building a request descriptor.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No option layer names a destination.
    #[error("no target url: one of url, uri, path or baseUrl is required")]
    MissingTarget,

    /// An origin-relative path with no base URL, host or hostname to anchor it.
    #[error("cannot resolve relative path {path:?}: no baseUrl, host or hostname")]
    UnresolvableBase { path: String },

    /// The resolved target is not a valid absolute URL.
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A JSON client base URL without a scheme separator.
    #[error("base url must be fully qualified: {0:?}")]
    BaseUrlNotQualified(String),

    /// `call` was given a method name that is not a supported verb.
    #[error("unknown http method: {0:?}")]
    UnknownMethod(String),

    /// An encoding hint naming an unsupported text encoding.
    #[error("unknown text encoding: {0:?}")]
    UnknownEncoding(String),

    /// A structured body could not be serialized to JSON.
    #[error("failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure reported by the transport while sending or draining a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request could not be delivered.
    #[error("connection error: {0}")]
    Connect(String),

    /// The response stream failed before completion.
    #[error("stream error: {0}")]
    Stream(String),

    /// The transport returned without signalling end-of-stream or an error.
    #[error("response stream ended without a terminal event")]
    Incomplete,

    /// End-of-stream arrived before any status line.
    #[error("response completed without a status line")]
    MissingHead,
}

/// Error synthesized by the JSON client for responses with status >= 400.
///
/// Mirrors the conventional JSON client error: the status code, the decoded
/// body, and the raw response text as the message.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct HttpStatusError {
    pub status_code: u16,
    /// Canonical reason phrase for `status_code`, or `"http error"`.
    pub reason: String,
    /// The decoded response body (an empty mapping when undecodable).
    pub body: Value,
    /// The raw response body text.
    pub message: String,
}

impl HttpStatusError {
    pub fn new(status_code: u16, body: Value, message: String) -> Self {
        let reason = http::StatusCode::from_u16(status_code)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("http error")
            .to_string();
        Self {
            status_code,
            reason,
            body,
            message,
        }
    }
}

/// Any error delivered to a completion handler.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Status(#[from] HttpStatusError),
}

impl Error {
    /// HTTP status code if this is a synthesized status error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status(e) => Some(e.status_code),
            _ => None,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
