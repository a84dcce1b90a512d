// ABOUTME: Error types for the bytedge engine.
// ABOUTME: EdgeError covers setup problems; BackendError covers failed collaborator calls.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while building engines: bad domain names, bad knowledge tables, bad config.
#[derive(Error, Debug)]
pub enum EdgeError {
    /// The requested agent domain does not exist.
    #[error("unknown domain: {0}")]
    UnknownDomain(String),

    /// A knowledge table failed to parse or validate.
    #[error("invalid knowledge base for {domain}: {reason}")]
    KnowledgeBase { domain: String, reason: String },

    /// Configuration values are inconsistent.
    #[error("config error: {0}")]
    Config(String),
}

/// Errors from a backend call. The dispatcher turns every one of these into an
/// error notice; none of them escape a turn.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The request could not be sent or the connection dropped.
    #[error("request failed: {0}")]
    Request(String),

    /// No answer within the configured timeout.
    #[error("backend timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-success status and no usable body.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The server answered but the body could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),
}

pub type Result<T, E = EdgeError> = std::result::Result<T, E>;
