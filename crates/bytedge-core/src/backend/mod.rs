// ABOUTME: Backend trait defining how an engine obtains an answer for a turn
// ABOUTME: Implementations: Simulated (local rules + latency), Http (remote chat server)

mod http;
mod simulated;

pub use http::HttpBackend;
pub use simulated::{Latency, SimulatedBackend};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// What a backend answered. `success = false` means the backend responded but
/// declined to produce an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendReply {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl BackendReply {
    pub fn answer(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            message: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The one suspension point of a turn. A real network service and the local
/// simulation both sit behind this trait.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Unique name for this backend
    fn name(&self) -> &'static str;

    /// Produce an answer for the trimmed user text
    async fn send(&self, message: &str) -> Result<BackendReply, BackendError>;

    /// Forget any conversation context kept on the backend's side
    fn reset(&self) {}
}
