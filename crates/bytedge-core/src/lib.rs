// ABOUTME: Core library for bytedge - types, rules, routing, knowledge, formatter, backends, engine
// ABOUTME: Shared by the bytedge CLI and any shell that embeds a domain agent

pub mod backend;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod format;
mod history;
pub mod knowledge;
pub mod routing;
pub mod rules;
pub mod types;

pub use backend::{Backend, BackendReply, HttpBackend, Latency, SimulatedBackend};
pub use config::{BackendKind, Config};
pub use directory::{AgentDirectory, AgentSummary, HealthReport};
pub use engine::{Engine, DECLINED_NOTICE, UNREACHABLE_NOTICE};
pub use error::{BackendError, EdgeError};
pub use knowledge::{AgentIdentity, Domain, KnowledgeBase};
pub use routing::{Router, RoutingKeywords};
pub use rules::{Rule, RuleEngine, RuleError};
pub use types::{HistoryEntry, IgnoreReason, Message, Sender, TurnEvent, TurnOutcome, TurnState};
