// ABOUTME: The turn dispatcher - validates input, gates on turn state, calls the backend, records history
// ABOUTME: One Engine per agent; all conversation state lives inside the instance

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::backend::Backend;
use crate::history::History;
use crate::knowledge::AgentIdentity;
use crate::types::{HistoryEntry, IgnoreReason, Message, TurnEvent, TurnOutcome, TurnState};

/// Shown when the backend answered but declined to produce an answer
pub const DECLINED_NOTICE: &str = "I apologize, but I encountered an error processing your request. Please try again or rephrase your question.";

/// Shown when the backend could not be reached or timed out
pub const UNREACHABLE_NOTICE: &str =
    "I'm having trouble connecting right now. Please check your connection and try again.";

/// Input limit matching the chat widget's textarea
pub const DEFAULT_MAX_INPUT_CHARS: usize = 2000;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct Conversation {
    turn: TurnState,
    /// Bumped by every reset so in-flight turns can tell they are stale
    epoch: u64,
    input: String,
    history: History,
    transcript: Vec<Message>,
}

/// A domain agent's conversation engine.
pub struct Engine {
    identity: Arc<AgentIdentity>,
    backend: Arc<dyn Backend>,
    max_input_chars: usize,
    conversation: Mutex<Conversation>,
    events: broadcast::Sender<TurnEvent>,
}

/// Flips the turn back to Idle when the turn ends, however it ends.
struct TurnGuard<'a> {
    engine: &'a Engine,
    epoch: u64,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        let mut conversation = self.engine.lock();
        if conversation.epoch == self.epoch && conversation.turn == TurnState::Busy {
            conversation.turn = TurnState::Idle;
            self.engine.emit(TurnEvent::StateChanged(TurnState::Idle));
        }
    }
}

fn clamp(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

impl Engine {
    pub fn new(identity: AgentIdentity, backend: Arc<dyn Backend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        tracing::info!(
            agent = %identity.name,
            domain = %identity.domain,
            backend = backend.name(),
            "Engine initialized"
        );
        Self {
            identity: Arc::new(identity),
            backend,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            conversation: Mutex::new(Conversation::default()),
            events,
        }
    }

    /// Override the input length limit (at least one character)
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars.max(1);
        self
    }

    // A panic while holding the lock cannot leave the conversation half-edited,
    // every mutation is a single push/assign.
    fn lock(&self) -> MutexGuard<'_, Conversation> {
        self.conversation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: TurnEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    /// Receive every state change and displayed message from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TurnEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> TurnState {
        self.lock().turn
    }

    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    pub fn set_input(&self, text: &str) {
        let text = clamp(text, self.max_input_chars).to_string();
        self.lock().input = text;
    }

    /// Copy suggested question `index` into the input buffer. Nothing is sent.
    pub fn prefill(&self, index: usize) -> Option<String> {
        let question = self.identity.suggestions.get(index)?.clone();
        self.set_input(&question);
        Some(question)
    }

    /// Submit whatever is in the input buffer
    pub async fn send_input(&self) -> TurnOutcome {
        let text = self.input();
        self.submit(&text).await
    }

    /// Completed exchanges, oldest first
    pub fn history_snapshot(&self) -> Vec<HistoryEntry> {
        self.lock().history.all().to_vec()
    }

    /// Every message displayed since the last reset, including error notices
    pub fn messages(&self) -> Vec<Message> {
        self.lock().transcript.clone()
    }

    /// Run one turn. Empty input and submissions while a turn is outstanding
    /// are dropped without any state change. Only the input buffer is length
    /// limited; text passed here is sent whole.
    pub async fn submit(&self, raw: &str) -> TurnOutcome {
        let text = raw.trim().to_string();

        let epoch = {
            let mut conversation = self.lock();
            if text.is_empty() {
                tracing::debug!(domain = %self.identity.domain, "Ignoring empty submission");
                return TurnOutcome::Ignored(IgnoreReason::Empty);
            }
            if conversation.turn == TurnState::Busy {
                tracing::debug!(domain = %self.identity.domain, "Ignoring submission while busy");
                return TurnOutcome::Ignored(IgnoreReason::Busy);
            }

            conversation.turn = TurnState::Busy;
            conversation.input.clear();
            let user = Message::user(&text);
            conversation.transcript.push(user.clone());
            self.emit(TurnEvent::StateChanged(TurnState::Busy));
            self.emit(TurnEvent::Message(user));
            conversation.epoch
        };
        let _guard = TurnGuard {
            engine: self,
            epoch,
        };

        tracing::info!(
            domain = %self.identity.domain,
            chars = text.chars().count(),
            "Turn accepted"
        );

        let result = self.backend.send(&text).await;

        let mut conversation = self.lock();
        if conversation.epoch != epoch {
            tracing::debug!(domain = %self.identity.domain, "Dropping result of a turn that outlived a reset");
            return TurnOutcome::Discarded;
        }

        let outcome = match result {
            Ok(reply) if reply.success => {
                let agent = Message::agent(&reply.message);
                conversation.history.append(HistoryEntry {
                    user: text,
                    agent: reply.message,
                    timestamp: agent.timestamp,
                });
                tracing::debug!(
                    domain = %self.identity.domain,
                    exchanges = conversation.history.len(),
                    "Turn answered"
                );
                TurnOutcome::Answered(agent)
            }
            Ok(reply) => {
                tracing::warn!(
                    domain = %self.identity.domain,
                    reason = %reply.message,
                    "Backend declined the turn"
                );
                TurnOutcome::Failed(Message::agent_error(DECLINED_NOTICE))
            }
            Err(e) => {
                tracing::warn!(domain = %self.identity.domain, error = %e, "Backend call failed");
                TurnOutcome::Failed(Message::agent_error(UNREACHABLE_NOTICE))
            }
        };

        if let Some(message) = outcome.message() {
            conversation.transcript.push(message.clone());
            self.emit(TurnEvent::Message(message.clone()));
        }
        outcome
    }

    /// Discard the conversation and return to Idle, whatever the current state
    pub fn reset(&self) {
        let mut conversation = self.lock();
        let exchanges = conversation.history.len();
        conversation.epoch = conversation.epoch.wrapping_add(1);
        conversation.turn = TurnState::Idle;
        conversation.input.clear();
        conversation.history.clear();
        conversation.transcript.clear();
        self.backend.reset();
        self.emit(TurnEvent::Cleared);
        self.emit(TurnEvent::StateChanged(TurnState::Idle));
        tracing::info!(domain = %self.identity.domain, exchanges, "Conversation reset");
    }
}
