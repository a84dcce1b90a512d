// ABOUTME: One-shot question against a domain engine
// ABOUTME: Picks the agent by name or by question keywords, then prints terminal text or widget HTML

use anyhow::{bail, Result};
use bytedge_core::{AgentDirectory, Engine, IgnoreReason, TurnOutcome};
use std::io::Write;
use std::sync::Arc;

use crate::render;

/// The named agent, or the one whose keywords best match the question.
pub fn pick_engine<'a>(
    directory: &'a AgentDirectory,
    domain: Option<&str>,
    question: &str,
) -> Result<&'a Arc<Engine>> {
    if domain.is_some() {
        return Ok(directory.route(domain)?);
    }

    let suggested = directory.suggest(question);
    let (best, score) = suggested
        .first()
        .copied()
        .unwrap_or((directory.default_domain(), 0));
    tracing::info!(domain = %best, score, candidates = suggested.len(), "Routed question by keywords");
    Ok(directory.route(Some(best.as_str()))?)
}

/// Ask one question. Returns the outcome so the caller can pick an exit status.
pub async fn run<W: Write>(engine: &Engine, question: &str, html: bool, out: &mut W) -> Result<TurnOutcome> {
    let outcome = engine.submit(question).await;

    let message = match &outcome {
        TurnOutcome::Answered(message) | TurnOutcome::Failed(message) => message,
        TurnOutcome::Ignored(IgnoreReason::Empty) => bail!("Nothing to ask: the question is empty"),
        TurnOutcome::Ignored(IgnoreReason::Busy) | TurnOutcome::Discarded => {
            bail!("The agent did not take the question")
        }
    };

    if html {
        writeln!(out, "{}", message.display)?;
    } else {
        render::print_agent_message(out, engine.identity(), message)?;
    }
    Ok(outcome)
}
