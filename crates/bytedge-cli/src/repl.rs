// ABOUTME: Interactive chat loop over one domain engine
// ABOUTME: Keeps reading lines while a turn is outstanding and shows a typing indicator until it ends

use anyhow::Result;
use bytedge_core::{Engine, IgnoreReason, TurnEvent, TurnOutcome, TurnState};
use colored::Colorize;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast;

use crate::commands::{ChatCommand, HELP};
use crate::render;

type Turn = Pin<Box<dyn Future<Output = TurnOutcome> + Send>>;

/// Run the chat until `/quit` or end of input. End of input waits for the
/// outstanding turn, if any.
pub async fn run<R, W>(engine: Arc<Engine>, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut events = engine.subscribe();
    let mut pending: Option<Turn> = None;
    let mut typing_shown = false;
    let mut input_closed = false;

    render::print_banner(out, engine.identity(), engine.backend_name())?;
    prompt(out)?;

    loop {
        tokio::select! {
            // An answer that is ready wins over the next line
            biased;

            outcome = finish(&mut pending), if pending.is_some() => {
                pending = None;
                // The turn can finish before the Busy event is polled
                if drain(&mut events) && !typing_shown {
                    render::print_typing(out, engine.identity())?;
                }
                typing_shown = false;
                report(outcome, &engine, out)?;
                if input_closed {
                    break;
                }
                prompt(out)?;
            }

            event = events.recv(), if pending.is_some() => {
                if let Ok(TurnEvent::StateChanged(TurnState::Busy)) = event {
                    if !typing_shown {
                        render::print_typing(out, engine.identity())?;
                        out.flush()?;
                        typing_shown = true;
                    }
                }
            }

            line = lines.next_line(), if !input_closed => {
                let Some(line) = line? else {
                    input_closed = true;
                    continue;
                };

                let mut started = false;
                match ChatCommand::parse(&line) {
                    ChatCommand::Help => writeln!(out, "{HELP}")?,
                    ChatCommand::Clear => {
                        engine.reset();
                        drain(&mut events);
                        if pending.take().is_some() {
                            typing_shown = false;
                            report(TurnOutcome::Discarded, &engine, out)?;
                        }
                        writeln!(out, "{}", "Started a new conversation".green())?;
                    }
                    ChatCommand::History => render::print_history(out, &engine.history_snapshot())?,
                    ChatCommand::Suggest(None) => {
                        render::print_suggestions(out, &engine.identity().suggestions)?
                    }
                    ChatCommand::Suggest(Some(n)) => match engine.prefill(n - 1) {
                        Some(question) => writeln!(
                            out,
                            "{} {}\n{}",
                            "Input:".dimmed(),
                            question,
                            "Press Enter to send it.".dimmed()
                        )?,
                        None => writeln!(out, "{}", format!("No suggestion number {n}").yellow())?,
                    },
                    ChatCommand::Quit => break,
                    ChatCommand::SendInput if pending.is_some() => {
                        report(engine.send_input().await, &engine, out)?
                    }
                    ChatCommand::Send(text) if pending.is_some() => {
                        report(engine.submit(&text).await, &engine, out)?
                    }
                    ChatCommand::SendInput => {
                        pending = Some(start(&engine, None));
                        started = true;
                    }
                    ChatCommand::Send(text) => {
                        pending = Some(start(&engine, Some(text)));
                        started = true;
                    }
                    ChatCommand::Invalid(reason) => {
                        writeln!(out, "{} {}", reason.yellow(), "(try /help)".dimmed())?
                    }
                }

                // A new turn prompts again once it has an outcome
                if !started {
                    prompt(out)?;
                }
            }

            else => break,
        }
    }

    writeln!(out)?;
    Ok(())
}

/// Begin a turn with `text`, or with the input buffer when there is none.
fn start(engine: &Arc<Engine>, text: Option<String>) -> Turn {
    let engine = Arc::clone(engine);
    Box::pin(async move {
        match text {
            Some(text) => engine.submit(&text).await,
            None => engine.send_input().await,
        }
    })
}

async fn finish(pending: &mut Option<Turn>) -> TurnOutcome {
    match pending {
        Some(turn) => turn.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Discard queued events. Returns true if a Busy transition was among them.
fn drain(events: &mut broadcast::Receiver<TurnEvent>) -> bool {
    let mut saw_busy = false;
    loop {
        match events.try_recv() {
            Ok(TurnEvent::StateChanged(TurnState::Busy)) => saw_busy = true,
            Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => return saw_busy,
        }
    }
}

fn report<W: Write>(outcome: TurnOutcome, engine: &Engine, out: &mut W) -> Result<()> {
    match outcome {
        TurnOutcome::Answered(message) | TurnOutcome::Failed(message) => {
            render::print_agent_message(out, engine.identity(), &message)?
        }
        TurnOutcome::Ignored(IgnoreReason::Empty) => {}
        TurnOutcome::Ignored(IgnoreReason::Busy) => {
            writeln!(out, "{}", "Still waiting for the last answer".yellow())?
        }
        TurnOutcome::Discarded => {
            writeln!(out, "{}", "The conversation was reset before the answer arrived".dimmed())?
        }
    }
    Ok(())
}

fn prompt<W: Write>(out: &mut W) -> Result<()> {
    write!(out, "{} ", ">".cyan().bold())?;
    out.flush()?;
    Ok(())
}
