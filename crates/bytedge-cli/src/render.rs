// ABOUTME: Terminal rendering for agents, answers, history, and suggestions
// ABOUTME: Implements the formatter's Markup with colored ANSI styles

use bytedge_core::format::{format_with, Markup};
use bytedge_core::{AgentIdentity, AgentSummary, HistoryEntry, Message};
use colored::Colorize;
use std::io::{self, Write};

/// Markup for a color terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct Terminal;

impl Markup for Terminal {
    fn strong(&self, text: &str) -> String {
        text.bold().to_string()
    }

    fn bullet(&self) -> String {
        format!("  {} ", "•".cyan())
    }

    fn code(&self, text: &str) -> String {
        text.yellow().to_string()
    }

    fn line_break(&self) -> String {
        "\n".to_string()
    }
}

pub fn terminal_text(text: &str) -> String {
    format_with(text, &Terminal)
}

pub fn print_agents(out: &mut impl Write, agents: &[AgentSummary], default: &str) -> io::Result<()> {
    writeln!(out, "{}", format!("Agents ({})", agents.len()).bold())?;
    writeln!(out)?;

    for agent in agents {
        let marker = if agent.domain.as_str() == default {
            " (default)".green().to_string()
        } else {
            String::new()
        };
        writeln!(
            out,
            "{} {} {}{}",
            agent.avatar,
            agent.name.bold(),
            format!("[{}]", agent.domain).dimmed(),
            marker
        )?;
        writeln!(out, "    {}: {}", "Domain".dimmed(), agent.label)?;
        if !agent.tagline.is_empty() {
            writeln!(out, "    {}", agent.tagline)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn print_banner(out: &mut impl Write, identity: &AgentIdentity, backend: &str) -> io::Result<()> {
    writeln!(
        out,
        "{} {} {}",
        identity.avatar,
        identity.name.bold(),
        format!("({backend})").dimmed()
    )?;
    writeln!(out, "{}", identity.label.dimmed())?;
    writeln!(
        out,
        "{}",
        "Type a question, /suggest for ideas, /help for commands.".dimmed()
    )?;
    writeln!(out)
}

pub fn print_typing(out: &mut impl Write, identity: &AgentIdentity) -> io::Result<()> {
    writeln!(out, "{}", format!("{} is typing...", identity.name).dimmed())
}

/// An agent answer or error notice
pub fn print_agent_message(
    out: &mut impl Write,
    identity: &AgentIdentity,
    message: &Message,
) -> io::Result<()> {
    let name = if message.is_error {
        identity.name.red().bold()
    } else {
        identity.name.green().bold()
    };
    writeln!(out, "{} {} {}", identity.avatar, name, message.format_time().dimmed())?;
    writeln!(out, "{}", terminal_text(&message.text))?;
    writeln!(out)
}

pub fn print_history(out: &mut impl Write, entries: &[HistoryEntry]) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "{}", "No completed exchanges yet".dimmed());
    }

    writeln!(out, "{}", format!("History ({})", entries.len()).bold())?;
    for (i, entry) in entries.iter().enumerate() {
        let time = entry.timestamp.format("%I:%M %p").to_string();
        writeln!(
            out,
            "{} {} {}",
            format!("{}.", i + 1).dimmed(),
            entry.user.bold(),
            time.dimmed()
        )?;
        let first_line = entry.agent.lines().next().unwrap_or_default();
        writeln!(out, "   {first_line}")?;
    }
    Ok(())
}

pub fn print_suggestions(out: &mut impl Write, suggestions: &[String]) -> io::Result<()> {
    if suggestions.is_empty() {
        return writeln!(out, "{}", "This agent has no suggested questions".dimmed());
    }

    writeln!(out, "{}", "Suggested questions".bold())?;
    for (i, question) in suggestions.iter().enumerate() {
        writeln!(out, "  {} {}", format!("{}.", i + 1).cyan(), question)?;
    }
    Ok(())
}
