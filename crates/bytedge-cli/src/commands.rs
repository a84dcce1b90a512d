// ABOUTME: Parses one line typed into the interactive chat
// ABOUTME: Slash commands control the session; anything else is a question

/// Result of parsing a chat line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Show the command list
    Help,
    /// Reset the conversation
    Clear,
    /// Show completed exchanges
    History,
    /// List suggested questions, or prefill the one with this 1-based number
    Suggest(Option<usize>),
    /// Leave the chat
    Quit,
    /// Send whatever is in the input buffer (an empty line)
    SendInput,
    /// Send this text
    Send(String),
    /// A slash command we don't know, or bad arguments
    Invalid(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::SendInput;
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Self::Send(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();

        match (name.as_str(), arg) {
            ("help" | "?", None) => Self::Help,
            ("clear" | "reset", None) => Self::Clear,
            ("history", None) => Self::History,
            ("suggest", None) => Self::Suggest(None),
            ("suggest", Some(n)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Self::Suggest(Some(n)),
                _ => Self::Invalid(format!("not a suggestion number: {n}")),
            },
            ("quit" | "exit" | "q", None) => Self::Quit,
            _ => Self::Invalid(format!("unknown command: {line}")),
        }
    }
}

pub const HELP: &str = "\
Commands:
  /help          Show this list
  /suggest       List suggested questions
  /suggest N     Put suggestion N in the input; press Enter on an empty line to send it
  /history       Show completed exchanges
  /clear         Start a new conversation
  /quit          Leave the chat
Anything else is sent to the agent.";
