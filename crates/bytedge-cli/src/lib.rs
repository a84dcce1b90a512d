// ABOUTME: CLI library components for the bytedge command-line shell.
// ABOUTME: Settings overrides, one-shot questions, terminal rendering, and the interactive loop.

//! # bytedge-cli
//!
//! Command-line shell for the bytedge domain agents.
//!
//! ```text
//! bytedge
//! ├── agents                        # List the domain agents
//! ├── ask [-d DOMAIN] QUESTION...   # One turn, print the answer
//! ├── chat [-d DOMAIN]              # Interactive conversation
//! ├── init                          # Write the default config
//! └── version                       # Show version info
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Ask a single question; the agent is picked from its keywords
//! bytedge ask tell me about dual clutch systems
//!
//! # Chat with the tire agent, repeatable fallbacks
//! bytedge --seed 7 chat -d tire
//!
//! # Forward turns to a running chat server
//! BYTEDGE_BACKEND=http BYTEDGE_URL=http://localhost:5000 bytedge chat
//! ```

pub mod ask;
pub mod commands;
pub mod render;
pub mod repl;
pub mod settings;

/// Version of the bytedge CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
