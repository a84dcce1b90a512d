// ABOUTME: Entry point for the bytedge command-line shell.
// ABOUTME: Dispatches to agents, ask, chat, init, and version subcommands.

use anyhow::{bail, Context, Result};
use bytedge_cli::settings::Overrides;
use bytedge_cli::{ask, render, repl, VERSION};
use bytedge_core::{AgentDirectory, Config, TurnOutcome};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bytedge")]
#[command(about = "Chat with the bytedge automotive engineering agents")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Path to configuration file (defaults to ~/.config/bytedge/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for fallback answers and simulated latency
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Backend to use: "simulated" (built-in knowledge) or "http" (chat server)
    #[arg(long, global = true, env = "BYTEDGE_BACKEND")]
    backend: Option<String>,

    /// Chat server base URL (http backend)
    #[arg(long, global = true, env = "BYTEDGE_URL")]
    url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the domain agents
    Agents {
        /// Print agents and health as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask one question and print the answer
    Ask {
        /// Agent domain: battery, clutch, frame, or tire (picked from the question when omitted)
        #[arg(short, long)]
        domain: Option<String>,

        /// Print the chat widget's HTML instead of terminal text
        #[arg(long)]
        html: bool,

        /// The question
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },

    /// Start an interactive conversation
    Chat {
        /// Agent domain: battery, clutch, frame, or tire
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Write the default config file
    Init,

    /// Show version information
    Version,
}

impl From<GlobalArgs> for Overrides {
    fn from(args: GlobalArgs) -> Self {
        Self {
            config: args.config,
            seed: args.seed,
            backend: args.backend,
            url: args.url,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // The chat owns the terminal, so its logs go to a file
    match cli.command {
        Commands::Chat { .. } => bytedge_log::init_file("chat"),
        _ => bytedge_log::init(),
    }

    let overrides = Overrides::from(cli.global);

    match cli.command {
        Commands::Agents { json } => run_agents(&overrides, json),
        Commands::Ask {
            domain,
            html,
            question,
        } => run_ask(&overrides, domain.as_deref(), html, &question.join(" ")).await,
        Commands::Chat { domain } => run_chat(&overrides, domain.as_deref()).await,
        Commands::Init => run_init(),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn build_directory(overrides: &Overrides) -> Result<AgentDirectory> {
    let config = overrides.load()?;
    AgentDirectory::from_config(&config).context("Failed to build agents")
}

fn run_agents(overrides: &Overrides, json: bool) -> Result<()> {
    let directory = build_directory(overrides)?;
    let agents = directory.agents();

    if json {
        let report = serde_json::json!({
            "agents": agents,
            "health": directory.health(),
            "default": directory.default_domain(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut out = std::io::stdout();
    render::print_agents(&mut out, &agents, directory.default_domain().as_str())?;
    Ok(())
}

async fn run_ask(overrides: &Overrides, domain: Option<&str>, html: bool, question: &str) -> Result<()> {
    let directory = build_directory(overrides)?;
    let engine = ask::pick_engine(&directory, domain, question)?;

    let mut out = std::io::stdout();
    match ask::run(engine, question, html, &mut out).await? {
        TurnOutcome::Failed(_) => bail!("{} could not answer", engine.identity().name),
        _ => Ok(()),
    }
}

async fn run_chat(overrides: &Overrides, domain: Option<&str>) -> Result<()> {
    let directory = build_directory(overrides)?;
    let engine = directory.route(domain)?.clone();
    tracing::info!(domain = %engine.identity().domain, "Starting chat");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    repl::run(engine, stdin, &mut out).await
}

fn run_init() -> Result<()> {
    let path = Config::init()?;
    println!("Config: {}", path.display());
    Ok(())
}

fn print_version() {
    println!("bytedge {VERSION}");
    println!();
    println!("Component versions:");
    println!("  bytedge-cli:  {VERSION}");
    println!("  bytedge-core: (linked)");
    println!("  bytedge-log:  (linked)");
}
