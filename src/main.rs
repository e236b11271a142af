// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Hindsight main entry point - inspect microagents and rewind sessions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use hindsight::agent::RecordingAgent;
use hindsight::chat::ChatController;
use hindsight::config::{self, CliOptions, ResolvedConfig};
use hindsight::microagent::{compose_prompt, MicroagentRegistry};
use hindsight::rewind::{rewind_candidates, RewindCoordinator};
use hindsight::session::{Session, SessionService};
use hindsight::telemetry::{init_telemetry, TelemetryConfig};
use hindsight::{ActiveSession, VERSION};

/// Width of message previews in listings.
const PREVIEW_CHARS: usize = 72;

/// Hindsight - microagent context and session rewind.
#[derive(Parser)]
#[command(name = "hindsight")]
#[command(author, version, about = "Microagent context injection and session rewind", long_about = None)]
struct Cli {
    /// Project directory (defaults to the nearest directory with hindsight config)
    #[arg(short = 'C', long, env = "HINDSIGHT_PROJECT")]
    project: Option<PathBuf>,

    /// Session database path
    #[arg(long, env = "HINDSIGHT_DB")]
    db: Option<PathBuf>,

    /// Bound on each rewind store call in milliseconds (0 = unbounded)
    #[arg(long)]
    rewind_timeout_ms: Option<u64>,

    /// Do not append triggered microagents to prompts
    #[arg(long)]
    no_microagents: bool,

    /// Output format for listings
    #[arg(short = 'f', long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    /// Show debug output
    #[arg(long)]
    debug: bool,

    /// Show trace output
    #[arg(long)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Subcommands for hindsight.
#[derive(Subcommand)]
enum Commands {
    /// List the project's microagents and their triggers
    Microagents,

    /// Show which microagents a prompt triggers
    Match {
        /// Prompt text to test
        prompt: String,
        /// Print the prompt with the matched microagents appended
        #[arg(long)]
        compose: bool,
    },

    /// Record a user message in a session (starting a new one if none is given)
    Send {
        /// Message text
        text: String,
        /// Session to append to
        #[arg(short, long)]
        session: Option<String>,
    },

    /// List saved sessions
    Sessions,

    /// Show the messages of a session
    History {
        /// Session ID
        session: String,
    },

    /// Rewind a session to one of its user messages
    Rewind {
        /// Session ID
        session: String,
        /// Message to rewind to; lists the candidates when omitted
        message: Option<String>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir()?;
    let project_root = match cli.project.clone() {
        Some(path) => path,
        None => config::find_workspace_root(&cwd).unwrap_or(cwd),
    };

    let cli_options = CliOptions {
        sessions_db: cli.db.clone(),
        rewind_timeout_ms: cli.rewind_timeout_ms,
        no_microagents: cli.no_microagents,
    };
    let config = config::load_config(&project_root, cli_options)?;

    let telemetry = TelemetryConfig::from_flags(cli.debug, cli.trace, config.log_level.as_deref());
    let _guard = init_telemetry(&telemetry)?;

    tracing::debug!(project = %project_root.display(), ?config, "configuration resolved");

    let app = App {
        project_root,
        config,
        format: cli.format,
    };
    app.run(cli.command).await
}

struct App {
    project_root: PathBuf,
    config: ResolvedConfig,
    format: OutputFormat,
}

impl App {
    async fn run(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Microagents => self.list_microagents(),
            Commands::Match { prompt, compose } => self.match_prompt(&prompt, compose),
            Commands::Send { text, session } => self.send(&text, session.as_deref()).await,
            Commands::Sessions => self.list_sessions().await,
            Commands::History { session } => self.history(&session).await,
            Commands::Rewind { session, message } => match message {
                Some(message) => self.rewind(&session, &message).await,
                None => self.list_candidates(&session).await,
            },
            Commands::Version => {
                println!("hindsight {}", VERSION);
                Ok(())
            }
        }
    }

    fn registry(&self) -> anyhow::Result<MicroagentRegistry> {
        MicroagentRegistry::load(&self.project_root).context("Failed to load microagents")
    }

    fn sessions(&self) -> anyhow::Result<SessionService> {
        let path = match &self.config.sessions_db {
            Some(path) => path.clone(),
            None => config::default_sessions_db_path()
                .context("Could not determine home directory for the session database")?,
        };
        open_sessions(&path)
    }

    fn list_microagents(&self) -> anyhow::Result<()> {
        let registry = self.registry()?;

        if let OutputFormat::Json = self.format {
            let agents: Vec<_> = registry
                .iter()
                .map(|a| {
                    serde_json::json!({
                        "name": a.name(),
                        "description": a.frontmatter.description,
                        "triggers": a.triggers().to_string(),
                        "source": a.source_path.display().to_string(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&agents)?);
            return Ok(());
        }

        if registry.is_empty() {
            let dir = registry.root().unwrap_or(&self.project_root);
            println!("{}", format!("No microagents in {}", dir.display()).dimmed());
            return Ok(());
        }

        for agent in registry.iter() {
            let triggers = agent.triggers();
            let trigger_text = if triggers.is_never() {
                "never".yellow().to_string()
            } else {
                triggers.to_string().cyan().to_string()
            };
            println!("{} {}", agent.name().bright_white().bold(), trigger_text);
            if let Some(description) = &agent.frontmatter.description {
                println!("  {}", description);
            }
            println!("  {}", agent.source_path.display().to_string().dimmed());
        }
        Ok(())
    }

    fn match_prompt(&self, prompt: &str, compose: bool) -> anyhow::Result<()> {
        let registry = self.registry()?;
        let matched = registry.find(prompt);

        if compose {
            println!("{}", compose_prompt(prompt, &matched));
            return Ok(());
        }

        match self.format {
            OutputFormat::Json => {
                let names: Vec<String> = matched.iter().map(|a| a.name()).collect();
                println!("{}", serde_json::to_string_pretty(&names)?);
            }
            OutputFormat::Text if matched.is_empty() => {
                println!("{}", "No microagents triggered".dimmed());
            }
            OutputFormat::Text => {
                for agent in matched {
                    println!("{} {}", "✓".green(), agent.name().bright_white());
                }
            }
        }
        Ok(())
    }

    async fn send(&self, text: &str, session_id: Option<&str>) -> anyhow::Result<()> {
        let sessions = self.sessions()?;
        let registry = Arc::new(self.registry()?);
        let agent = Arc::new(RecordingAgent::new(sessions.clone()));
        let chat = ChatController::new(
            sessions,
            agent,
            registry,
            &self.config,
            self.project_root.display().to_string(),
        );

        if let Some(id) = session_id {
            chat.open_session(id).await?;
        }
        let session = chat.send_message(text, Vec::new()).await?;

        println!(
            "{} {} ({} msgs)",
            "→".cyan(),
            session.id.bright_white(),
            session.stats.message_count
        );
        Ok(())
    }

    async fn list_sessions(&self) -> anyhow::Result<()> {
        let sessions = self.sessions()?.list().await?;

        if let OutputFormat::Json = self.format {
            println!("{}", serde_json::to_string_pretty(&sessions)?);
            return Ok(());
        }

        if sessions.is_empty() {
            println!("{}", "No saved sessions".dimmed());
        }
        for session in &sessions {
            println!("{}  {}", session.id.bright_white(), session.format());
        }
        Ok(())
    }

    async fn history(&self, session_id: &str) -> anyhow::Result<()> {
        let service = self.sessions()?;
        let session = require_session(&service, session_id).await?;
        let messages = service.messages(session_id).await?;

        if let OutputFormat::Json = self.format {
            println!("{}", serde_json::to_string_pretty(&messages)?);
            return Ok(());
        }

        println!("{}", session.format().bright_blue().bold());
        for message in &messages {
            println!(
                "{:>9}  {}  {}",
                message.role.to_string().cyan(),
                message.id.dimmed(),
                message.preview(PREVIEW_CHARS)
            );
        }
        Ok(())
    }

    async fn list_candidates(&self, session_id: &str) -> anyhow::Result<()> {
        let service = self.sessions()?;
        require_session(&service, session_id).await?;
        let messages = service.messages(session_id).await?;
        let candidates = rewind_candidates(&messages);

        if let OutputFormat::Json = self.format {
            println!("{}", serde_json::to_string_pretty(&candidates)?);
            return Ok(());
        }

        if candidates.is_empty() {
            println!("{}", "No user messages to rewind to".dimmed());
            return Ok(());
        }
        println!("{}", "Rewind to one of:".bright_blue().bold());
        for message in candidates {
            println!("  {}  {}", message.id.bright_white(), message.preview(PREVIEW_CHARS));
        }
        Ok(())
    }

    async fn rewind(&self, session_id: &str, message_id: &str) -> anyhow::Result<()> {
        let service = Arc::new(self.sessions()?);
        let coordinator = RewindCoordinator::new(service.clone(), service)
            .with_timeout(self.config.rewind_timeout());

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        let active = ActiveSession::new();
        match coordinator
            .rewind_to(session_id, message_id, &cancel, &active)
            .await
        {
            Ok(session) => {
                println!(
                    "{} Rewound {} to {} message(s)",
                    "✓".green(),
                    session.id.bright_white(),
                    session.stats.message_count
                );
                Ok(())
            }
            Err(e) => {
                if e.history_truncated() {
                    eprintln!(
                        "{}",
                        "Messages were deleted but the session could not be reloaded".yellow()
                    );
                }
                Err(e.into())
            }
        }
    }
}

fn open_sessions(path: &Path) -> anyhow::Result<SessionService> {
    SessionService::open(path)
        .with_context(|| format!("Failed to open session database {}", path.display()))
}

async fn require_session(service: &SessionService, session_id: &str) -> anyhow::Result<Session> {
    service
        .get(session_id)
        .await?
        .with_context(|| format!("Session not found: {}", session_id))
}
