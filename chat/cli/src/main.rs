//! Ragchat Terminal Client
//!
//! Minimal line-oriented surface over the chat controller. Reads
//! questions from stdin, streams the reply as it arrives, and exposes
//! the session-management operations as slash commands.
//!
//! # Usage
//!
//! ```bash
//! # Point at a backend and chat
//! RAGCHAT_BASE_URL=http://localhost:9380 RAGCHAT_API_KEY=ragflow-xxxx ragchat
//!
//! # Ignore any stored session and start fresh
//! ragchat --fresh
//!
//! # With verbose logging
//! RUST_LOG=debug ragchat
//! ```
//!
//! # Commands
//!
//! - `/reset` - delete the current session and start over
//! - `/sessions` - list stored sessions
//! - `/delete <id>` - delete a specific session
//! - `/quit` - exit
//!
//! # Files
//!
//! - Config: `$XDG_CONFIG_HOME/ragchat/config.toml`
//! - Session id: `$XDG_STATE_HOME/ragchat/session-id`

use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use ragchat_core::{
    load_config, load_config_from_path, ChatController, ChatState, ControllerMessage, FileIdStore,
    NotifyLevel, RagflowBackend, SessionIdStore, SurfaceEvent,
};

/// Terminal client for a retrieval-augmented chat backend
#[derive(Debug, Parser)]
#[command(name = "ragchat", version, about)]
struct Args {
    /// Backend base URL
    #[arg(long, env = "RAGCHAT_BASE_URL")]
    base_url: Option<String>,

    /// API key sent as a bearer token
    #[arg(long, env = "RAGCHAT_API_KEY")]
    api_key: Option<String>,

    /// User identifier attached to created sessions
    #[arg(long, env = "RAGCHAT_USER_ID")]
    user: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ignore any stored session id and start a fresh conversation
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ragchat=warn".parse()?)
                .add_directive("ragchat_core=warn".parse()?),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config_from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => load_config().context("loading config")?,
    };
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(api_key) = args.api_key {
        config.api_key = api_key;
    }
    if args.user.is_some() {
        config.user_id = args.user;
    }

    let backend = RagflowBackend::from_config(&config);
    let store = FileIdStore::new(FileIdStore::default_path("ragchat"));
    if args.fresh {
        store.clear();
    }
    debug!(path = ?store.path(), "session id store");

    let (tx, mut rx) = mpsc::channel(100);
    let mut controller = ChatController::new(backend, store, config, tx);
    controller
        .start()
        .await
        .context("connecting to the chat backend")?;

    let mut renderer = Renderer::default();
    renderer.drain(&mut rx);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match parse_command(line) {
            Some(Command::Quit) => break,
            Some(Command::Noop) => continue,
            Some(Command::Event(event)) => event,
            None => SurfaceEvent::Submit {
                content: line.to_string(),
            },
        };
        controller.handle_event(event).await?;
        renderer.drain(&mut rx);

        // pump the stream until the controller settles back to idle
        while controller.state() != ChatState::Idle || controller.is_streaming() {
            controller.poll_streaming().await;
            renderer.drain(&mut rx);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        renderer.drain(&mut rx);
    }

    println!();
    Ok(())
}

/// A recognized slash command
enum Command {
    Event(SurfaceEvent),
    Quit,
    Noop,
}

fn parse_command(line: &str) -> Option<Command> {
    let rest = line.strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    match parts.next()? {
        "reset" => Some(Command::Event(SurfaceEvent::Reset)),
        "sessions" => Some(Command::Event(SurfaceEvent::ListSessions)),
        "delete" => match parts.next() {
            Some(id) => Some(Command::Event(SurfaceEvent::DeleteSession {
                session_id: id.to_string(),
            })),
            None => {
                println!("usage: /delete <session-id>");
                Some(Command::Noop)
            }
        },
        "quit" | "exit" => Some(Command::Quit),
        other => {
            println!("unknown command: /{other} (try /reset, /sessions, /delete, /quit)");
            Some(Command::Noop)
        }
    }
}

/// Prints controller messages, tracking how much of the cumulative
/// reply has already been written so updates only print the new suffix
#[derive(Default)]
struct Renderer {
    /// Bytes of the in-flight reply already printed
    printed: usize,
    /// Whether the reply prefix has been printed for this turn
    reply_open: bool,
}

impl Renderer {
    fn drain(&mut self, rx: &mut mpsc::Receiver<ControllerMessage>) {
        while let Ok(message) = rx.try_recv() {
            self.render(message);
        }
    }

    fn render(&mut self, message: ControllerMessage) {
        match message {
            ControllerMessage::Message {
                role,
                content,
                citations,
            } => {
                println!("{}> {content}", role_label(role));
                print_citations(&citations);
            }
            ControllerMessage::AnswerUpdate { content, .. } => {
                if !self.reply_open {
                    print!("bot> ");
                    self.reply_open = true;
                    self.printed = 0;
                }
                // cumulative text grows by appending; print the new suffix
                if let Some(fresh) = content.get(self.printed..) {
                    print!("{fresh}");
                    self.printed = content.len();
                }
                let _ = std::io::stdout().flush();
            }
            ControllerMessage::StreamEnd { citations, .. } => {
                if self.reply_open {
                    println!();
                }
                print_citations(&citations);
                self.reply_open = false;
                self.printed = 0;
            }
            ControllerMessage::StreamError { error } => {
                if self.reply_open {
                    println!();
                    self.reply_open = false;
                    self.printed = 0;
                }
                eprintln!("error: {error}");
            }
            ControllerMessage::SessionInfo {
                session_id,
                assistant_name,
                ..
            } => match session_id {
                Some(id) => println!("[{assistant_name} - session {id}]"),
                None => println!("[{assistant_name}]"),
            },
            ControllerMessage::SessionList { sessions } => {
                if sessions.is_empty() {
                    println!("no stored sessions");
                }
                for session in sessions {
                    let created = session
                        .create_time
                        .and_then(format_timestamp)
                        .unwrap_or_else(|| "-".to_string());
                    println!("  {}  {}  {}", session.id, created, session.name);
                }
            }
            ControllerMessage::TranscriptCleared => {
                println!("--- conversation cleared ---");
            }
            ControllerMessage::Notify { level, message } => match level {
                NotifyLevel::Error => eprintln!("error: {message}"),
                NotifyLevel::Warning => eprintln!("warning: {message}"),
                NotifyLevel::Info | NotifyLevel::Success => println!("{message}"),
            },
            ControllerMessage::State { state } => {
                debug!(state = ?state, "controller state");
            }
            ControllerMessage::Quit => {}
        }
    }
}

fn role_label(role: ragchat_core::MessageRole) -> &'static str {
    match role {
        ragchat_core::MessageRole::User => "you",
        ragchat_core::MessageRole::Assistant => "bot",
    }
}

fn print_citations(citations: &[ragchat_core::DocumentRef]) {
    if citations.is_empty() {
        return;
    }
    println!("  sources:");
    for doc in citations {
        println!("  - {} ({})", doc.document_name, doc.document_id);
    }
}

/// Format a unix-millisecond timestamp for display
fn format_timestamp(millis: u64) -> Option<String> {
    let millis = i64::try_from(millis).ok()?;
    let time = chrono::DateTime::from_timestamp_millis(millis)?;
    Some(
        time.with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert!(matches!(
            parse_command("/reset"),
            Some(Command::Event(SurfaceEvent::Reset))
        ));
        assert!(matches!(parse_command("/quit"), Some(Command::Quit)));
        assert!(matches!(
            parse_command("/delete s1"),
            Some(Command::Event(SurfaceEvent::DeleteSession { .. }))
        ));
        assert!(parse_command("plain question").is_none());
    }

    #[test]
    fn test_format_timestamp() {
        let formatted = format_timestamp(1_700_000_000_000).unwrap();
        assert!(formatted.starts_with("2023-11-1"));
    }
}
