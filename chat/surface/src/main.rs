//! Chat Surface - Line-Oriented Terminal Client
//!
//! Reads lines from stdin, submits them through the chat core, and writes
//! replies to stdout as they arrive. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Defaults (socket at ws://localhost:8090)
//! chat-surface
//!
//! # Socket derived from a hosting origin (wss://chat.example.com:8090)
//! chat-surface --origin https://chat.example.com
//!
//! # With config file
//! chat-surface --config ~/.config/duplex-chat/config.toml
//!
//! # Verbose logging
//! RUST_LOG=debug chat-surface
//! ```
//!
//! Type `/help` for local commands.

mod input;
mod render;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chat_core::{
    load_config, ChatConfig, ChatUpdate, ControllerConfig, CredentialStore, FileCredentialStore,
    MemoryCredentialStore, OpenRouterBackend, StreamItem, StreamSocket, Submission,
    SubmissionController, WebSocketClient,
};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use input::{parse_input, Input, HELP};
use render::Renderer;

/// Chat Surface - terminal client for duplex-chat
#[derive(Parser, Debug)]
#[command(name = "chat-surface")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "DUPLEX_CHAT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Hosting origin the socket URL is derived from
    #[arg(short = 'o', long, value_name = "URL")]
    origin: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "DUPLEX_CHAT_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

type Controller = SubmissionController<OpenRouterBackend, WebSocketClient>;

/// What woke the main loop
enum Wake {
    Line(Option<String>),
    Stream(Option<StreamItem>),
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("chat_surface={level},chat_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve configuration: file, then environment, then flags
fn resolve_config(args: &Args) -> Result<ChatConfig> {
    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    config.apply_env();

    if let Some(ref origin) = args.origin {
        config.origin.clone_from(origin);
    }

    Ok(config)
}

fn credential_store(config: &ChatConfig) -> Arc<dyn CredentialStore> {
    match config.credentials_file() {
        Some(path) => {
            info!(path = ?path, "Credential file");
            Arc::new(FileCredentialStore::new(path))
        }
        None => {
            warn!("No config directory; credentials last for this session only");
            Arc::new(MemoryCredentialStore::new())
        }
    }
}

/// Print updates as they arrive
async fn render_updates(mut rx: mpsc::Receiver<ChatUpdate>) {
    let mut renderer = Renderer::new();
    while let Some(update) = rx.recv().await {
        if let Some(status) = Renderer::status(&update) {
            eprintln!("{status}");
        }

        let text = renderer.render(&update);
        if text.is_empty() {
            continue;
        }

        let mut stdout = std::io::stdout().lock();
        if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
            warn!(error = %e, "Failed to write to stdout");
            break;
        }
    }
}

/// Apply one input line; returns false to leave the session
async fn handle_input(controller: &mut Controller, key: &str, input: Input) -> bool {
    match input {
        Input::Submit(text) => {
            let outcome = controller.submit(Some(&text)).await;
            if outcome == Submission::Ignored && controller.is_pending() {
                eprintln!("(still waiting for the previous reply)");
            }
        }
        Input::SetKey(value) => match controller.credentials().set(key, &value) {
            Ok(()) => eprintln!("(credential stored; replies come from the completion API)"),
            Err(e) => warn!(error = %e, "Failed to store credential"),
        },
        Input::ClearKey => match controller.credentials().remove(key) {
            Ok(()) => eprintln!("(credential cleared; replies stream over the socket)"),
            Err(e) => warn!(error = %e, "Failed to clear credential"),
        },
        Input::Reconnect => {
            if controller.socket().is_open() {
                eprintln!("(socket already open)");
            } else if let Err(e) = controller.socket_mut().connect().await {
                warn!(error = %e, "Reconnect failed");
            }
        }
        Input::Help => eprintln!("{HELP}"),
        Input::Quit => return false,
    }

    true
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!("Chat surface starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = resolve_config(&args)?;
    let backend = OpenRouterBackend::from_config(&config).context("Failed to create backend")?;
    let socket_config = config.socket_config().context("Invalid socket origin")?;

    info!(endpoint = %backend.endpoint(), socket = %socket_config.url, "Transports");

    // The socket is optional: without it, only the completion transport works
    let mut socket = WebSocketClient::from_config(&socket_config);
    if let Err(e) = socket.connect().await {
        warn!(error = %e, "Streaming socket unavailable; use /connect to retry");
    }

    let (tx, rx) = mpsc::channel(100);
    let renderer = tokio::spawn(render_updates(rx));

    let credentials = credential_store(&config);
    let mut controller = SubmissionController::new(
        backend,
        socket,
        credentials,
        ControllerConfig::from(&config),
        tx,
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let streaming = controller.is_streaming();
        let wake = tokio::select! {
            line = lines.next_line() => Wake::Line(line.context("Failed to read stdin")?),
            item = controller.recv_stream_item(), if streaming => Wake::Stream(item),
        };

        match wake {
            Wake::Line(None) => {
                debug!("stdin closed");
                break;
            }
            Wake::Line(Some(line)) => {
                if !handle_input(&mut controller, &config.credential_key, parse_input(&line)).await
                {
                    break;
                }
            }
            Wake::Stream(Some(item)) => {
                // Applied outside the select so it always runs to completion
                let event = controller.apply_stream_item(item).await;
                debug!(event = ?event, "Stream event");
            }
            Wake::Stream(None) => {}
        }
    }

    info!("Shutting down...");

    // Dropping the controller closes the update channel and ends the renderer
    drop(controller);
    renderer.await.context("Renderer task failed")?;

    Ok(())
}
