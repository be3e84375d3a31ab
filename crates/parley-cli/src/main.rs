//! parley: terminal client for the Parley chat endpoint.
//!
//! Streams assistant replies into the terminal, keeps the recent transcript
//! on disk between runs, and supports `/new`, `/retry` and `/quit`.

mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use parley_common::ParleyError;
use parley_config::ParleyConfig;
use parley_engine::{ChatSession, HttpTransport, PersistenceGateway, SessionSettings, TurnOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "parley", about = "Chat with the Parley support assistant")]
struct Args {
    /// Config file (defaults to the platform config dir).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, overrides the config level (e.g. `debug`).
    #[arg(long)]
    log_level: Option<String>,

    /// Discard the stored transcript before starting.
    #[arg(long)]
    new_chat: bool,

    /// Fetch a voice conversation token from `voice.token_url` and print it.
    #[arg(long)]
    voice_token: bool,

    /// Send one message, print the reply and exit.
    message: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => parley_config::load_config_from(path),
        None => parley_config::load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("parley: {e}");
            return ExitCode::FAILURE;
        }
    };

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.as_directive().to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("parley_engine={level},parley={level}").into()),
        )
        .init();

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "parley failed");
            eprintln!("parley: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, config: ParleyConfig) -> Result<(), ParleyError> {
    if config.endpoint.api_key.is_empty() {
        tracing::warn!("No API key configured; set PARLEY_API_KEY");
    }

    let transport = HttpTransport::new(&config.endpoint)?;

    if args.voice_token {
        if config.voice.token_url.is_empty() {
            return Err(ParleyError::Voice("voice.token_url is not set".into()));
        }
        let token = transport
            .fetch_voice_token(&config.voice.token_url)
            .await
            .map_err(|e| ParleyError::Voice(e.to_string()))?;
        println!("{token}");
        return Ok(());
    }

    let mut session = ChatSession::new(Arc::new(transport), SessionSettings::from_config(&config));
    if let Some(gateway) = PersistenceGateway::from_config(&config.persistence) {
        if args.new_chat {
            gateway.clear();
        }
        session = session.with_persistence(gateway);
    }
    let session = Arc::new(session);
    tracing::info!(session = %session.id().as_str(), url = %config.endpoint.url, "Session ready");

    if let Some(message) = args.message {
        return match session.send(&message).await? {
            TurnOutcome::Completed { content, .. } => {
                println!("{content}");
                Ok(())
            }
            TurnOutcome::Failed { assistant_id, error, .. } => {
                if let Some(reply) = session.message(&assistant_id) {
                    eprintln!("{}", reply.content);
                }
                Err(ParleyError::Engine(error.to_string()))
            }
            TurnOutcome::Cancelled { .. } => Ok(()),
        };
    }

    let renderer = tokio::spawn(render::follow(Arc::clone(&session)));

    for message in session.messages() {
        render::print_message(&message);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => session.new_chat(),
            "/retry" => {
                let failed = session
                    .messages()
                    .into_iter()
                    .rev()
                    .find(|m| m.is_error)
                    .map(|m| m.id);
                match failed {
                    Some(id) => {
                        session.retry(&id).await?;
                    }
                    None => println!("Nothing to retry."),
                }
            }
            text => {
                session.send(text).await?;
            }
        }
    }

    renderer.abort();
    Ok(())
}
