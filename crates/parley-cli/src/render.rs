//! Terminal rendering of session events.

use std::io::Write;
use std::sync::Arc;

use parley_common::Event;
use parley_engine::{ChatSession, Message, Role};
use tokio::sync::broadcast::error::RecvError;

pub fn print_message(message: &Message) {
    let label = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    let marker = if message.is_error { " [failed]" } else { "" };
    println!("{label}{marker}> {}", message.content);
}

/// Print streamed text as it arrives until the session is dropped.
pub async fn follow(session: Arc<ChatSession>) {
    let mut events = session.subscribe();
    let mut stdout = std::io::stdout();

    loop {
        match events.recv().await {
            Ok(Event::MessageAppended { role, .. }) if role == Role::Assistant.as_str() => {
                let _ = write!(stdout, "assistant> ");
                let _ = stdout.flush();
            }
            Ok(Event::MessagePatched { delta, .. }) => {
                let _ = write!(stdout, "{delta}");
                let _ = stdout.flush();
            }
            Ok(Event::MessageFinalized { id, is_error }) => {
                if is_error {
                    if let Some(message) = session.message(&id) {
                        let _ = write!(stdout, "{} (type /retry to resend)", message.content);
                    }
                }
                let _ = writeln!(stdout);
            }
            Ok(Event::TranscriptReset) => {
                if let Some(greeting) = session.messages().first() {
                    print_message(greeting);
                }
            }
            Ok(Event::StateChanged { state }) => tracing::trace!(%state, "State changed"),
            Ok(_) => {}
            Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "Renderer lagged"),
            Err(RecvError::Closed) => return,
        }
    }
}
