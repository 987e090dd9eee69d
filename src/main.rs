//! Email agent chat - line-oriented client
//!
//! Reads commands from stdin and prints the transcript to stdout. Logs go to
//! stderr as JSON.

use email_agent_chat::{
    Annotation, Author, ClientConfig, ConversationEngine, EmailPayload, HttpTransport,
    LoggingTransport, Message, Notification, SendMessageError,
};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
Type a message to chat, or:
  /email <to> | <subject> | <body>   send an email
  /state                             show the conversation state
  /help                              show this help
  /quit                              exit";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Say(String),
    Email(EmailPayload),
    State,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Command::Say(line.to_string()));
    };

    let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    match name {
        "email" => {
            let mut parts = args.splitn(3, '|').map(str::trim);
            let to = parts.next().unwrap_or_default();
            let subject = parts.next().unwrap_or_default();
            let body = parts.next().unwrap_or_default();
            if to.is_empty() {
                return Err("usage: /email <to> | <subject> | <body>".to_string());
            }
            Ok(Command::Email(EmailPayload::new(to, subject, body)))
        }
        "state" => Ok(Command::State),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command /{other} (try /help)")),
    }
}

/// Wrap each located annotation as `[text](LABEL)`.
fn highlight(text: &str, annotations: &[Annotation]) -> String {
    let mut spans: Vec<_> = annotations
        .iter()
        .filter_map(|a| a.locate(text).map(|range| (range, a.label.as_str())))
        .collect();
    spans.sort_by_key(|(range, _)| range.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, label) in spans {
        // Overlapping spans keep the first
        if range.start < cursor {
            continue;
        }
        out.push_str(text.get(cursor..range.start).unwrap_or_default());
        let _ = write!(out, "[{}]({label})", text.get(range.clone()).unwrap_or_default());
        cursor = range.end;
    }
    out.push_str(text.get(cursor..).unwrap_or_default());
    out
}

fn render(message: &Message) -> String {
    match message.author() {
        Author::Human => format!("you> {}", message.text()),
        Author::Assistant => format!(
            "bot> {}",
            highlight(message.text(), message.content.annotations())
        ),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "email_agent_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ClientConfig::from_env()?;
    let http = HttpTransport::new(&config)?;

    match http.check_health().await {
        Ok(health) if health.is_ok() => {
            tracing::info!(base_url = %http.base_url(), router = ?health.router, "Chat service is up");
        }
        Ok(health) => {
            tracing::warn!(base_url = %http.base_url(), status = %health.status, "Chat service reports unhealthy");
        }
        Err(e) => {
            tracing::warn!(base_url = %http.base_url(), error = %e, "Chat service unreachable, continuing anyway");
        }
    }

    let engine = ConversationEngine::new(LoggingTransport::new(Arc::new(http)));
    tracing::info!(conv_id = %engine.conversation_id(), "Conversation started");

    let mut notifications = engine.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(Notification::MessageAppended { message }) => println!("{}", render(&message)),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Transcript printer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(usage) => {
                eprintln!("{usage}");
                continue;
            }
        };

        match command {
            Command::Say(text) => match engine.send_message(&text).await {
                Ok(()) | Err(SendMessageError::EmptyMessage) => {}
                Err(e) => eprintln!("{e}"),
            },
            Command::Email(payload) => {
                // Failures are already in the transcript
                if let Ok(reply) = engine.send_email(payload).await {
                    tracing::debug!(reply = ?reply, "Email action reply");
                }
            }
            Command::State => println!("{}", serde_json::to_string_pretty(&engine.snapshot())?),
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    drop(engine);
    let _ = printer.await;
    Ok(())
}
