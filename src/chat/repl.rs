// src/chat/repl.rs

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info};

use super::session::ChatSession;
use crate::{chains, utils};

const HELP: &str = "Commands:
  /connect     connect the configured wallet
  /disconnect  disconnect the wallet
  /address     show the connected account and chain
  /reset       clear the conversation and usage counters
  /usage       show token usage
  /help        show this help
  /quit        exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Connect,
    Disconnect,
    Address,
    Reset,
    Usage,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.split_whitespace().next()? {
            "/connect" => Some(Command::Connect),
            "/disconnect" => Some(Command::Disconnect),
            "/address" => Some(Command::Address),
            "/reset" => Some(Command::Reset),
            "/usage" => Some(Command::Usage),
            "/help" => Some(Command::Help),
            "/quit" | "/exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Line-oriented chat front end. Returns on EOF, `/quit` or an I/O error.
pub async fn run_repl<R, W>(session: &mut ChatSession, reader: R, writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut out = writer;

    out.write_all(b"Type a message, or /help for commands.\n").await?;
    out.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('/') {
            let Some(command) = Command::parse(line) else {
                write_line(&mut out, &format!("Unknown command: {}. Try /help", line)).await?;
                continue;
            };
            if command == Command::Quit {
                break;
            }
            let reply = run_command(session, command).await;
            write_line(&mut out, &reply).await?;
            continue;
        }

        debug!("User: {}", line);
        match session.send_message(line).await {
            Ok(outcome) => {
                for result in outcome.tool_results.iter().filter(|r| r.is_error) {
                    write_line(&mut out, &format!("[tool error] {}", result.content)).await?;
                }
                let reply = outcome.reply.unwrap_or_else(|| "(no reply)".to_string());
                write_line(&mut out, &format!("Assistant: {}", reply)).await?;
            }
            Err(e) => {
                error!("Turn failed: {}", e);
                write_line(&mut out, &format!("Error: {}", e)).await?;
            }
        }
    }

    info!("Chat session ended");
    Ok(())
}

async fn run_command(session: &mut ChatSession, command: Command) -> String {
    let wallet = session.dispatcher().wallet().clone();
    match command {
        Command::Connect => match wallet.connect().await {
            Ok(address) => format!("Connected {}", utils::checksum(&address)),
            Err(e) => format!("Connect failed: {}", e),
        },
        Command::Disconnect => match wallet.disconnect().await {
            Ok(()) => "Disconnected".to_string(),
            Err(e) => format!("Disconnect failed: {}", e),
        },
        Command::Address => match wallet.account().await {
            Some(address) => {
                let chain = match wallet.chain_id().await {
                    Some(id) => chains::chain_by_id(id)
                        .map(|c| format!("{} ({})", c.name, id))
                        .unwrap_or_else(|| id.to_string()),
                    None => "no chain".to_string(),
                };
                format!("{} on {}", utils::checksum(&address), chain)
            }
            None => "No wallet connected".to_string(),
        },
        Command::Reset => {
            session.reset();
            "Conversation cleared".to_string()
        }
        Command::Usage => session.usage().to_string(),
        Command::Help => help_text(),
        Command::Quit => String::new(),
    }
}

fn help_text() -> String {
    let networks: Vec<String> = chains::supported_chains()
        .iter()
        .map(|chain| format!("{} ({})", chain.name, chain.id))
        .collect();
    format!("{}\nNetworks: {}", HELP, networks.join(", "))
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
