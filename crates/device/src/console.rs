//! Operator commands read from standard input.

use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use holosync_core::{DebugCommand, MarkerEvent};

const COMMAND_BUFFER_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Operator marks the device ready.
    Ready,
    /// Marker tracking changed.
    Marker(MarkerEvent),
    Skip(DebugCommand),
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default().to_ascii_lowercase();
        let argument = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments: {}", line.trim()));
        }

        match (command.as_str(), argument) {
            ("ready", None) => Ok(Self::Ready),
            ("show", Some(marker)) => Ok(Self::Marker(MarkerEvent::found(marker))),
            ("hide", Some(marker)) => Ok(Self::Marker(MarkerEvent::lost(marker))),
            ("f11", None) | ("skip", Some("1")) => Ok(Self::Skip(DebugCommand::SkipOneMinute)),
            ("f12", None) | ("skip", Some("10")) => Ok(Self::Skip(DebugCommand::SkipTenMinutes)),
            ("status", None) => Ok(Self::Status),
            ("quit", None) | ("exit", None) => Ok(Self::Quit),
            ("", _) => Err("empty command".to_string()),
            _ => Err(format!("unknown command: {}", line.trim())),
        }
    }
}

/// Read commands from stdin until it closes.
pub fn spawn_reader() -> (mpsc::Receiver<Command>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
    let handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match line.parse::<Command>() {
                    Ok(command) => {
                        if tx.send(command).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("{} (try: ready, show <marker>, hide <marker>, skip 1|10, status, quit)", e),
                },
                Ok(None) => {
                    debug!("Standard input closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read standard input");
                    break;
                }
            }
        }
    });
    (rx, handle)
}
