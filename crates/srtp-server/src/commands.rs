//! Text command parsing and dispatch (`rtp`, `rtp <player>`, `srtp reload`).

use serde::{Deserialize, Serialize};
use srtp_core::{MessageCatalog, RtpRequest};
use srtp_types::{Outcome, Requester, GRANT_RELOAD};
use std::sync::Arc;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::load_config;
use crate::{economy_for, AppState};

pub const RTP_USAGE: &str = "/rtp [player]";
pub const SRTP_USAGE: &str = "/srtp reload";

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `rtp` with an optional target name.
    Rtp { target: Option<String> },
    /// `srtp reload`.
    Reload,
    /// `srtp` with anything other than `reload`.
    SrtpUsage,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),
}

/// Result of running a command, returned to the HTTP caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandReply {
    Rtp { outcome: Outcome },
    Reload { message: String },
    Usage { usage: String },
}

/// Parses one command line. A leading `/` is accepted; labels are
/// case-insensitive; extra arguments are ignored.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let line = line.strip_prefix('/').unwrap_or(line);
    let mut words = line.split_whitespace();
    let label = words.next().ok_or(CommandError::Empty)?;

    if label.eq_ignore_ascii_case("rtp") {
        Ok(Command::Rtp {
            target: words.next().map(str::to_string),
        })
    } else if label.eq_ignore_ascii_case("srtp") {
        match words.next() {
            Some(sub) if sub.eq_ignore_ascii_case("reload") => Ok(Command::Reload),
            _ => Ok(Command::SrtpUsage),
        }
    } else {
        Err(CommandError::Unknown(label.to_string()))
    }
}

/// Runs a parsed command on behalf of `sender`.
///
/// # Errors
///
/// Only a reload whose configuration file cannot be read or parsed fails;
/// gate failures are reported as outcomes.
pub async fn execute(
    state: &AppState,
    sender: Requester,
    command: Command,
) -> Result<CommandReply, ApiError> {
    match command {
        Command::Rtp { target } => {
            let request = match target {
                Some(name) => RtpRequest::other(sender, name),
                None => RtpRequest::own(sender),
            };
            let outcome = state.orchestrator.resolve(request).await;
            Ok(CommandReply::Rtp { outcome })
        }
        Command::Reload => reload(state, sender).await,
        Command::SrtpUsage => Ok(CommandReply::Usage {
            usage: SRTP_USAGE.to_string(),
        }),
    }
}

async fn reload(state: &AppState, sender: Requester) -> Result<CommandReply, ApiError> {
    let allowed = match sender {
        Requester::Console => true,
        Requester::Player(id) => {
            let permissions = Arc::clone(&state.permissions);
            tokio::task::spawn_blocking(move || permissions.has(id, GRANT_RELOAD))
                .await
                .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
        }
    };
    if !allowed {
        return Ok(reply(state, sender, "reload-no-permission"));
    }

    let path = state.config_path.clone();
    let config = tokio::task::spawn_blocking(move || load_config(path.as_deref()))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
        .map_err(|e| {
            tracing::error!(error = %e, "reload failed, keeping previous settings");
            ApiError::InternalServerError(e.to_string())
        })?;

    let economy = economy_for(&config, &state.pool);
    state.orchestrator.reload(config.rtp, economy);
    Ok(reply(state, sender, "reload-success"))
}

fn reply(state: &AppState, to: Requester, key: &str) -> CommandReply {
    let settings = state.orchestrator.settings();
    let notice = MessageCatalog::new(&settings).render(key, &[], to);
    state.notifier.deliver(to, &notice);
    CommandReply::Reload {
        message: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_self_and_named_forms() {
        assert_eq!(parse("rtp"), Ok(Command::Rtp { target: None }));
        assert_eq!(
            parse("/RTP Steve extra"),
            Ok(Command::Rtp {
                target: Some("Steve".to_string())
            })
        );
    }

    #[test]
    fn srtp_requires_reload_subcommand() {
        assert_eq!(parse("srtp reload"), Ok(Command::Reload));
        assert_eq!(parse("/srtp RELOAD"), Ok(Command::Reload));
        assert_eq!(parse("srtp"), Ok(Command::SrtpUsage));
        assert_eq!(parse("srtp version"), Ok(Command::SrtpUsage));
    }

    #[test]
    fn rejects_empty_and_unknown() {
        assert_eq!(parse("   "), Err(CommandError::Empty));
        assert_eq!(parse("/"), Err(CommandError::Empty));
        assert_eq!(
            parse("home"),
            Err(CommandError::Unknown("home".to_string()))
        );
    }

    #[test]
    fn reply_serializes_with_command_tag() {
        let json = serde_json::to_value(CommandReply::Rtp {
            outcome: Outcome::AlreadyUsedOnce,
        })
        .expect("serialize");
        assert_eq!(json["command"], "rtp");
        assert_eq!(json["outcome"]["outcome"], "ALREADY_USED_ONCE");
    }
}
