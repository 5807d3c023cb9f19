//! Slash-command parsing: `/github <command> [args...]`.
//!
//! The host hands over pre-split argument tokens; this module turns them
//! into a typed command or a usage message. Dispatch is by exact match on
//! the first token; `/` is the pagination-replay token.

use crate::render::help_text;

pub const REPLAY_TOKEN: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    Connect {
        repo_url: String,
    },
    SetToken {
        token: String,
    },
    User {
        username: String,
        page: u32,
    },
    Issue {
        owner: String,
        repo: String,
        number: Option<u64>,
        page: u32,
    },
    Create {
        owner: String,
        repo: String,
    },
    Subscribe {
        events: Vec<String>,
    },
    Disconnect {
        repo_url: String,
    },
    Help,
    Replay {
        page: u32,
    },
    Unknown {
        command: String,
    },
    Invalid {
        message: String,
    },
}

pub fn parse_bridge_command(args: &[String]) -> BridgeCommand {
    let Some(command) = args.first().map(|token| token.as_str()) else {
        return BridgeCommand::Invalid {
            message: help_text(),
        };
    };
    let rest = &args[1..];

    match command {
        "connect" => match rest.first() {
            Some(repo_url) => BridgeCommand::Connect {
                repo_url: repo_url.clone(),
            },
            None => invalid("Usage: `/github connect REPO_URL`"),
        },
        "set-token" => match rest.first().filter(|token| !token.trim().is_empty()) {
            Some(token) => BridgeCommand::SetToken {
                token: token.clone(),
            },
            None => invalid("Usage: `/github set-token ACCESS_TOKEN`"),
        },
        "user" => match rest.first() {
            Some(username) => match parse_optional_page(rest.get(1)) {
                Some(page) => BridgeCommand::User {
                    username: username.clone(),
                    page,
                },
                None => invalid("Usage: `/github user USERNAME [PAGE]`"),
            },
            None => invalid("Usage: `/github user USERNAME [PAGE]`"),
        },
        "issue" => parse_issue_command(rest),
        "create" => match (rest.first(), rest.get(1)) {
            (Some(owner), Some(repo)) => BridgeCommand::Create {
                owner: owner.clone(),
                repo: repo.clone(),
            },
            _ => invalid("Usage: `/github create OWNER REPO`"),
        },
        "subscribe" => {
            if rest.is_empty() {
                invalid("Usage: `/github subscribe EVENT [EVENT...]`")
            } else {
                BridgeCommand::Subscribe {
                    events: rest.to_vec(),
                }
            }
        }
        "disconnect" => match rest.first() {
            Some(repo_url) => BridgeCommand::Disconnect {
                repo_url: repo_url.clone(),
            },
            None => invalid("Usage: `/github disconnect REPO_URL`"),
        },
        "help" => BridgeCommand::Help,
        REPLAY_TOKEN => match rest.first().and_then(|raw| raw.parse::<u32>().ok()) {
            Some(page) if page >= 1 => BridgeCommand::Replay { page },
            _ => invalid("Usage: `/github / PAGE`"),
        },
        other => BridgeCommand::Unknown {
            command: other.to_string(),
        },
    }
}

fn parse_issue_command(rest: &[String]) -> BridgeCommand {
    let (Some(owner), Some(repo)) = (rest.first(), rest.get(1)) else {
        return invalid("Usage: `/github issue OWNER REPO [ISSUE_NO] [PAGE]`");
    };
    let number = match rest.get(2) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(number) => Some(number),
            Err(_) => return invalid("Usage: `/github issue OWNER REPO [ISSUE_NO] [PAGE]`"),
        },
        None => None,
    };
    let Some(page) = parse_optional_page(rest.get(3)) else {
        return invalid("Usage: `/github issue OWNER REPO [ISSUE_NO] [PAGE]`");
    };
    BridgeCommand::Issue {
        owner: owner.clone(),
        repo: repo.clone(),
        number,
        page,
    }
}

fn parse_optional_page(raw: Option<&String>) -> Option<u32> {
    match raw {
        None => Some(1),
        Some(raw) => raw.parse::<u32>().ok().filter(|page| *page >= 1),
    }
}

fn invalid(message: &str) -> BridgeCommand {
    BridgeCommand::Invalid {
        message: message.to_string(),
    }
}
