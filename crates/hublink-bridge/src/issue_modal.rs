//! Two-step issue-compose modal: write ⇄ preview, submit from preview.
//!
//! The core builds plain view descriptions; the host's ModalPresenter owns
//! the actual rendering surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ISSUE_COMPOSE_VIEW_ID: &str = "issue-compose";
pub const ISSUE_TITLE_BLOCK_ID: &str = "issue-title";
pub const ISSUE_DESCRIPTION_BLOCK_ID: &str = "issue-description";

/// Default description skeleton pre-filled into the write view.
pub const DEFAULT_ISSUE_TEMPLATE: &str = "### Description:\n\n\
### Steps to reproduce:\n\n1. \n2. \n3. \n\n\
### Expected behavior:\n\n\
### Actual behavior:\n\n\
### Additional context:\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueComposeMode {
    Write,
    Preview,
}

impl IssueComposeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Preview => "preview",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModalBlock {
    Input {
        block_id: String,
        label: String,
        placeholder: String,
        initial_value: String,
        multiline: bool,
    },
    Section {
        markdown: String,
    },
    Divider,
}

/// Host-agnostic modal view description. `context` rides along through the
/// host's view state and comes back verbatim on submit, carrying the
/// owner/repo/room binding of the compose flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalView {
    pub id: String,
    pub title: String,
    pub submit_label: String,
    pub close_label: String,
    pub blocks: Vec<ModalBlock>,
    pub context: Value,
}

pub fn build_issue_compose_view(
    mode: IssueComposeMode,
    title: &str,
    description: &str,
    context: Value,
) -> ModalView {
    let mut blocks = Vec::new();
    match mode {
        IssueComposeMode::Write => {
            blocks.push(ModalBlock::Input {
                block_id: ISSUE_TITLE_BLOCK_ID.to_string(),
                label: "Title".to_string(),
                placeholder: "write the title here".to_string(),
                initial_value: title.to_string(),
                multiline: false,
            });
            blocks.push(ModalBlock::Divider);
            blocks.push(ModalBlock::Input {
                block_id: ISSUE_DESCRIPTION_BLOCK_ID.to_string(),
                label: "Description".to_string(),
                placeholder: "Markdown is supported".to_string(),
                initial_value: if description.is_empty() {
                    DEFAULT_ISSUE_TEMPLATE.to_string()
                } else {
                    description.to_string()
                },
                multiline: true,
            });
        }
        IssueComposeMode::Preview => {
            blocks.push(ModalBlock::Section {
                markdown: title.to_string(),
            });
            blocks.push(ModalBlock::Divider);
            blocks.push(ModalBlock::Section {
                markdown: description.to_string(),
            });
        }
    }
    blocks.push(ModalBlock::Divider);

    ModalView {
        id: ISSUE_COMPOSE_VIEW_ID.to_string(),
        title: format!("Create Issue/{}", mode.as_str()),
        submit_label: match mode {
            IssueComposeMode::Write => "Preview".to_string(),
            IssueComposeMode::Preview => "Create".to_string(),
        },
        close_label: "Dismiss".to_string(),
        blocks,
        context,
    }
}
