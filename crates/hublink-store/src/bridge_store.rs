//! Domain-level subscription & mapping store for the bridge.
//!
//! Each operation is an independent, atomically-upserted record write/read
//! against the association store; there are no multi-record transactions.
//! Store failures propagate to the caller, which renders a user-visible
//! error.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::association::AssociationTag;
use crate::association_store::AssociationStore;

const ACCESS_TOKEN_KEY: &str = "github-key";
const SUBSCRIBED_EVENTS_KEY: &str = "subs-events-list";
const PREVIOUS_COMMAND_KEY: &str = "command";
const ROOM_SELECTION_KEY: &str = "set-room";
const USER_SELECTION_KEY: &str = "set-user";

fn repo_link_key(repo_slug: &str) -> String {
    format!("repo:{repo_slug}")
}

/// Pagination replay memory: the command plus exactly the arguments needed
/// to repeat it with a new page cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum ReplayCommand {
    User { username: String },
    Issue { owner: String, repo: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RepoRoomLinkRecord {
    repo_slug: String,
    room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessTokenRecord {
    access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SubscribedEventsRecord {
    events: Vec<String>,
}

/// Typed facade over the association store. Exclusively owns record layout;
/// nothing else touches the KV capability directly.
#[derive(Clone)]
pub struct BridgeStore {
    kv: Arc<dyn AssociationStore>,
}

impl BridgeStore {
    pub fn new(kv: Arc<dyn AssociationStore>) -> Self {
        Self { kv }
    }

    /// Connects a repository to a room. Last write wins: re-linking the same
    /// repository to a different room silently repoints the link.
    pub async fn link_repo_to_room(&self, repo_slug: &str, room_id: &str) -> Result<()> {
        self.kv
            .upsert(
                &[
                    AssociationTag::room(room_id),
                    AssociationTag::misc(repo_link_key(repo_slug)),
                ],
                serde_json::to_value(RepoRoomLinkRecord {
                    repo_slug: repo_slug.to_string(),
                    room_id: room_id.to_string(),
                })
                .context("failed to encode repo-room link")?,
            )
            .await
    }

    /// Absent means "not connected", not an error.
    pub async fn room_for_repo(&self, repo_slug: &str) -> Result<Option<String>> {
        let record: Option<RepoRoomLinkRecord> = self
            .read_first(&[AssociationTag::misc(repo_link_key(repo_slug))])
            .await?;
        Ok(record.map(|link| link.room_id))
    }

    /// Explicit unset of a repo↔room link. Returns false when no link existed.
    pub async fn unlink_repo(&self, repo_slug: &str) -> Result<bool> {
        let removed = self
            .kv
            .remove_matching(&[AssociationTag::misc(repo_link_key(repo_slug))])
            .await?;
        Ok(removed > 0)
    }

    pub async fn set_access_token(&self, user_id: &str, access_token: &str) -> Result<()> {
        self.kv
            .upsert(
                &[
                    AssociationTag::user(user_id),
                    AssociationTag::misc(ACCESS_TOKEN_KEY),
                ],
                serde_json::to_value(AccessTokenRecord {
                    access_token: access_token.to_string(),
                })
                .context("failed to encode access token record")?,
            )
            .await
    }

    pub async fn access_token(&self, user_id: &str) -> Result<Option<String>> {
        let record: Option<AccessTokenRecord> = self
            .read_first(&[
                AssociationTag::user(user_id),
                AssociationTag::misc(ACCESS_TOKEN_KEY),
            ])
            .await?;
        Ok(record.map(|token| token.access_token))
    }

    pub async fn clear_access_token(&self, user_id: &str) -> Result<bool> {
        let removed = self
            .kv
            .remove_matching(&[
                AssociationTag::user(user_id),
                AssociationTag::misc(ACCESS_TOKEN_KEY),
            ])
            .await?;
        Ok(removed > 0)
    }

    /// Replaces the subscription list wholesale. An empty list is persisted
    /// as-is and means "no events accepted", same as an absent record.
    pub async fn set_subscribed_events(&self, user_id: &str, events: &[String]) -> Result<()> {
        self.kv
            .upsert(
                &[
                    AssociationTag::user(user_id),
                    AssociationTag::misc(SUBSCRIBED_EVENTS_KEY),
                ],
                serde_json::to_value(SubscribedEventsRecord {
                    events: events.to_vec(),
                })
                .context("failed to encode subscribed events record")?,
            )
            .await
    }

    pub async fn subscribed_events(&self, user_id: &str) -> Result<Option<Vec<String>>> {
        let record: Option<SubscribedEventsRecord> = self
            .read_first(&[
                AssociationTag::user(user_id),
                AssociationTag::misc(SUBSCRIBED_EVENTS_KEY),
            ])
            .await?;
        Ok(record.map(|subs| subs.events))
    }

    pub async fn clear_subscribed_events(&self, user_id: &str) -> Result<bool> {
        let removed = self
            .kv
            .remove_matching(&[
                AssociationTag::user(user_id),
                AssociationTag::misc(SUBSCRIBED_EVENTS_KEY),
            ])
            .await?;
        Ok(removed > 0)
    }

    /// Single replay slot per user, overwritten by every replayable command.
    pub async fn store_last_command(&self, user_id: &str, command: &ReplayCommand) -> Result<()> {
        self.kv
            .upsert(
                &[
                    AssociationTag::user(user_id),
                    AssociationTag::misc(PREVIOUS_COMMAND_KEY),
                ],
                serde_json::to_value(command).context("failed to encode replay command")?,
            )
            .await
    }

    pub async fn last_command(&self, user_id: &str) -> Result<Option<ReplayCommand>> {
        self.read_first(&[
            AssociationTag::user(user_id),
            AssociationTag::misc(PREVIOUS_COMMAND_KEY),
        ])
        .await
    }

    pub async fn clear_last_command(&self, user_id: &str) -> Result<bool> {
        let removed = self
            .kv
            .remove_matching(&[
                AssociationTag::user(user_id),
                AssociationTag::misc(PREVIOUS_COMMAND_KEY),
            ])
            .await?;
        Ok(removed > 0)
    }

    /// Transient modal-flow state: the room a multi-step interaction started in.
    pub async fn set_room_selection(&self, user_id: &str, room: &Value) -> Result<()> {
        self.kv
            .upsert(
                &[
                    AssociationTag::user(user_id),
                    AssociationTag::misc(ROOM_SELECTION_KEY),
                ],
                room.clone(),
            )
            .await
    }

    pub async fn room_selection(&self, user_id: &str) -> Result<Option<Value>> {
        let mut rows = self
            .kv
            .read_matching(&[
                AssociationTag::user(user_id),
                AssociationTag::misc(ROOM_SELECTION_KEY),
            ])
            .await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// The stored webhook subscriber binding. Hosts may manage the binding
    /// through this record; the ingress itself takes the subscriber as
    /// injected configuration.
    pub async fn set_user_selection(&self, user: &Value) -> Result<()> {
        self.kv
            .upsert(&[AssociationTag::misc(USER_SELECTION_KEY)], user.clone())
            .await
    }

    pub async fn user_selection(&self) -> Result<Option<Value>> {
        let mut rows = self
            .kv
            .read_matching(&[AssociationTag::misc(USER_SELECTION_KEY)])
            .await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn read_first<T: DeserializeOwned>(
        &self,
        tags: &[AssociationTag],
    ) -> Result<Option<T>> {
        let mut rows = self.kv.read_matching(tags).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        let raw = rows.swap_remove(0);
        match serde_json::from_value::<T>(raw) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(error) => {
                // A record that no longer decodes is unreadable state, not a
                // transport failure: treat it as absent and leave a trace.
                eprintln!("discarding undecodable bridge record: {error}");
                Ok(None)
            }
        }
    }
}
