//! Host runtime capability seams.
//!
//! The bridge has no process, storage engine, or chat surface of its own:
//! room resolution, message delivery, and modal rendering are provided by
//! the host and consumed through these trait objects.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::issue_modal::ModalView;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAttachment {
    pub image_url: String,
}

/// A message rendered by the core and delivered by the host. Always sent
/// under the bridge's bot identity; the alias and avatar only decorate it,
/// the human actor is never impersonated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub attachments: Vec<MessageAttachment>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn room_by_id(&self, room_id: &str) -> Result<Option<Room>>;
}

#[async_trait]
pub trait ChatNotifier: Send + Sync {
    /// Posts a message visible to the whole room.
    async fn post_room_message(&self, room: &Room, message: OutboundMessage) -> Result<()>;

    /// Sends a private notice to one user in the context of a room.
    async fn notify_user(
        &self,
        user: &ChatUser,
        room: &Room,
        message: OutboundMessage,
    ) -> Result<()>;
}

#[async_trait]
pub trait ModalPresenter: Send + Sync {
    async fn open_view(&self, user: &ChatUser, trigger_id: &str, view: ModalView) -> Result<()>;
    async fn update_view(&self, view: ModalView) -> Result<()>;
}
