//! Stand-in host adapters for running the bridge outside a chat runtime.
//!
//! Real deployments implement these capabilities against their chat
//! platform; the console variants make the runner observable on its own.

use anyhow::Result;
use async_trait::async_trait;

use hublink_bridge::{ChatNotifier, ChatUser, OutboundMessage, Room, RoomDirectory};

/// Resolves every room id to itself. Hosts with a real directory replace
/// this with an actual lookup.
pub struct PassthroughRoomDirectory;

#[async_trait]
impl RoomDirectory for PassthroughRoomDirectory {
    async fn room_by_id(&self, room_id: &str) -> Result<Option<Room>> {
        Ok(Some(Room {
            id: room_id.to_string(),
            name: room_id.to_string(),
        }))
    }
}

/// Prints outbound traffic as key=value lines.
pub struct ConsoleNotifier;

#[async_trait]
impl ChatNotifier for ConsoleNotifier {
    async fn post_room_message(&self, room: &Room, message: OutboundMessage) -> Result<()> {
        println!(
            "room-message room={} alias={} text={:?}",
            room.id,
            message.alias.as_deref().unwrap_or("-"),
            message.text
        );
        Ok(())
    }

    async fn notify_user(
        &self,
        user: &ChatUser,
        room: &Room,
        message: OutboundMessage,
    ) -> Result<()> {
        println!(
            "user-notice user={} room={} text={:?}",
            user.id, room.id, message.text
        );
        Ok(())
    }
}
