//! Chat relay: room-scoped text fan-out.
//!
//! Chat rides the same delivery fabric as game events but never touches
//! game state or sequence numbers. Membership is checked against the
//! caller-supplied roster; non-members are rejected, they don't get a
//! megaphone into games they aren't in.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use arena_protocol::{ChatMessage, PlayerId, RoomId, ServerEvent};
use arena_registry::ConnectionRegistry;

/// Chat rejections, surfaced to the sender only.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("player {0} is not a member of room {1}")]
    NotMember(PlayerId, RoomId),

    #[error("empty chat message")]
    EmptyMessage,
}

/// Relays chat lines to a room's members.
pub struct ChatRelay {
    registry: Arc<ConnectionRegistry>,
}

impl ChatRelay {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Posts a message from `sender` to every member of the room.
    ///
    /// Delivery is best-effort per recipient; a member with a dead
    /// channel never blocks the others.
    ///
    /// # Errors
    /// - [`ChatError::NotMember`] — sender not in `members`.
    /// - [`ChatError::EmptyMessage`] — nothing left after trimming.
    pub fn post(
        &self,
        room_id: RoomId,
        members: &[PlayerId],
        sender: PlayerId,
        text: &str,
    ) -> Result<ChatMessage, ChatError> {
        if !members.contains(&sender) {
            return Err(ChatError::NotMember(sender, room_id));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let message = ChatMessage {
            room_id,
            sender,
            text: text.to_string(),
            timestamp_ms: unix_millis(),
        };
        let report = self
            .registry
            .broadcast(members, &ServerEvent::ChatMessage(message.clone()));
        if !report.complete() {
            tracing::debug!(
                %room_id,
                unreachable = ?report.unreachable,
                "chat delivery incomplete"
            );
        }
        Ok(message)
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
