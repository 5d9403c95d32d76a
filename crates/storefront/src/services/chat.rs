//! Per-product chat rooms between buyers and the seller.
//!
//! Rooms live in memory only and are created on first use. Each room keeps a
//! bounded history and fans new messages out over a `broadcast` channel;
//! receivers that fall behind lose messages.
//!
//! Callers only open rooms for products that exist. A room with no history
//! and no subscribers is dropped the next time a subscriber arrives, and a
//! deleted product's room is closed outright.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use bazaar_core::{ProductId, SenderRole};

use super::{ServiceError, required_text};

/// Messages buffered per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 256;

/// A chat message as stored and sent to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_role: SenderRole,
    pub content: String,
    /// Milliseconds since the Unix epoch on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// `POST /chat/{productId}/messages` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostMessageRequest {
    pub sender_id: Option<String>,
    pub sender_role: Option<SenderRole>,
    pub content: Option<String>,
}

struct Room {
    history: VecDeque<ChatMessage>,
    sender: broadcast::Sender<ChatMessage>,
}

impl Room {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            history: VecDeque::new(),
            sender,
        }
    }

    fn is_idle(&self) -> bool {
        self.history.is_empty() && self.sender.receiver_count() == 0
    }
}

/// All chat rooms, keyed by product.
pub struct ChatRooms {
    rooms: RwLock<HashMap<ProductId, Room>>,
    history_limit: usize,
}

impl ChatRooms {
    /// Create an empty set of rooms keeping `history_limit` messages each.
    #[must_use]
    pub fn new(history_limit: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            history_limit,
        }
    }

    /// Append a message to a product's room and notify its subscribers.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the content or sender is missing.
    pub async fn publish(
        &self,
        product_id: &ProductId,
        request: PostMessageRequest,
    ) -> Result<ChatMessage, ServiceError> {
        let content = required_text(request.content.as_deref(), "content")?;
        let sender_id = required_text(request.sender_id.as_deref(), "senderId")?;
        let sender_role = request
            .sender_role
            .ok_or_else(|| ServiceError::validation("senderRole is required"))?;

        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            sender_id,
            sender_role,
            content,
            timestamp: Utc::now(),
        };

        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(product_id.clone()).or_insert_with(Room::new);

        room.history.push_back(message.clone());
        while room.history.len() > self.history_limit {
            room.history.pop_front();
        }

        // No subscribers is fine
        let _ = room.sender.send(message.clone());

        tracing::debug!(product_id = %product_id, message_id = %message.id, "Chat message published");
        Ok(message)
    }

    /// Retained messages of a room, oldest first.
    pub async fn history(&self, product_id: &ProductId) -> Vec<ChatMessage> {
        self.rooms
            .read()
            .await
            .get(product_id)
            .map(|room| room.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Receive messages published to a room from now on.
    pub async fn subscribe(&self, product_id: &ProductId) -> broadcast::Receiver<ChatMessage> {
        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, room| !room.is_idle());
        rooms
            .entry(product_id.clone())
            .or_insert_with(Room::new)
            .sender
            .subscribe()
    }

    /// Drop a product's room. Live subscribers see their stream end.
    pub async fn close(&self, product_id: &ProductId) {
        if self.rooms.write().await.remove(product_id).is_some() {
            tracing::debug!(product_id = %product_id, "Chat room closed");
        }
    }

    #[cfg(test)]
    async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for ChatRooms {
    fn default() -> Self {
        Self::new(50)
    }
}
