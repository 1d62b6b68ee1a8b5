//! Internal chat over REST. Rooms and messages are served by custom RPC
//! methods; there is no doctype list view.

use desk_types::Page;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{DeskClient, DeskError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRoom {
    #[serde(default)]
    pub name: String,
    pub room_name: Option<String>,
    pub last_message: Option<String>,
    #[serde(default)]
    pub unread_count: u64,
    pub modified: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub name: String,
    pub sender: Option<String>,
    pub content: Option<String>,
    pub creation: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn require_room(room: &str) -> Result<(), DeskError> {
    if room.trim().is_empty() {
        return Err(DeskError::InvalidArgument("room must not be empty".to_string()));
    }
    Ok(())
}

impl DeskClient {
    pub async fn chat_rooms(&self) -> Result<Vec<ChatRoom>, DeskError> {
        self.rpc_get("chat.get_rooms", &[]).await
    }

    pub async fn chat_messages(
        &self,
        room: &str,
        page: Page,
    ) -> Result<Vec<ChatMessage>, DeskError> {
        require_room(room)?;
        let query = [
            ("room", room.to_string()),
            ("limit_start", page.limit_start().to_string()),
            ("limit_page_length", page.page_size().to_string()),
        ];
        self.rpc_get("chat.get_messages", &query).await
    }

    pub async fn send_chat_message(
        &self,
        room: &str,
        content: &str,
    ) -> Result<ChatMessage, DeskError> {
        require_room(room)?;
        if content.trim().is_empty() {
            return Err(DeskError::InvalidArgument(
                "message must not be empty".to_string(),
            ));
        }
        self.rpc("chat.send_message", json!({ "room": room, "content": content }))
            .await
    }

    pub async fn mark_chat_read(&self, room: &str) -> Result<(), DeskError> {
        require_room(room)?;
        let _: Value = self
            .rpc("chat.mark_as_read", json!({ "room": room }))
            .await?;
        Ok(())
    }
}
