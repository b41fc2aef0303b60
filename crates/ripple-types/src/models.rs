use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Subject id assigned by the external identity provider. Immutable.
    pub subject: String,
    pub name: String,
    pub email: String,
    pub avatar_url: String,
    pub is_online: bool,
    pub last_seen_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub is_group: bool,
    pub group_name: Option<String>,
    pub group_image: Option<String>,
    pub participants: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    /// Replaced by the deletion marker once the message is soft-deleted.
    pub content: String,
    pub created_at_ms: i64,
    pub deleted: bool,
}

/// A conversation annotated for the caller's sidebar: who it is with and
/// what happened in it most recently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationView {
    pub id: Uuid,
    pub is_group: bool,
    pub group_name: Option<String>,
    pub group_image: Option<String>,
    pub member_count: usize,
    /// The one participant who is not the caller. Direct conversations only.
    pub other_user: Option<User>,
    pub last_message: Option<MessagePreview>,
    /// Present only when a reaction landed after the last message.
    pub last_reaction: Option<ReactionPreview>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePreview {
    pub content: String,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionPreview {
    /// Human-readable summary, e.g. `Alice reacted 👍`.
    pub preview: String,
    pub created_at_ms: i64,
}

/// Per-emoji tally for one message. Counts are always derived by grouping
/// the live reaction rows, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionGroup {
    pub emoji: String,
    pub count: usize,
    pub reactor_ids: Vec<Uuid>,
}
