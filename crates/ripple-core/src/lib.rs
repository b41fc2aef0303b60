pub mod conversations;
pub mod error;
pub mod identity;
pub mod messages;
pub mod presence;
pub mod reactions;
pub mod reads;
pub mod typing;

use uuid::Uuid;

pub use error::{ChatError, Result};

/// Typing records older than this are treated as absent at read time.
pub const TYPING_TTL_MS: i64 = 2_500;

/// Senders may delete their own message within this window after creation.
pub const DELETE_GRACE_MS: i64 = 5 * 60 * 1_000;

/// What every reader sees in place of a soft-deleted message's content.
pub const DELETED_MARKER: &str = "This message was deleted";

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub(crate) fn parse_id(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| ChatError::Internal(format!("corrupt id {s:?}: {e}")))
}

pub(crate) fn user_from_row(row: ripple_db::models::UserRow) -> Result<ripple_types::models::User> {
    Ok(ripple_types::models::User {
        id: parse_id(&row.id)?,
        subject: row.subject,
        name: row.name,
        email: row.email,
        avatar_url: row.avatar_url,
        is_online: row.is_online,
        last_seen_ms: row.last_seen_ms,
    })
}

pub(crate) fn message_from_row(
    row: ripple_db::models::MessageRow,
) -> Result<ripple_types::models::Message> {
    let content = if row.deleted {
        DELETED_MARKER.to_string()
    } else {
        row.content
    };
    Ok(ripple_types::models::Message {
        id: parse_id(&row.id)?,
        conversation_id: parse_id(&row.conversation_id)?,
        sender_id: parse_id(&row.sender_id)?,
        content,
        created_at_ms: row.created_at_ms,
        deleted: row.deleted,
    })
}
