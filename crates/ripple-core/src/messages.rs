use uuid::Uuid;

use ripple_db::Database;
use ripple_types::keys::DepKey;
use ripple_types::models::{Message, User};

use crate::error::{ChatError, Result};
use crate::{message_from_row, now_ms, DELETE_GRACE_MS};

pub fn append(
    db: &Database,
    caller: &User,
    conversation_id: Uuid,
    content: &str,
) -> Result<(Uuid, Vec<DepKey>)> {
    append_at(db, caller, conversation_id, content, now_ms())
}

/// Append with an explicit timestamp; `append` passes server time.
pub fn append_at(
    db: &Database,
    caller: &User,
    conversation_id: Uuid,
    content: &str,
    now_ms: i64,
) -> Result<(Uuid, Vec<DepKey>)> {
    if content.is_empty() {
        return Err(ChatError::InvalidArgument("message content must not be empty"));
    }
    let conv = conversation_id.to_string();
    if db.get_conversation(&conv)?.is_none() {
        return Err(ChatError::NotFound("conversation"));
    }
    if !db.is_participant(&conv, &caller.id.to_string())? {
        return Err(ChatError::Unauthorized("not a participant"));
    }

    let id = Uuid::new_v4();
    db.insert_message(&id.to_string(), &conv, &caller.id.to_string(), content, now_ms)?;

    Ok((
        id,
        vec![
            DepKey::Messages(conversation_id),
            DepKey::ConversationPreview(conversation_id),
        ],
    ))
}

/// Strict insertion order. Soft-deleted messages keep their position but
/// every reader, the sender included, sees the deletion marker.
pub fn list_by_conversation(
    db: &Database,
    caller: &User,
    conversation_id: Uuid,
) -> Result<Vec<Message>> {
    let conv = conversation_id.to_string();
    if db.get_conversation(&conv)?.is_none() {
        return Err(ChatError::NotFound("conversation"));
    }
    if !db.is_participant(&conv, &caller.id.to_string())? {
        return Err(ChatError::Unauthorized("not a participant"));
    }

    db.messages_for_conversation(&conv)?
        .into_iter()
        .map(message_from_row)
        .collect()
}

pub fn soft_delete(db: &Database, caller: &User, message_id: Uuid) -> Result<Vec<DepKey>> {
    soft_delete_at(db, caller, message_id, now_ms())
}

/// Only the original sender may delete, and only within the grace window.
/// Deleting an already-deleted message is a no-op, not an error.
pub fn soft_delete_at(
    db: &Database,
    caller: &User,
    message_id: Uuid,
    now_ms: i64,
) -> Result<Vec<DepKey>> {
    let row = db
        .get_message(&message_id.to_string())?
        .ok_or(ChatError::NotFound("message"))?;

    if row.sender_id != caller.id.to_string() {
        return Err(ChatError::Unauthorized("only the sender may delete"));
    }

    let conversation_id = crate::parse_id(&row.conversation_id)?;
    let keys = vec![
        DepKey::Messages(conversation_id),
        DepKey::ConversationPreview(conversation_id),
    ];

    // Already deleted: a no-op regardless of how much time has passed.
    if row.deleted {
        return Ok(keys);
    }
    if now_ms - row.created_at_ms > DELETE_GRACE_MS {
        return Err(ChatError::Unauthorized("delete window elapsed"));
    }

    db.mark_message_deleted(&message_id.to_string())?;
    Ok(keys)
}
