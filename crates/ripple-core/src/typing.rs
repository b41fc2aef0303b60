use uuid::Uuid;

use ripple_db::Database;
use ripple_types::keys::DepKey;
use ripple_types::models::User;

use crate::error::{ChatError, Result};
use crate::{now_ms, TYPING_TTL_MS};

pub fn set_typing(db: &Database, caller: &User, conversation_id: Uuid) -> Result<Vec<DepKey>> {
    set_typing_at(db, caller, conversation_id, now_ms())
}

pub fn set_typing_at(
    db: &Database,
    caller: &User,
    conversation_id: Uuid,
    now_ms: i64,
) -> Result<Vec<DepKey>> {
    let conv = conversation_id.to_string();
    if !db.is_participant(&conv, &caller.id.to_string())? {
        return Err(ChatError::Unauthorized("not a participant"));
    }
    db.upsert_typing(&conv, &caller.id.to_string(), now_ms)?;
    Ok(vec![DepKey::Typing(conversation_id)])
}

pub fn clear_typing(db: &Database, caller: &User, conversation_id: Uuid) -> Result<Vec<DepKey>> {
    db.delete_typing(&conversation_id.to_string(), &caller.id.to_string())?;
    Ok(vec![DepKey::Typing(conversation_id)])
}

pub fn get_typing(db: &Database, caller: &User, conversation_id: Uuid) -> Result<Option<String>> {
    get_typing_at(db, caller, conversation_id, now_ms())
}

/// Display name of some other participant currently typing. The TTL filter
/// lives here, not in callers: a record older than the TTL is absent even
/// if it was never physically removed, so stale typing cannot display
/// forever. The caller's own typing state is never reported.
pub fn get_typing_at(
    db: &Database,
    caller: &User,
    conversation_id: Uuid,
    now_ms: i64,
) -> Result<Option<String>> {
    let caller_id = caller.id.to_string();
    let cutoff = now_ms - TYPING_TTL_MS;

    for row in db.typing_for_conversation(&conversation_id.to_string())? {
        if row.user_id == caller_id || row.last_typed_ms < cutoff {
            continue;
        }
        if let Some(user) = db.get_user(&row.user_id)? {
            return Ok(Some(user.name));
        }
    }
    Ok(None)
}
