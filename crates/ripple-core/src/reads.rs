use uuid::Uuid;

use ripple_db::Database;
use ripple_types::keys::DepKey;
use ripple_types::models::User;

use crate::error::Result;
use crate::now_ms;

pub fn mark_read(db: &Database, caller: &User, conversation_id: Uuid) -> Result<Vec<DepKey>> {
    mark_read_at(db, caller, conversation_id, now_ms())
}

pub fn mark_read_at(
    db: &Database,
    caller: &User,
    conversation_id: Uuid,
    now_ms: i64,
) -> Result<Vec<DepKey>> {
    db.upsert_read(&caller.id.to_string(), &conversation_id.to_string(), now_ms)?;
    Ok(vec![DepKey::Reads(caller.id, conversation_id)])
}

/// Messages newer than the caller's read marker (everything if never
/// read). Own messages never count as unread.
pub fn unread_count(db: &Database, caller: &User, conversation_id: Uuid) -> Result<i64> {
    let caller_id = caller.id.to_string();
    let conv = conversation_id.to_string();
    let since = db.last_read_ms(&caller_id, &conv)?.unwrap_or(0);
    Ok(db.count_unread(&conv, &caller_id, since)?)
}
