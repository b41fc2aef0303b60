use std::collections::HashMap;

use uuid::Uuid;

use ripple_db::Database;
use ripple_types::keys::DepKey;
use ripple_types::models::{ReactionGroup, User};

use crate::error::{ChatError, Result};
use crate::{now_ms, parse_id};

pub fn toggle(
    db: &Database,
    caller: &User,
    message_id: Uuid,
    emoji: &str,
) -> Result<(bool, Vec<DepKey>)> {
    toggle_at(db, caller, message_id, emoji, now_ms())
}

/// Insert if absent, delete if present. Two toggles with the same
/// (caller, emoji) net to the original state. Returns whether the
/// reaction was added.
pub fn toggle_at(
    db: &Database,
    caller: &User,
    message_id: Uuid,
    emoji: &str,
    now_ms: i64,
) -> Result<(bool, Vec<DepKey>)> {
    if emoji.is_empty() {
        return Err(ChatError::InvalidArgument("emoji must not be empty"));
    }
    let message = db
        .get_message(&message_id.to_string())?
        .ok_or(ChatError::NotFound("message"))?;
    let conversation_id = parse_id(&message.conversation_id)?;

    let added = db.toggle_reaction(
        &message_id.to_string(),
        &caller.id.to_string(),
        emoji,
        now_ms,
    )?;

    Ok((
        added,
        vec![
            DepKey::Reactions(message_id),
            DepKey::ConversationPreview(conversation_id),
        ],
    ))
}

/// Group the message's live reaction rows by emoji. Counts are distinct
/// reactors; only emojis with at least one reaction appear.
pub fn list_for_message(
    db: &Database,
    _caller: &User,
    message_id: Uuid,
) -> Result<Vec<ReactionGroup>> {
    let rows = db.reactions_for_message(&message_id.to_string())?;

    // Preserve first-reaction order per emoji for stable output.
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<Uuid>> = HashMap::new();
    for row in rows {
        let reactor = parse_id(&row.user_id)?;
        let entry = grouped.entry(row.emoji.clone()).or_insert_with(|| {
            order.push(row.emoji.clone());
            Vec::new()
        });
        if !entry.contains(&reactor) {
            entry.push(reactor);
        }
    }

    Ok(order
        .into_iter()
        .map(|emoji| {
            let reactor_ids = grouped.remove(&emoji).unwrap_or_default();
            ReactionGroup {
                count: reactor_ids.len(),
                emoji,
                reactor_ids,
            }
        })
        .collect())
}
