use uuid::Uuid;

use ripple_db::Database;
use ripple_types::keys::DepKey;
use ripple_types::models::{ConversationView, MessagePreview, ReactionPreview, User};

use crate::error::{ChatError, Result};
use crate::{parse_id, user_from_row, DELETED_MARKER};

/// Sorted participant pair, the unique identity of a direct conversation.
/// {A,B} and {B,A} produce the same key.
fn pair_key(a: Uuid, b: Uuid) -> String {
    let (lo, hi) = if a.to_string() <= b.to_string() {
        (a, b)
    } else {
        (b, a)
    };
    format!("{lo}|{hi}")
}

/// Find or create the direct conversation between the caller and
/// `participant_id`. At most one exists per unordered pair; a second
/// request for the same pair returns the existing id.
pub fn get_or_create_direct(
    db: &Database,
    caller: &User,
    participant_id: Uuid,
) -> Result<(Uuid, Vec<DepKey>)> {
    if db.get_user(&participant_id.to_string())?.is_none() {
        return Err(ChatError::NotFound("participant"));
    }

    let key = pair_key(caller.id, participant_id);
    if let Some(existing) = db.find_direct_by_pair_key(&key)? {
        return Ok((parse_id(&existing)?, vec![]));
    }

    let id = Uuid::new_v4();
    let inserted = db.insert_conversation(
        &id.to_string(),
        false,
        None,
        None,
        Some(&key),
        &[caller.id.to_string(), participant_id.to_string()],
    )?;
    if !inserted {
        // Lost a create race: a concurrent request committed this pair
        // between our lookup and insert. Return its id.
        let existing = db
            .find_direct_by_pair_key(&key)?
            .ok_or(ChatError::NotFound("conversation"))?;
        return Ok((parse_id(&existing)?, vec![]));
    }
    tracing::debug!("created direct conversation {id}");
    Ok((id, vec![DepKey::Conversations]))
}

/// Always creates a new group conversation containing the caller plus the
/// given participants.
pub fn create_group(
    db: &Database,
    caller: &User,
    participant_ids: &[Uuid],
    group_name: &str,
) -> Result<(Uuid, Vec<DepKey>)> {
    if group_name.trim().is_empty() {
        return Err(ChatError::InvalidArgument("group name must not be empty"));
    }

    let mut members: Vec<Uuid> = vec![caller.id];
    for &pid in participant_ids {
        if pid != caller.id && !members.contains(&pid) {
            members.push(pid);
        }
    }
    if members.len() < 2 {
        return Err(ChatError::InvalidArgument(
            "group needs at least one other participant",
        ));
    }
    for member in &members {
        if db.get_user(&member.to_string())?.is_none() {
            return Err(ChatError::NotFound("participant"));
        }
    }

    let id = Uuid::new_v4();
    let member_ids: Vec<String> = members.iter().map(Uuid::to_string).collect();
    db.insert_conversation(&id.to_string(), true, Some(group_name), None, None, &member_ids)?;
    tracing::debug!("created group conversation {id} ({} members)", members.len());
    Ok((id, vec![DepKey::Conversations]))
}

/// Every conversation the caller participates in, annotated for the sidebar.
pub fn list_for_user(db: &Database, caller: &User) -> Result<Vec<ConversationView>> {
    let ids = db.conversation_ids_for_user(&caller.id.to_string())?;
    let mut views = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(view) = build_view(db, caller, &id)? {
            views.push(view);
        }
    }
    Ok(views)
}

/// `None` both when the conversation does not exist and when the caller is
/// not a participant, so callers cannot probe for conversations they
/// cannot see.
pub fn get_by_id(db: &Database, caller: &User, id: Uuid) -> Result<Option<ConversationView>> {
    let id = id.to_string();
    if !db.is_participant(&id, &caller.id.to_string())? {
        return Ok(None);
    }
    build_view(db, caller, &id)
}

fn build_view(db: &Database, caller: &User, id: &str) -> Result<Option<ConversationView>> {
    let Some(row) = db.get_conversation(id)? else {
        return Ok(None);
    };
    let participants = db.participants(id)?;

    let other_user = if row.is_group {
        None
    } else {
        let caller_id = caller.id.to_string();
        participants
            .iter()
            .find(|p| **p != caller_id)
            .map(|p| db.get_user(p))
            .transpose()?
            .flatten()
            .map(user_from_row)
            .transpose()?
    };

    let last_message = db
        .last_visible_message(id)?
        .map(|m| -> Result<MessagePreview> {
            let sender_name = db
                .get_user(&m.sender_id)?
                .map(|u| u.name)
                .unwrap_or_default();
            Ok(MessagePreview {
                content: m.content,
                sender_id: parse_id(&m.sender_id)?,
                sender_name,
                created_at_ms: m.created_at_ms,
            })
        })
        .transpose()?;

    // Surface reaction activity only when it is newer than the last message.
    let last_message_at = last_message.as_ref().map(|m| m.created_at_ms).unwrap_or(0);
    let last_reaction = db
        .latest_reaction_in_conversation(id)?
        .filter(|r| r.created_at_ms > last_message_at)
        .map(|r| -> Result<ReactionPreview> {
            let reactor = db
                .get_user(&r.user_id)?
                .map(|u| u.name)
                .unwrap_or_else(|| "Someone".into());
            let target = db
                .get_message(&r.message_id)?
                .map(|m| if m.deleted { DELETED_MARKER.into() } else { m.content })
                .unwrap_or_default();
            Ok(ReactionPreview {
                preview: format!("{reactor} reacted {} to \"{target}\"", r.emoji),
                created_at_ms: r.created_at_ms,
            })
        })
        .transpose()?;

    Ok(Some(ConversationView {
        id: parse_id(id)?,
        is_group: row.is_group,
        group_name: row.group_name,
        group_image: row.group_image,
        member_count: participants.len(),
        other_user,
        last_message,
        last_reaction,
    }))
}
