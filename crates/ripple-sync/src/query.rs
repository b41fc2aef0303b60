use std::collections::HashSet;

use ripple_core::{conversations, messages, reactions, reads, typing};
use ripple_core::Result;
use ripple_db::Database;
use ripple_types::keys::DepKey;
use ripple_types::models::User;
use ripple_types::query::{LiveQuery, QueryOutput};

/// Keys a query is known to read before it has ever been evaluated. A
/// subscription declares these at registration time, so a mutation landing
/// between the registration and the first evaluation still stores a wake-up
/// permit instead of slipping through unseen.
pub fn base_deps(caller: &User, query: &LiveQuery) -> HashSet<DepKey> {
    match query {
        LiveQuery::Conversations => HashSet::from([DepKey::Conversations, DepKey::Users]),
        LiveQuery::Conversation { id } => HashSet::from([
            DepKey::Conversations,
            DepKey::Users,
            DepKey::ConversationPreview(*id),
        ]),
        LiveQuery::Messages { conversation_id } => {
            HashSet::from([DepKey::Messages(*conversation_id)])
        }
        LiveQuery::Typing { conversation_id } => {
            HashSet::from([DepKey::Typing(*conversation_id), DepKey::Users])
        }
        LiveQuery::UnreadCount { conversation_id } => HashSet::from([
            DepKey::Messages(*conversation_id),
            DepKey::Reads(caller.id, *conversation_id),
        ]),
        LiveQuery::Reactions { message_id } => HashSet::from([DepKey::Reactions(*message_id)]),
    }
}

/// Run a live query against current state for a fixed caller, returning the
/// result together with the dependency keys the evaluation read.
///
/// The dependency set is the static [`base_deps`] plus whatever the data
/// drags in, recomputed on every evaluation: a `Conversations` subscription
/// that gains a new conversation starts depending on that conversation's
/// preview from the next recompute on.
pub fn snapshot(
    db: &Database,
    caller: &User,
    query: &LiveQuery,
) -> Result<(QueryOutput, HashSet<DepKey>)> {
    let mut deps = base_deps(caller, query);
    let output = match query {
        LiveQuery::Conversations => {
            let views = conversations::list_for_user(db, caller)?;
            for view in &views {
                deps.insert(DepKey::ConversationPreview(view.id));
            }
            QueryOutput::Conversations(views)
        }
        LiveQuery::Conversation { id } => {
            QueryOutput::Conversation(conversations::get_by_id(db, caller, *id)?)
        }
        LiveQuery::Messages { conversation_id } => {
            QueryOutput::Messages(messages::list_by_conversation(db, caller, *conversation_id)?)
        }
        LiveQuery::Typing { conversation_id } => {
            QueryOutput::Typing(typing::get_typing(db, caller, *conversation_id)?)
        }
        LiveQuery::UnreadCount { conversation_id } => {
            QueryOutput::UnreadCount(reads::unread_count(db, caller, *conversation_id)?)
        }
        LiveQuery::Reactions { message_id } => {
            QueryOutput::Reactions(reactions::list_for_message(db, caller, *message_id)?)
        }
    };
    Ok((output, deps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn caller() -> User {
        User {
            id: Uuid::new_v4(),
            subject: "sub".into(),
            name: "tester".into(),
            email: String::new(),
            avatar_url: String::new(),
            is_online: false,
            last_seen_ms: 0,
        }
    }

    #[test]
    fn every_query_declares_keys_before_first_evaluation() {
        let user = caller();
        let conv = Uuid::new_v4();
        let msg = Uuid::new_v4();

        let queries = [
            LiveQuery::Conversations,
            LiveQuery::Conversation { id: conv },
            LiveQuery::Messages { conversation_id: conv },
            LiveQuery::Typing { conversation_id: conv },
            LiveQuery::UnreadCount { conversation_id: conv },
            LiveQuery::Reactions { message_id: msg },
        ];
        for query in &queries {
            assert!(!base_deps(&user, query).is_empty(), "{query:?} declares no keys");
        }

        let unread = base_deps(&user, &LiveQuery::UnreadCount { conversation_id: conv });
        assert!(unread.contains(&DepKey::Messages(conv)));
        assert!(unread.contains(&DepKey::Reads(user.id, conv)));
        assert!(
            base_deps(&user, &LiveQuery::Reactions { message_id: msg })
                .contains(&DepKey::Reactions(msg))
        );
    }
}
