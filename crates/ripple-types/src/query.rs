use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ConversationView, Message, ReactionGroup};

/// The live queries a client can subscribe to. Each variant is a fully
/// parameterized query struct; there is no ad hoc predicate composition.
/// Evaluation always runs for a fixed, already-resolved caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum LiveQuery {
    Conversations,
    Conversation { id: Uuid },
    Messages { conversation_id: Uuid },
    Typing { conversation_id: Uuid },
    UnreadCount { conversation_id: Uuid },
    Reactions { message_id: Uuid },
}

/// Result of one live query evaluation. `PartialEq` drives the engine's
/// value-level deduplication: a recompute that produces the same value as
/// the last push is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum QueryOutput {
    Conversations(Vec<ConversationView>),
    Conversation(Option<ConversationView>),
    Messages(Vec<Message>),
    Typing(Option<String>),
    UnreadCount(i64),
    Reactions(Vec<ReactionGroup>),
}
