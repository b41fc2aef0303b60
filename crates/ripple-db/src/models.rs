/// Database row types — these map directly to SQLite rows.
/// Distinct from the ripple-types API models to keep the DB layer
/// independent; ids stay as TEXT here and are parsed at the domain layer.

pub struct UserRow {
    pub id: String,
    pub subject: String,
    pub name: String,
    pub email: String,
    pub avatar_url: String,
    pub is_online: bool,
    pub last_seen_ms: i64,
}

pub struct ConversationRow {
    pub id: String,
    pub is_group: bool,
    pub group_name: Option<String>,
    pub group_image: Option<String>,
}

pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at_ms: i64,
    pub deleted: bool,
}

pub struct TypingRow {
    pub conversation_id: String,
    pub user_id: String,
    pub last_typed_ms: i64,
}

pub struct ReactionRow {
    pub message_id: String,
    pub user_id: String,
    pub emoji: String,
    pub created_at_ms: i64,
}
