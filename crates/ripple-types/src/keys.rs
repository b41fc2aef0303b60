use uuid::Uuid;

/// Dependency keys connecting mutations to live queries.
///
/// Every mutation declares the keys it touched; every live query declares
/// the keys it read. The engine recomputes a subscription whenever the two
/// sets intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepKey {
    /// The conversation directory itself (a conversation was created).
    Conversations,
    /// The message sequence of one conversation.
    Messages(Uuid),
    /// Anything that moves a conversation's sidebar preview: new/deleted
    /// messages and reaction activity on the conversation's messages.
    ConversationPreview(Uuid),
    /// The typing table of one conversation.
    Typing(Uuid),
    /// One user's read marker in one conversation: (user, conversation).
    Reads(Uuid, Uuid),
    /// The reaction rows of one message.
    Reactions(Uuid),
    /// The user table (profile or presence changes).
    Users,
}
