use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            subject         TEXT NOT NULL UNIQUE,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL,
            avatar_url      TEXT NOT NULL,
            is_online       INTEGER NOT NULL DEFAULT 0,
            last_seen_ms    INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS conversations (
            id          TEXT PRIMARY KEY,
            is_group    INTEGER NOT NULL DEFAULT 0,
            group_name  TEXT,
            group_image TEXT,
            -- Sorted 'a|b' participant pair for direct conversations, NULL
            -- for groups. The unique index is what makes pair uniqueness a
            -- conditional insert instead of a scan.
            pair_key    TEXT UNIQUE
        );

        CREATE TABLE IF NOT EXISTS conversation_participants (
            conversation_id TEXT NOT NULL REFERENCES conversations(id),
            user_id         TEXT NOT NULL REFERENCES users(id),
            PRIMARY KEY (conversation_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_participants_user
            ON conversation_participants(user_id);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL REFERENCES conversations(id),
            sender_id       TEXT NOT NULL REFERENCES users(id),
            content         TEXT NOT NULL,
            created_at_ms   INTEGER NOT NULL,
            deleted         INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages(conversation_id, created_at_ms);

        CREATE TABLE IF NOT EXISTS typing (
            conversation_id TEXT NOT NULL REFERENCES conversations(id),
            user_id         TEXT NOT NULL REFERENCES users(id),
            last_typed_ms   INTEGER NOT NULL,
            PRIMARY KEY (conversation_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS reads (
            user_id         TEXT NOT NULL REFERENCES users(id),
            conversation_id TEXT NOT NULL REFERENCES conversations(id),
            last_read_ms    INTEGER NOT NULL,
            PRIMARY KEY (user_id, conversation_id)
        );

        CREATE TABLE IF NOT EXISTS reactions (
            message_id      TEXT NOT NULL REFERENCES messages(id),
            user_id         TEXT NOT NULL REFERENCES users(id),
            emoji           TEXT NOT NULL,
            created_at_ms   INTEGER NOT NULL,
            PRIMARY KEY (message_id, user_id, emoji)
        );

        CREATE INDEX IF NOT EXISTS idx_reactions_message
            ON reactions(message_id);
        ",
    )?;

    info!("database migrations complete");
    Ok(())
}
