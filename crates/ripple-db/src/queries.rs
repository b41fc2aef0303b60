use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

use crate::Database;
use crate::models::{ConversationRow, MessageRow, ReactionRow, TypingRow, UserRow};

impl Database {
    // -- Users --

    /// Returns false when the subject is already taken: a concurrent insert
    /// for the same subject won the race and the caller should re-read.
    pub fn insert_user(
        &self,
        id: &str,
        subject: &str,
        name: &str,
        email: &str,
        avatar_url: &str,
        last_seen_ms: i64,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, subject, name, email, avatar_url, is_online, last_seen_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
                params![id, subject, name, email, avatar_url, last_seen_ms],
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_subject(&self, subject: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(conn, "SELECT id, subject, name, email, avatar_url, is_online, last_seen_ms FROM users WHERE subject = ?1", subject)
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(conn, "SELECT id, subject, name, email, avatar_url, is_online, last_seen_ms FROM users WHERE id = ?1", id)
        })
    }

    pub fn update_user_profile(&self, id: &str, name: &str, email: &str, avatar_url: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET name = ?2, email = ?3, avatar_url = ?4 WHERE id = ?1",
                params![id, name, email, avatar_url],
            )?;
            Ok(())
        })
    }

    pub fn set_presence(&self, id: &str, online: bool, now_ms: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET is_online = ?2, last_seen_ms = ?3 WHERE id = ?1",
                params![id, online, now_ms],
            )?;
            Ok(())
        })
    }

    pub fn list_users_except(&self, id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, subject, name, email, avatar_url, is_online, last_seen_ms
                 FROM users WHERE id != ?1 ORDER BY name",
            )?;
            let rows = stmt
                .query_map([id], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Conversations --

    pub fn find_direct_by_pair_key(&self, pair_key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let id = conn
                .query_row(
                    "SELECT id FROM conversations WHERE pair_key = ?1",
                    [pair_key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(id)
        })
    }

    /// Insert a conversation together with its (immutable) participant set.
    /// Returns false, writing nothing, when the pair_key is already taken:
    /// a concurrent insert for the same pair won the race and the caller
    /// should re-read.
    pub fn insert_conversation(
        &self,
        id: &str,
        is_group: bool,
        group_name: Option<&str>,
        group_image: Option<&str>,
        pair_key: Option<&str>,
        participants: &[String],
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let inserted = tx.execute(
                "INSERT INTO conversations (id, is_group, group_name, group_image, pair_key)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, is_group, group_name, group_image, pair_key],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(false),
                Err(e) => return Err(e.into()),
            }
            for user_id in participants {
                tx.execute(
                    "INSERT INTO conversation_participants (conversation_id, user_id) VALUES (?1, ?2)",
                    params![id, user_id],
                )?;
            }
            tx.commit()?;
            Ok(true)
        })
    }

    pub fn get_conversation(&self, id: &str) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, is_group, group_name, group_image FROM conversations WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(ConversationRow {
                            id: row.get(0)?,
                            is_group: row.get(1)?,
                            group_name: row.get(2)?,
                            group_image: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn participants(&self, conversation_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id FROM conversation_participants
                 WHERE conversation_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([conversation_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn is_participant(&self, conversation_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM conversation_participants
                     WHERE conversation_id = ?1 AND user_id = ?2",
                    params![conversation_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn conversation_ids_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT conversation_id FROM conversation_participants
                 WHERE user_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
        created_at_ms: i64,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, sender_id, content, created_at_ms, deleted)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                params![id, conversation_id, sender_id, content, created_at_ms],
            )?;
            Ok(())
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, conversation_id, sender_id, content, created_at_ms, deleted
                     FROM messages WHERE id = ?1",
                    [id],
                    message_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Insertion order: creation time ascending, rowid as the tiebreak so
    /// same-millisecond messages keep their append order.
    pub fn messages_for_conversation(&self, conversation_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, sender_id, content, created_at_ms, deleted
                 FROM messages WHERE conversation_id = ?1
                 ORDER BY created_at_ms ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map([conversation_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Idempotent: flagging an already-deleted message changes nothing.
    pub fn mark_message_deleted(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE messages SET deleted = 1 WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn last_visible_message(&self, conversation_id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, conversation_id, sender_id, content, created_at_ms, deleted
                     FROM messages WHERE conversation_id = ?1 AND deleted = 0
                     ORDER BY created_at_ms DESC, rowid DESC LIMIT 1",
                    [conversation_id],
                    message_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Messages newer than the read marker, excluding the reader's own.
    pub fn count_unread(&self, conversation_id: &str, user_id: &str, since_ms: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM messages
                 WHERE conversation_id = ?1 AND sender_id != ?2 AND created_at_ms > ?3",
                params![conversation_id, user_id, since_ms],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    // -- Typing --

    pub fn upsert_typing(&self, conversation_id: &str, user_id: &str, now_ms: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO typing (conversation_id, user_id, last_typed_ms) VALUES (?1, ?2, ?3)
                 ON CONFLICT(conversation_id, user_id) DO UPDATE SET last_typed_ms = ?3",
                params![conversation_id, user_id, now_ms],
            )?;
            Ok(())
        })
    }

    pub fn delete_typing(&self, conversation_id: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM typing WHERE conversation_id = ?1 AND user_id = ?2",
                params![conversation_id, user_id],
            )?;
            Ok(())
        })
    }

    /// Freshest first so "pick the first other typist" is deterministic.
    pub fn typing_for_conversation(&self, conversation_id: &str) -> Result<Vec<TypingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT conversation_id, user_id, last_typed_ms FROM typing
                 WHERE conversation_id = ?1 ORDER BY last_typed_ms DESC, user_id",
            )?;
            let rows = stmt
                .query_map([conversation_id], |row| {
                    Ok(TypingRow {
                        conversation_id: row.get(0)?,
                        user_id: row.get(1)?,
                        last_typed_ms: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Reads --

    pub fn upsert_read(&self, user_id: &str, conversation_id: &str, now_ms: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reads (user_id, conversation_id, last_read_ms) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, conversation_id) DO UPDATE SET last_read_ms = ?3",
                params![user_id, conversation_id, now_ms],
            )?;
            Ok(())
        })
    }

    pub fn last_read_ms(&self, user_id: &str, conversation_id: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let ms = conn
                .query_row(
                    "SELECT last_read_ms FROM reads WHERE user_id = ?1 AND conversation_id = ?2",
                    params![user_id, conversation_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(ms)
        })
    }

    // -- Reactions --

    /// Toggle a reaction: removes if present, inserts if absent.
    /// Returns true when the reaction was added.
    pub fn toggle_reaction(
        &self,
        message_id: &str,
        user_id: &str,
        emoji: &str,
        now_ms: i64,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM reactions WHERE message_id = ?1 AND user_id = ?2 AND emoji = ?3",
                params![message_id, user_id, emoji],
            )?;
            if removed > 0 {
                return Ok(false);
            }
            conn.execute(
                "INSERT INTO reactions (message_id, user_id, emoji, created_at_ms)
                 VALUES (?1, ?2, ?3, ?4)",
                params![message_id, user_id, emoji, now_ms],
            )?;
            Ok(true)
        })
    }

    pub fn reactions_for_message(&self, message_id: &str) -> Result<Vec<ReactionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, user_id, emoji, created_at_ms FROM reactions
                 WHERE message_id = ?1 ORDER BY created_at_ms ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map([message_id], reaction_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Most recent reaction across all of a conversation's messages. Feeds
    /// the sidebar preview when a reaction landed after the last message.
    pub fn latest_reaction_in_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ReactionRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT r.message_id, r.user_id, r.emoji, r.created_at_ms
                     FROM reactions r
                     JOIN messages m ON m.id = r.message_id
                     WHERE m.conversation_id = ?1
                     ORDER BY r.created_at_ms DESC, r.rowid DESC LIMIT 1",
                    [conversation_id],
                    reaction_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        subject: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        avatar_url: row.get(4)?,
        is_online: row.get(5)?,
        last_seen_ms: row.get(6)?,
    })
}

fn query_user(conn: &Connection, sql: &str, key: &str) -> Result<Option<UserRow>> {
    let row = conn.query_row(sql, [key], user_from_row).optional()?;
    Ok(row)
}

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        created_at_ms: row.get(4)?,
        deleted: row.get(5)?,
    })
}

fn reaction_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReactionRow> {
    Ok(ReactionRow {
        message_id: row.get(0)?,
        user_id: row.get(1)?,
        emoji: row.get(2)?,
        created_at_ms: row.get(3)?,
    })
}
