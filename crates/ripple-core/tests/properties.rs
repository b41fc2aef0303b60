use std::sync::{Arc, Barrier};
use std::thread;

use ripple_core::identity::IdentityClaims;
use ripple_core::{
    ChatError, DELETE_GRACE_MS, DELETED_MARKER, conversations, identity, messages, now_ms,
    reactions, reads, typing,
};
use ripple_db::Database;
use ripple_types::models::User;

fn fresh_db() -> Database {
    Database::open_in_memory().unwrap()
}

fn user(db: &Database, name: &str) -> User {
    let claims = IdentityClaims {
        sub: format!("sub-{name}"),
        name: name.to_string(),
        email: format!("{name}@example.com"),
        picture: String::new(),
        exp: 0,
    };
    identity::resolve(db, &claims).unwrap().0
}

#[test]
fn resolve_is_idempotent_per_subject() {
    let db = fresh_db();
    let first = user(&db, "alice");
    let second = user(&db, "alice");
    assert_eq!(first.id, second.id);
    assert_eq!(db.list_users_except("nobody").unwrap().len(), 1);
}

#[test]
fn resolve_syncs_profile_claims() {
    let db = fresh_db();
    let original = user(&db, "alice");

    let renamed = IdentityClaims {
        sub: "sub-alice".to_string(),
        name: "Alice Cooper".to_string(),
        email: "alice@example.com".to_string(),
        picture: "https://cdn.example.com/alice.png".to_string(),
        exp: 0,
    };
    let (updated, keys) = identity::resolve(&db, &renamed).unwrap();
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.name, "Alice Cooper");
    assert!(!keys.is_empty());
}

#[test]
fn direct_conversation_is_unique_per_unordered_pair() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");

    let (first, _) = conversations::get_or_create_direct(&db, &a, b.id).unwrap();
    let (second, _) = conversations::get_or_create_direct(&db, &b, a.id).unwrap();
    assert_eq!(first, second);
}

#[test]
fn group_is_distinct_from_existing_direct() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");
    let c = user(&db, "carol");

    let (direct, _) = conversations::get_or_create_direct(&db, &a, b.id).unwrap();
    let (group, _) = conversations::create_group(&db, &a, &[b.id, c.id], "Trio").unwrap();
    assert_ne!(direct, group);

    let view = conversations::get_by_id(&db, &a, group).unwrap().unwrap();
    assert!(view.is_group);
    assert_eq!(view.group_name.as_deref(), Some("Trio"));
    assert_eq!(view.member_count, 3);
}

#[test]
fn group_requires_name_and_other_participants() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");

    assert!(matches!(
        conversations::create_group(&db, &a, &[b.id], "  "),
        Err(ChatError::InvalidArgument(_))
    ));
    assert!(matches!(
        conversations::create_group(&db, &a, &[], "Just me"),
        Err(ChatError::InvalidArgument(_))
    ));
    // The caller alone does not make a group either.
    assert!(matches!(
        conversations::create_group(&db, &a, &[a.id], "Echo chamber"),
        Err(ChatError::InvalidArgument(_))
    ));
}

#[test]
fn non_participants_cannot_see_or_post() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");
    let outsider = user(&db, "mallory");

    let (conv, _) = conversations::get_or_create_direct(&db, &a, b.id).unwrap();

    // getById answers None, never an error, so existence cannot be probed.
    assert!(conversations::get_by_id(&db, &outsider, conv).unwrap().is_none());

    assert!(matches!(
        messages::append(&db, &outsider, conv, "let me in"),
        Err(ChatError::Unauthorized(_))
    ));
    assert!(matches!(
        messages::list_by_conversation(&db, &outsider, conv),
        Err(ChatError::Unauthorized(_))
    ));
}

#[test]
fn first_message_scenario() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");

    let (conv, _) = conversations::get_or_create_direct(&db, &a, b.id).unwrap();
    messages::append(&db, &a, conv, "hi").unwrap();

    let list = messages::list_by_conversation(&db, &b, conv).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].content, "hi");
    assert_eq!(list[0].sender_id, a.id);

    assert_eq!(reads::unread_count(&db, &b, conv).unwrap(), 1);
    assert_eq!(reads::unread_count(&db, &a, conv).unwrap(), 0);
}

#[test]
fn unread_count_tracks_read_marker() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");
    let (conv, _) = conversations::get_or_create_direct(&db, &a, b.id).unwrap();

    let t = now_ms();
    messages::append_at(&db, &a, conv, "one", t).unwrap();
    messages::append_at(&db, &a, conv, "two", t + 10).unwrap();
    assert_eq!(reads::unread_count(&db, &b, conv).unwrap(), 2);

    reads::mark_read_at(&db, &b, conv, t + 20).unwrap();
    assert_eq!(reads::unread_count(&db, &b, conv).unwrap(), 0);

    messages::append_at(&db, &a, conv, "three", t + 30).unwrap();
    assert_eq!(reads::unread_count(&db, &b, conv).unwrap(), 1);

    // b's own reply never counts against b.
    messages::append_at(&db, &b, conv, "reply", t + 40).unwrap();
    assert_eq!(reads::unread_count(&db, &b, conv).unwrap(), 1);
}

#[test]
fn soft_delete_keeps_position_and_masks_content() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");
    let (conv, _) = conversations::get_or_create_direct(&db, &a, b.id).unwrap();

    let t = now_ms();
    messages::append_at(&db, &a, conv, "first", t).unwrap();
    let (target, _) = messages::append_at(&db, &a, conv, "second", t + 10).unwrap();
    messages::append_at(&db, &a, conv, "third", t + 20).unwrap();

    messages::soft_delete(&db, &a, target).unwrap();

    // Every caller, the sender included, sees the marker in place.
    for caller in [&a, &b] {
        let list = messages::list_by_conversation(&db, caller, conv).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[1].id, target);
        assert_eq!(list[1].content, DELETED_MARKER);
        assert!(list[1].deleted);
        assert_eq!(list[0].content, "first");
        assert_eq!(list[2].content, "third");
    }

    // Re-deleting is a no-op, not an error.
    messages::soft_delete(&db, &a, target).unwrap();
}

#[test]
fn soft_delete_is_sender_only_and_window_bound() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");
    let (conv, _) = conversations::get_or_create_direct(&db, &a, b.id).unwrap();

    let t = now_ms();
    let (id, _) = messages::append_at(&db, &a, conv, "oops", t).unwrap();

    assert!(matches!(
        messages::soft_delete(&db, &b, id),
        Err(ChatError::Unauthorized(_))
    ));
    assert!(matches!(
        messages::soft_delete_at(&db, &a, id, t + DELETE_GRACE_MS + 1),
        Err(ChatError::Unauthorized(_))
    ));
    assert!(matches!(
        messages::soft_delete(&db, &a, uuid::Uuid::new_v4()),
        Err(ChatError::NotFound(_))
    ));

    // Inside the window it goes through.
    messages::soft_delete_at(&db, &a, id, t + DELETE_GRACE_MS - 1).unwrap();
}

#[test]
fn reaction_double_toggle_restores_state() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");
    let (conv, _) = conversations::get_or_create_direct(&db, &a, b.id).unwrap();
    let (msg, _) = messages::append(&db, &a, conv, "hello").unwrap();

    let before = reactions::list_for_message(&db, &a, msg).unwrap();
    let (added, _) = reactions::toggle(&db, &b, msg, "🎉").unwrap();
    assert!(added);
    let (added, _) = reactions::toggle(&db, &b, msg, "🎉").unwrap();
    assert!(!added);
    assert_eq!(reactions::list_for_message(&db, &a, msg).unwrap(), before);
}

#[test]
fn reactions_group_by_emoji_with_reactor_sets() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");
    let (conv, _) = conversations::get_or_create_direct(&db, &a, b.id).unwrap();
    let (msg, _) = messages::append(&db, &a, conv, "hello").unwrap();

    reactions::toggle(&db, &a, msg, "👍").unwrap();
    reactions::toggle(&db, &b, msg, "👍").unwrap();

    let groups = reactions::list_for_message(&db, &a, msg).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].emoji, "👍");
    assert_eq!(groups[0].count, 2);
    assert!(groups[0].reactor_ids.contains(&a.id));
    assert!(groups[0].reactor_ids.contains(&b.id));

    // a toggles off: count drops to 1 and only b remains.
    reactions::toggle(&db, &a, msg, "👍").unwrap();
    let groups = reactions::list_for_message(&db, &a, msg).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].count, 1);
    assert_eq!(groups[0].reactor_ids, vec![b.id]);
}

#[test]
fn reaction_on_missing_message_is_not_found() {
    let db = fresh_db();
    let a = user(&db, "alice");
    assert!(matches!(
        reactions::toggle(&db, &a, uuid::Uuid::new_v4(), "👍"),
        Err(ChatError::NotFound(_))
    ));
}

#[test]
fn typing_expires_after_ttl() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");
    let (conv, _) = conversations::get_or_create_direct(&db, &a, b.id).unwrap();

    let t = now_ms();
    typing::set_typing_at(&db, &a, conv, t).unwrap();

    // Fresh: visible to the other participant, never to the typist.
    assert_eq!(
        typing::get_typing_at(&db, &b, conv, t + 100).unwrap(),
        Some("alice".to_string())
    );
    assert_eq!(typing::get_typing_at(&db, &a, conv, t + 100).unwrap(), None);

    // Past the TTL the record is treated as absent even though it was
    // never physically removed.
    assert_eq!(typing::get_typing_at(&db, &b, conv, t + 2_600).unwrap(), None);

    // Re-typing re-arms it; clearing removes it immediately.
    typing::set_typing_at(&db, &a, conv, t + 3_000).unwrap();
    assert!(typing::get_typing_at(&db, &b, conv, t + 3_100).unwrap().is_some());
    typing::clear_typing(&db, &a, conv).unwrap();
    assert_eq!(typing::get_typing_at(&db, &b, conv, t + 3_100).unwrap(), None);
}

#[test]
fn sidebar_view_tracks_last_message_and_reactions() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");
    let (conv, _) = conversations::get_or_create_direct(&db, &a, b.id).unwrap();

    let empty = conversations::get_by_id(&db, &a, conv).unwrap().unwrap();
    assert!(empty.last_message.is_none());
    assert_eq!(empty.other_user.as_ref().unwrap().id, b.id);

    let t = now_ms();
    let (first, _) = messages::append_at(&db, &a, conv, "hi", t).unwrap();
    let view = conversations::get_by_id(&db, &b, conv).unwrap().unwrap();
    let preview = view.last_message.unwrap();
    assert_eq!(preview.content, "hi");
    assert_eq!(preview.sender_name, "alice");

    // A reaction after the last message surfaces as the preview event.
    reactions::toggle_at(&db, &b, first, "👍", t + 50).unwrap();
    let view = conversations::get_by_id(&db, &a, conv).unwrap().unwrap();
    let reaction = view.last_reaction.unwrap();
    assert!(reaction.preview.contains("bob"));
    assert!(reaction.preview.contains("👍"));

    // A newer message supersedes the reaction event.
    messages::append_at(&db, &b, conv, "hey", t + 100).unwrap();
    let view = conversations::get_by_id(&db, &a, conv).unwrap().unwrap();
    assert!(view.last_reaction.is_none());
    assert_eq!(view.last_message.unwrap().content, "hey");

    // A soft-deleted last message falls back to the previous one.
    let (last, _) = messages::append_at(&db, &a, conv, "typo", t + 200).unwrap();
    messages::soft_delete(&db, &a, last).unwrap();
    let view = conversations::get_by_id(&db, &a, conv).unwrap().unwrap();
    assert_eq!(view.last_message.unwrap().content, "hey");
}

#[test]
fn list_for_user_returns_only_own_conversations() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");
    let c = user(&db, "carol");

    conversations::get_or_create_direct(&db, &a, b.id).unwrap();
    conversations::get_or_create_direct(&db, &b, c.id).unwrap();
    conversations::create_group(&db, &a, &[c.id], "Duo").unwrap();

    assert_eq!(conversations::list_for_user(&db, &a).unwrap().len(), 2);
    assert_eq!(conversations::list_for_user(&db, &b).unwrap().len(), 2);
    assert_eq!(conversations::list_for_user(&db, &c).unwrap().len(), 2);
}

#[test]
fn concurrent_direct_creation_converges_on_one_conversation() {
    let db = Arc::new(fresh_db());
    for round in 0..50 {
        let a = user(&db, &format!("alice{round}"));
        let b = user(&db, &format!("bob{round}"));
        let barrier = Arc::new(Barrier::new(2));

        let spawn_create = |caller: User, other: uuid::Uuid| {
            let db = db.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                conversations::get_or_create_direct(&db, &caller, other)
            })
        };
        let first = spawn_create(a.clone(), b.id);
        let second = spawn_create(b, a.id);

        // Both sides of the race get the same conversation, never an error.
        let (id_a, _) = first.join().unwrap().unwrap();
        let (id_b, _) = second.join().unwrap().unwrap();
        assert_eq!(id_a, id_b);
        assert_eq!(conversations::list_for_user(&db, &a).unwrap().len(), 1);
    }
}

#[test]
fn concurrent_first_resolve_creates_one_user() {
    let db = Arc::new(fresh_db());
    for round in 0..50 {
        let claims = IdentityClaims {
            sub: format!("fresh-{round}"),
            name: format!("racer{round}"),
            email: String::new(),
            picture: String::new(),
            exp: 0,
        };
        let barrier = Arc::new(Barrier::new(2));

        let spawn_resolve = || {
            let db = db.clone();
            let claims = claims.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                identity::resolve(&db, &claims)
            })
        };
        let first = spawn_resolve();
        let second = spawn_resolve();

        let (u1, _) = first.join().unwrap().unwrap();
        let (u2, _) = second.join().unwrap().unwrap();
        assert_eq!(u1.id, u2.id);
    }
}

#[test]
fn redelete_after_grace_window_stays_a_no_op() {
    let db = fresh_db();
    let a = user(&db, "alice");
    let b = user(&db, "bob");
    let (conv, _) = conversations::get_or_create_direct(&db, &a, b.id).unwrap();

    let t = now_ms();
    let (msg, _) = messages::append_at(&db, &a, conv, "oops", t).unwrap();
    messages::soft_delete_at(&db, &a, msg, t + 1_000).unwrap();

    // Long after the window has elapsed: still a no-op, not an error.
    let keys = messages::soft_delete_at(&db, &a, msg, t + DELETE_GRACE_MS + 60_000).unwrap();
    assert!(!keys.is_empty());
    let listed = messages::list_by_conversation(&db, &a, conv).unwrap();
    assert_eq!(listed[0].content, DELETED_MARKER);

    // A non-sender stays rejected even when the message is already gone.
    let err = messages::soft_delete_at(&db, &b, msg, t + 2_000).unwrap_err();
    assert!(matches!(err, ChatError::Unauthorized(_)));
}
