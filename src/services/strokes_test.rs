use super::*;
use crate::state::test_helpers;
use wire::{Point, Tool};

fn draft(client_id: &str) -> DrawDraft {
    DrawDraft {
        prev_point: Point { x: 0.0, y: 0.0 },
        point: Point { x: 1.0, y: 1.0 },
        color: "#123456".to_owned(),
        size: 4.0,
        tool: Tool::Brush,
        client_id: client_id.to_owned(),
    }
}

fn seeded_state() -> crate::state::AppState {
    let state = test_helpers::test_app_state();
    test_helpers::seed_room(&state, "lobby");
    state
}

#[test]
fn append_assigns_strictly_increasing_op_ids() {
    let state = seeded_state();
    let user = Uuid::new_v4();

    let first = append_draw(&state, "lobby", user, draft("c-0")).expect("append");
    let second = append_draw(&state, "lobby", user, draft("c-1")).expect("append");

    assert_eq!(first.op_id, 0);
    assert_eq!(second.op_id, 1);
    assert!(first.active);
    assert_eq!(first.client_id.as_deref(), Some("c-0"));
    assert_eq!(first.user_id, user);
}

#[test]
fn append_into_missing_room_returns_none() {
    let state = test_helpers::test_app_state();
    assert!(append_draw(&state, "ghost", Uuid::new_v4(), draft("c-0")).is_none());
}

#[test]
fn op_ids_stay_monotonic_after_undo_and_clear() {
    let state = seeded_state();
    let user = Uuid::new_v4();
    append_draw(&state, "lobby", user, draft("c-0")).expect("append");
    undo(&state, "lobby", user);
    clear_user(&state, "lobby", user);

    // Flips never shrink the log, so ids keep counting from its length.
    let next = append_draw(&state, "lobby", user, draft("c-1")).expect("append");
    assert_eq!(next.op_id, 1);
}

#[test]
fn undo_targets_the_senders_newest_active_op() {
    let state = seeded_state();
    let user = Uuid::new_v4();
    append_draw(&state, "lobby", user, draft("c-0")).expect("append");
    append_draw(&state, "lobby", user, draft("c-1")).expect("append");

    assert_eq!(undo(&state, "lobby", user), Some(1));
    assert_eq!(undo(&state, "lobby", user), Some(0));
    assert_eq!(undo(&state, "lobby", user), None);
}

#[test]
fn undo_skips_other_users_operations() {
    let state = seeded_state();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    append_draw(&state, "lobby", alice, draft("a-0")).expect("append");
    append_draw(&state, "lobby", bob, draft("b-0")).expect("append");

    // Bob's op is newest, but Alice's undo must reach past it.
    assert_eq!(undo(&state, "lobby", alice), Some(0));
    let entry = state.rooms.get("lobby").expect("room");
    assert!(entry.ops[1].active);
}

#[test]
fn undo_then_immediate_redo_restores_the_same_op() {
    let state = seeded_state();
    let user = Uuid::new_v4();
    append_draw(&state, "lobby", user, draft("c-0")).expect("append");
    append_draw(&state, "lobby", user, draft("c-1")).expect("append");

    assert_eq!(undo(&state, "lobby", user), Some(1));
    // Op 1 is the sole inactive entry, so the forward scan lands on it.
    assert_eq!(redo(&state, "lobby", user), Some(1));
}

#[test]
fn redo_restores_the_oldest_inactive_op_first() {
    let state = seeded_state();
    let user = Uuid::new_v4();
    for n in 0..3 {
        append_draw(&state, "lobby", user, draft(&format!("c-{n}"))).expect("append");
    }
    // Undo newest-first: 2 then 1.
    assert_eq!(undo(&state, "lobby", user), Some(2));
    assert_eq!(undo(&state, "lobby", user), Some(1));

    // Redo restores oldest-first: 1 then 2, the reverse of undo order.
    assert_eq!(redo(&state, "lobby", user), Some(1));
    assert_eq!(redo(&state, "lobby", user), Some(2));
    assert_eq!(redo(&state, "lobby", user), None);
}

#[test]
fn redo_without_inactive_ops_is_none() {
    let state = seeded_state();
    let user = Uuid::new_v4();
    append_draw(&state, "lobby", user, draft("c-0")).expect("append");
    assert_eq!(redo(&state, "lobby", user), None);
}

#[test]
fn clear_flips_only_the_senders_active_ops() {
    let state = seeded_state();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    append_draw(&state, "lobby", alice, draft("a-0")).expect("append");
    append_draw(&state, "lobby", alice, draft("a-1")).expect("append");
    append_draw(&state, "lobby", bob, draft("b-0")).expect("append");
    undo(&state, "lobby", alice);

    let flipped = clear_user(&state, "lobby", alice);

    // Only the still-active op 0; op 1 was already inactive.
    assert_eq!(flipped, vec![0]);
    let entry = state.rooms.get("lobby").expect("room");
    assert!(!entry.ops[0].active);
    assert!(!entry.ops[1].active);
    assert!(entry.ops[2].active);
}

#[test]
fn clear_with_nothing_visible_returns_empty_set() {
    let state = seeded_state();
    assert!(clear_user(&state, "lobby", Uuid::new_v4()).is_empty());
}

#[test]
fn cleared_ops_are_recoverable_through_redo() {
    let state = seeded_state();
    let user = Uuid::new_v4();
    append_draw(&state, "lobby", user, draft("c-0")).expect("append");
    append_draw(&state, "lobby", user, draft("c-1")).expect("append");

    assert_eq!(clear_user(&state, "lobby", user), vec![0, 1]);
    assert_eq!(redo(&state, "lobby", user), Some(0));
    assert_eq!(redo(&state, "lobby", user), Some(1));
}
