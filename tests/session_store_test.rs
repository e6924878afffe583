//! Tests for the session store.

use chrono::TimeDelta;
use codenames_engine::{Game, GameError, Team, WordPool, WordSet};
use codenames_server::{EvictionPolicy, GameSnapshot, SessionStore, StoreError};
use std::collections::HashSet;

fn words() -> WordPool {
    WordPool::new((0..60).map(|i| format!("word{i}"))).expect("60 words")
}

fn store() -> SessionStore {
    SessionStore::new(words(), EvictionPolicy::default())
}

fn assassin(snapshot: &GameSnapshot) -> usize {
    snapshot
        .game()
        .layout()
        .iter()
        .position(|t| *t == Team::Black)
        .expect("one assassin")
}

#[tokio::test]
async fn test_unknown_game_without_token_is_not_found() {
    let store = store();
    assert!(store.get_or_create("otter", None).is_none());
    assert!(store.get_or_create("otter", Some("")).is_none());
    assert!(!store.contains("otter"));
}

#[tokio::test]
async fn test_bad_token_is_treated_as_not_found() {
    let store = store();
    assert!(store.get_or_create("otter", Some("not-a-token")).is_none());

    let result = store.mutate("otter", Some("00ff"), |g| g.end_turn());
    assert_eq!(
        result.unwrap_err(),
        StoreError::NotFound {
            id: "otter".to_string()
        }
    );
}

#[tokio::test]
async fn test_token_reconstructs_missing_game() {
    let store = store();
    let mut game = Game::new_random(WordSet::Default(words()));
    game.end_turn().expect("in progress");

    let snapshot = store
        .get_or_create("otter", Some(game.state_id().as_str()))
        .expect("reconstructed");
    assert_eq!(snapshot.game(), &game);
    assert_eq!(snapshot.state_id(), &game.state_id());
    assert!(store.contains("otter"));
}

#[tokio::test]
async fn test_resident_game_ignores_stale_token() {
    let store = store();
    let resident = store.resolve_or_new("otter", None);

    let other = Game::new_random(WordSet::Default(words()));
    let seen = store
        .get_or_create("otter", Some(other.state_id().as_str()))
        .expect("resident");

    assert_eq!(seen.state_id(), resident.state_id());
    assert_eq!(seen.created_at(), resident.created_at());
}

#[tokio::test]
async fn test_create_new_replaces_resident_game() {
    let store = store();
    let first = store.resolve_or_new("otter", None);
    store
        .mutate("otter", None, |g| g.end_turn())
        .expect("in progress");

    let second = store.create_new("otter", WordSet::Default(words()));
    assert_eq!(second.game().round(), 0);
    assert_ne!(second.state_id(), first.state_id());

    let seen = store.get_or_create("otter", None).expect("resident");
    assert_eq!(seen.state_id(), second.state_id());
}

#[tokio::test]
async fn test_mutation_persists_between_calls() {
    let store = store();
    store.resolve_or_new("otter", None);
    let after = store
        .mutate("otter", None, |g| g.end_turn())
        .expect("in progress");
    assert_eq!(after.game().round(), 1);

    let seen = store.get_or_create("otter", None).expect("resident");
    assert_eq!(seen.game().round(), 1);
}

#[tokio::test]
async fn test_actions_on_decided_game_fail_without_change() {
    let store = store();
    let snapshot = store.resolve_or_new("otter", None);
    let black = assassin(&snapshot);
    let decided = store
        .mutate("otter", None, |g| g.guess(black))
        .expect("legal guess");
    assert!(decided.game().winning_team().is_some());

    let guess = store.mutate("otter", None, |g| g.guess((black + 1) % 25));
    assert_eq!(guess.unwrap_err(), StoreError::Rejected(GameError::GameOver));
    let end = store.mutate("otter", None, |g| g.end_turn());
    assert_eq!(end.unwrap_err(), StoreError::Rejected(GameError::GameOver));

    let seen = store.get_or_create("otter", None).expect("resident");
    assert_eq!(seen.state_id(), decided.state_id());
}

#[tokio::test]
async fn test_stats_count_games_without_outcome() {
    let store = store();
    for id in ["a", "b", "c"] {
        store.resolve_or_new(id, None);
    }
    let snapshot = store.get_or_create("b", None).expect("resident");
    let black = assassin(&snapshot);
    store
        .mutate("b", None, |g| g.guess(black))
        .expect("legal guess");

    assert_eq!(*store.stats().games_in_progress(), 2);
}

#[tokio::test]
async fn test_eviction_boundaries() {
    let store = store();
    let done = store.resolve_or_new("done", None);
    let black = assassin(&done);
    store
        .mutate("done", None, |g| g.guess(black))
        .expect("legal guess");
    let open = store.resolve_or_new("open", None);

    let just_past_completed = *done.created_at() + TimeDelta::hours(12) + TimeDelta::seconds(1);
    let eleven_hours = *done.created_at() + TimeDelta::hours(11);

    assert_eq!(store.evict(eleven_hours), 0);
    assert_eq!(store.evict(just_past_completed), 1);
    assert!(!store.contains("done"));
    assert!(store.contains("open"));

    assert_eq!(store.evict(*open.created_at() + TimeDelta::hours(23)), 0);
    assert_eq!(
        store.evict(*open.created_at() + TimeDelta::hours(24) + TimeDelta::seconds(1)),
        1
    );
    assert!(!store.contains("open"));
}

#[tokio::test]
async fn test_evicted_game_resumes_from_token() {
    let store = store();
    store.resolve_or_new("otter", None);
    let before = store
        .mutate("otter", None, |g| g.end_turn())
        .expect("in progress");

    store.evict(*before.created_at() + TimeDelta::hours(25));
    assert!(!store.contains("otter"));

    let resumed = store
        .mutate("otter", Some(before.state_id().as_str()), |g| g.end_turn())
        .expect("reconstructed");
    assert_eq!(resumed.game().round(), 2);
    assert_eq!(resumed.game().words(), before.game().words());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolution_yields_single_game() {
    let store = store();
    let mut handles = Vec::new();
    for i in 0..32 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                store.resolve_or_new("shared", None)
            } else {
                store
                    .mutate("shared", None, |_| Ok(()))
                    .unwrap_or_else(|_| store.resolve_or_new("shared", None))
            }
        }));
    }

    let mut layouts = HashSet::new();
    let mut created = HashSet::new();
    for handle in handles {
        let snapshot = handle.await.expect("task completed");
        layouts.insert(snapshot.game().words().to_vec());
        created.insert(*snapshot.created_at());
    }

    assert_eq!(layouts.len(), 1, "every caller saw the same game");
    assert_eq!(created.len(), 1);
    assert_eq!(*store.stats().games_in_progress(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_turns_are_serialized() {
    let store = store();
    store.resolve_or_new("shared", None);

    let mut handles = Vec::new();
    for _ in 0..50 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .mutate("shared", None, |g| g.end_turn())
                .expect("in progress")
        }));
    }
    for handle in handles {
        handle.await.expect("task completed");
    }

    let seen = store.get_or_create("shared", None).expect("resident");
    assert_eq!(seen.game().round(), 50);
}
