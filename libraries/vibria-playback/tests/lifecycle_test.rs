//! Launch restore, background flush and reset

mod common;

use common::{track, tracks, Call, FakeAccess, Harness};
use serde_json::json;
use std::time::Duration;
use vibria_core::KeyValueStore;
use vibria_storage::store::{
    KEY_LAST_PLAYED_TOKEN, KEY_LIBRARY_BOOKMARKS, KEY_LOOP_MODE, KEY_PLAYLISTS, KEY_SHUFFLE,
};
use vibria_storage::MemoryStore;

const ABC: [&str; 3] = ["a.mp3", "b.mp3", "c.mp3"];

/// Play `b.mp3` up to 42s, then flush as the app would when backgrounded
async fn previous_session() -> Harness {
    let mut h = Harness::new(&ABC).await;
    h.manager.set_library(tracks(&ABC));
    h.manager.select(track("b.mp3")).unwrap();
    h.engine.tick(42.0, 180.0);
    h.pump().await;
    h.manager.flush_pending_saves().await.unwrap();
    h
}

#[tokio::test]
async fn test_restore_resumes_last_played_paused() {
    let first = previous_session().await;
    let mut h = Harness::open(first.store.clone(), first.access.clone()).await;

    h.manager.restore_session().await.unwrap();

    assert_eq!(h.manager.library(), tracks(&ABC).as_slice());
    assert_eq!(h.selected_name().as_deref(), Some("b.mp3"));
    assert_eq!(h.manager.elapsed(), 42.0);
    assert!(!h.manager.is_playing());
    assert_eq!(h.engine.loads(), vec!["b.mp3"]);
    assert!(h.engine.calls().contains(&Call::Seek(42.0)));
    assert!(!h.engine.calls().contains(&Call::Play));
}

#[tokio::test]
async fn test_restore_ignores_corrupt_last_played() {
    let first = previous_session().await;
    first
        .store
        .set(KEY_LAST_PLAYED_TOKEN, json!("%%% not base64"))
        .await
        .unwrap();

    let mut h = Harness::open(first.store.clone(), first.access.clone()).await;
    h.manager.restore_session().await.unwrap();

    assert_eq!(h.manager.library(), tracks(&ABC).as_slice());
    assert_eq!(h.selected_name().as_deref(), Some("a.mp3"));
    assert_eq!(h.manager.elapsed(), 0.0);
    assert!(!h.manager.is_playing());
}

#[tokio::test]
async fn test_restore_without_resume_selects_first() {
    let first = previous_session().await;
    first
        .manager
        .preferences()
        .set_resume_playback(false)
        .await
        .unwrap();

    let mut h = Harness::open(first.store.clone(), first.access.clone()).await;
    h.manager.restore_session().await.unwrap();

    assert_eq!(h.selected_name().as_deref(), Some("a.mp3"));
    assert_eq!(h.manager.elapsed(), 0.0);
    assert!(!h.engine.calls().iter().any(|c| matches!(c, Call::Seek(_))));
}

#[tokio::test]
async fn test_restore_skips_missing_files() {
    let first = previous_session().await;
    first.access.remove(&track("b.mp3"));

    let mut h = Harness::open(first.store.clone(), first.access.clone()).await;
    h.manager.restore_session().await.unwrap();

    assert_eq!(h.manager.library(), tracks(&["a.mp3", "c.mp3"]).as_slice());
    assert_eq!(h.selected_name().as_deref(), Some("a.mp3"));
}

#[tokio::test]
async fn test_restore_resumes_current_playlist() {
    let mut first = previous_session().await;
    let gym = first.manager.create_playlist("Gym").await.unwrap();
    first.manager.add_to_playlist(gym.id, track("c.mp3")).unwrap();
    first.manager.select_playlist(Some(gym.id)).await.unwrap();
    first.manager.flush_pending_saves().await.unwrap();

    let mut h = Harness::open(first.store.clone(), first.access.clone()).await;
    h.manager.restore_session().await.unwrap();

    assert_eq!(h.manager.playlists().current_id(), Some(gym.id));
    assert_eq!(h.manager.active_queue().base(), &[track("c.mp3")]);
    // Last played b.mp3 is not in Gym
    assert_eq!(h.selected_name().as_deref(), Some("c.mp3"));
    assert_eq!(h.manager.elapsed(), 0.0);
}

#[tokio::test]
async fn test_restore_with_empty_playlist_falls_back_to_library() {
    let mut first = previous_session().await;
    let empty = first.manager.create_playlist("Empty").await.unwrap();
    first.manager.select_playlist(Some(empty.id)).await.unwrap();
    first.manager.flush_pending_saves().await.unwrap();

    let mut h = Harness::open(first.store.clone(), first.access.clone()).await;
    h.manager.restore_session().await.unwrap();

    assert!(h.manager.playlists().current_id().is_none());
    assert_eq!(h.manager.active_queue().len(), 3);
    assert_eq!(h.selected_name().as_deref(), Some("b.mp3"));
}

#[tokio::test]
async fn test_empty_library_not_saved_during_restore() {
    let store = MemoryStore::new();
    let mut h = Harness::open(store.clone(), FakeAccess::with_files(&[])).await;

    h.manager.restore_session().await.unwrap();
    assert!(h.manager.selected().is_none());
    assert!(h.engine.loads().is_empty());
    assert_eq!(store.write_count(KEY_LIBRARY_BOOKMARKS), 0);

    // An explicit flush after the restore does persist the empty list
    h.manager.flush_pending_saves().await.unwrap();
    assert_eq!(store.peek(KEY_LIBRARY_BOOKMARKS), Some(json!([])));
}

#[tokio::test(start_paused = true)]
async fn test_library_save_is_debounced() {
    let mut h = Harness::new(&ABC).await;
    h.manager.set_library(tracks(&["a.mp3"]));
    tokio::time::sleep(Duration::from_millis(300)).await;
    h.manager.set_library(tracks(&ABC));
    assert!(h.manager.overlay().is_visible());
    assert_eq!(h.store.write_count(KEY_LIBRARY_BOOKMARKS), 0);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(h.store.write_count(KEY_LIBRARY_BOOKMARKS), 1);
    assert_eq!(
        h.store.peek(KEY_LIBRARY_BOOKMARKS).map(|v| v.as_array().map(Vec::len)),
        Some(Some(3))
    );
    assert!(!h.manager.overlay().is_visible());
}

#[tokio::test]
async fn test_flush_writes_library_and_playlists() {
    let mut h = Harness::new(&ABC).await;
    h.manager.set_library(tracks(&ABC));
    h.manager.create_playlist("Gym").await.unwrap();

    h.manager.flush_pending_saves().await.unwrap();

    assert_eq!(h.store.write_count(KEY_LIBRARY_BOOKMARKS), 1);
    assert_eq!(h.store.write_count(KEY_PLAYLISTS), 1);
    assert!(!h.manager.overlay().is_visible());
}

#[tokio::test]
async fn test_reset_all_forgets_everything() {
    let mut h = previous_session().await;
    h.manager.create_playlist("Gym").await.unwrap();
    h.manager.set_shuffle(true).await.unwrap();
    h.manager.cycle_loop_mode().await.unwrap();

    h.manager.reset_all().await.unwrap();

    assert!(h.manager.library().is_empty());
    assert!(h.manager.active_queue().is_empty());
    assert!(h.manager.selected().is_none());
    assert!(h.manager.playlists().playlists().is_empty());
    assert!(!h.manager.is_shuffling());
    assert_eq!(h.access.open_scopes(), 0);

    assert_eq!(h.store.peek(KEY_LIBRARY_BOOKMARKS), Some(json!([])));
    assert_eq!(h.store.peek(KEY_PLAYLISTS), Some(json!([])));
    assert!(!h.store.contains(KEY_LAST_PLAYED_TOKEN));
    assert!(!h.store.contains(KEY_SHUFFLE));
    assert!(!h.store.contains(KEY_LOOP_MODE));

    let mut reopened = Harness::open(h.store.clone(), h.access.clone()).await;
    reopened.manager.restore_session().await.unwrap();
    assert!(reopened.manager.selected().is_none());
}
