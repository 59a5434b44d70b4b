//! Playlist edits driving the active queue

mod common;

use common::{drain, flaky_manager, track, tracks, Harness};
use vibria_playback::PlayerEvent;
use vibria_storage::store::{KEY_FAVORITES_ID, KEY_LAST_PLAYLIST_ID};
use vibria_storage::PlaylistError;

const ABC: [&str; 3] = ["a.mp3", "b.mp3", "c.mp3"];

async fn abc() -> Harness {
    let mut h = Harness::new(&ABC).await;
    h.manager.set_library(tracks(&ABC));
    h
}

#[tokio::test]
async fn test_gym_and_favorites() {
    let mut h = abc().await;

    let gym = h.manager.create_playlist("Gym").await.unwrap();
    h.manager.select_playlist(Some(gym.id)).await.unwrap();
    assert!(h.manager.active_queue().is_empty());
    assert!(h.manager.selected().is_none());

    assert!(h.manager.add_to_playlist(gym.id, track("b.mp3")).unwrap());
    assert!(h.manager.add_to_playlist(gym.id, track("a.mp3")).unwrap());
    assert!(!h.manager.add_to_playlist(gym.id, track("a.mp3")).unwrap());
    assert_eq!(
        h.manager.active_queue().base(),
        tracks(&["b.mp3", "a.mp3"]).as_slice()
    );
    assert_eq!(h.selected_name().as_deref(), Some("b.mp3"));
    assert!(!h.manager.is_playing());

    assert!(h.manager.toggle_favorite(track("c.mp3")).await.unwrap());
    assert_eq!(h.manager.playlists().user_playlist_count(), 1);
    assert_eq!(h.manager.playlists().favorites_count(), 1);
    // Favoriting elsewhere leaves the Gym queue alone
    assert_eq!(h.manager.active_queue().len(), 2);

    let favorites = h.manager.select_favorites().await.unwrap();
    assert_eq!(h.manager.playlists().current_id(), Some(favorites));
    assert_eq!(h.manager.active_queue().base(), &[track("c.mp3")]);
    assert_eq!(h.selected_name().as_deref(), Some("c.mp3"));

    assert!(!h.manager.toggle_favorite(track("c.mp3")).await.unwrap());
    assert!(h.manager.active_queue().is_empty());
    assert!(h.manager.selected().is_none());
}

#[tokio::test]
async fn test_create_errors_are_distinct() {
    let mut h = abc().await;
    h.manager.create_playlist("Gym").await.unwrap();

    let empty = h.manager.create_playlist("  ").await.unwrap_err();
    assert!(matches!(
        empty,
        vibria_playback::PlaybackError::Playlist(PlaylistError::EmptyName)
    ));
    let duplicate = h.manager.create_playlist("GYM").await.unwrap_err();
    assert!(matches!(
        duplicate,
        vibria_playback::PlaybackError::Playlist(PlaylistError::DuplicateName(_))
    ));
}

#[tokio::test]
async fn test_deleting_current_playlist_returns_to_library() {
    let mut h = abc().await;
    let gym = h.manager.create_playlist("Gym").await.unwrap();
    h.manager.add_to_playlist(gym.id, track("c.mp3")).unwrap();
    h.manager.select_playlist(Some(gym.id)).await.unwrap();
    assert_eq!(h.selected_name().as_deref(), Some("c.mp3"));

    h.manager.delete_playlist(gym.id).await.unwrap();

    assert!(h.manager.playlists().current_id().is_none());
    assert_eq!(h.manager.active_queue().len(), 3);
    assert_eq!(h.selected_name().as_deref(), Some("c.mp3"));
}

#[tokio::test]
async fn test_import_adds_to_library_and_current_playlist() {
    let mut h = abc().await;
    h.access.add(&track("d.mp3"));
    let gym = h.manager.create_playlist("Gym").await.unwrap();
    h.manager.select_playlist(Some(gym.id)).await.unwrap();
    let mut rx = h.manager.subscribe();

    let added = h
        .manager
        .import_tracks(vec![track("d.mp3"), track("a.mp3"), track("cover.jpg")])
        .await
        .unwrap();

    assert_eq!(added, 1);
    assert_eq!(h.manager.library().len(), 4);
    assert_eq!(
        h.manager.playlists().get(gym.id).unwrap().songs,
        tracks(&["d.mp3", "a.mp3"])
    );
    assert_eq!(
        h.manager.active_queue().base(),
        tracks(&["d.mp3", "a.mp3"]).as_slice()
    );
    assert!(drain(&mut rx).contains(&PlayerEvent::UnsupportedFiles {
        tracks: vec![track("cover.jpg")]
    }));
}

#[tokio::test]
async fn test_import_into_favorites() {
    let mut h = abc().await;
    h.access.add(&track("d.mp3"));
    let favorites = h.manager.select_favorites().await.unwrap();

    h.manager.import_tracks(vec![track("d.mp3")]).await.unwrap();

    assert!(h.manager.playlists().is_favorite(&track("d.mp3")));
    assert_eq!(h.manager.playlists().current_id(), Some(favorites));
    assert_eq!(h.selected_name().as_deref(), Some("d.mp3"));
}

#[tokio::test]
async fn test_removing_track_removes_it_from_playlists() {
    let mut h = abc().await;
    let gym = h.manager.create_playlist("Gym").await.unwrap();
    h.manager.add_to_playlist(gym.id, track("a.mp3")).unwrap();
    h.manager.add_to_playlist(gym.id, track("b.mp3")).unwrap();
    h.manager.toggle_favorite(track("a.mp3")).await.unwrap();

    h.manager.remove_track(&track("a.mp3"));

    assert_eq!(h.manager.playlists().get(gym.id).unwrap().songs, vec![track("b.mp3")]);
    assert!(!h.manager.playlists().is_favorite(&track("a.mp3")));
    assert!(!h.manager.library().contains(&track("a.mp3")));
}

#[tokio::test]
async fn test_reorder_current_playlist_updates_queue() {
    let mut h = abc().await;
    let gym = h.manager.create_playlist("Gym").await.unwrap();
    h.manager
        .update_playlist_songs(gym.id, tracks(&["a.mp3", "b.mp3", "c.mp3"]))
        .unwrap();
    h.manager.select_playlist(Some(gym.id)).await.unwrap();

    h.manager.move_in_playlist(gym.id, 2, 0).unwrap();

    assert_eq!(
        h.manager.active_queue().base(),
        tracks(&["c.mp3", "a.mp3", "b.mp3"]).as_slice()
    );
    assert_eq!(h.selected_name().as_deref(), Some("a.mp3"));
}

#[tokio::test]
async fn test_playlist_navigation_switches_queue() {
    let mut h = abc().await;
    let first = h.manager.create_playlist("First").await.unwrap();
    let second = h.manager.create_playlist("Second").await.unwrap();
    h.manager.add_to_playlist(first.id, track("a.mp3")).unwrap();
    h.manager.add_to_playlist(second.id, track("b.mp3")).unwrap();

    assert_eq!(h.manager.select_next_playlist().await.unwrap(), Some(first.id));
    assert_eq!(h.selected_name().as_deref(), Some("a.mp3"));
    assert_eq!(h.manager.select_next_playlist().await.unwrap(), Some(second.id));
    assert_eq!(h.selected_name().as_deref(), Some("b.mp3"));
    assert_eq!(h.manager.select_previous_playlist().await.unwrap(), Some(first.id));
    assert_eq!(h.selected_name().as_deref(), Some("a.mp3"));

    h.manager.select_playlist(None).await.unwrap();
    assert_eq!(h.manager.active_queue().len(), 3);
}

#[tokio::test]
async fn test_set_active_queue_keeps_or_replaces_selection() {
    let mut h = abc().await;
    h.manager.select(track("c.mp3")).unwrap();

    let mut road = vibria_core::Playlist::new("Road");
    road.push_unique(track("b.mp3"));
    road.push_unique(track("a.mp3"));

    // "c" is not in the new base: its first track is loaded paused
    h.manager.set_active_queue(Some(&road));
    assert_eq!(h.selected_name().as_deref(), Some("b.mp3"));
    assert!(!h.manager.is_playing());
    assert_eq!(h.manager.active_queue().base(), road.songs.as_slice());

    // "b" is in the library, so going back keeps it
    h.manager.set_active_queue(None);
    assert_eq!(h.selected_name().as_deref(), Some("b.mp3"));
    assert_eq!(h.manager.active_queue().len(), 3);

    h.manager.set_active_queue(Some(&vibria_core::Playlist::new("Empty")));
    assert!(h.manager.selected().is_none());
    assert_eq!(h.access.open_scopes(), 0);
}

#[tokio::test]
async fn test_queue_follows_selection_when_id_write_fails() {
    let (mut manager, _engine) =
        flaky_manager(&ABC, &[KEY_LAST_PLAYLIST_ID, KEY_FAVORITES_ID]).await;
    manager.set_library(tracks(&ABC));

    let gym = manager.create_playlist("Gym").await.unwrap();
    manager.add_to_playlist(gym.id, track("b.mp3")).unwrap();

    manager.select_playlist(Some(gym.id)).await.unwrap();
    assert_eq!(manager.playlists().current_id(), Some(gym.id));
    assert_eq!(manager.active_queue().base(), tracks(&["b.mp3"]).as_slice());
    assert_eq!(manager.selected(), Some(&track("b.mp3")));

    // Favorites created and deleted while its id cannot be stored
    let favorites = manager.select_favorites().await.unwrap();
    assert!(manager.active_queue().is_empty());
    manager.delete_playlist(favorites).await.unwrap();
    assert_eq!(manager.playlists().current_id(), None);
    assert_eq!(manager.active_queue().len(), 3);
}
