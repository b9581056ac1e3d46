mod common;

use common::{library, track};
use pmojukebox::{
    Jukebox, JukeboxOptions, MemoryStore, PlayMode, PlaybackStore, SqliteStore, StateKey,
};
use std::sync::Arc;
use tempfile::TempDir;

fn sqlite_store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(&dir.path().join("jukebox.db")).unwrap();
    (dir, store)
}

fn seed(store: &dyn PlaybackStore, n: usize) {
    for t in library(n, 5000) {
        store.add_track(&t).unwrap();
    }
}

#[test]
fn test_sqlite_playlist_roundtrip_keeps_order() {
    let (_dir, store) = sqlite_store();
    seed(&store, 3);

    store
        .replace_playlist(&["t3".into(), "t1".into(), "t2".into()])
        .unwrap();

    let entries = store.load_playlist().unwrap();
    let ids: Vec<&str> = entries.iter().map(|e| e.track_id.as_str()).collect();
    assert_eq!(ids, vec!["t3", "t1", "t2"]);
    let positions: Vec<usize> = entries.iter().map(|e| e.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert_eq!(entries[0].track.id, "t3");
    assert_eq!(entries[0].track.title, "Title t3");
    assert_eq!(entries[0].track.duration_ms, 5000);
}

#[test]
fn test_sqlite_replace_playlist_overwrites() {
    let (_dir, store) = sqlite_store();
    seed(&store, 3);

    store.replace_playlist(&["t1".into(), "t2".into()]).unwrap();
    store.replace_playlist(&["t2".into()]).unwrap();

    let ids: Vec<String> = store
        .load_playlist()
        .unwrap()
        .into_iter()
        .map(|e| e.track_id)
        .collect();
    assert_eq!(ids, vec!["t2"]);
}

#[test]
fn test_sqlite_scalars() {
    let (_dir, store) = sqlite_store();

    assert_eq!(store.get_scalar(StateKey::ProgressMs).unwrap(), None);

    store.set_scalar(StateKey::ProgressMs, "1200").unwrap();
    store.set_scalar(StateKey::ProgressMs, "2400").unwrap();
    store.set_scalar(StateKey::IsPlaying, "true").unwrap();

    assert_eq!(
        store.get_scalar(StateKey::ProgressMs).unwrap().as_deref(),
        Some("2400")
    );
    assert_eq!(
        store.get_scalar(StateKey::IsPlaying).unwrap().as_deref(),
        Some("true")
    );
}

#[test]
fn test_sqlite_delete_track_cascades_to_playlist() {
    let (_dir, store) = sqlite_store();
    seed(&store, 3);
    store
        .replace_playlist(&["t1".into(), "t2".into(), "t3".into()])
        .unwrap();

    store.delete_track("t2").unwrap();

    assert!(store.get_track("t2").unwrap().is_none());
    let ids: Vec<String> = store
        .load_playlist()
        .unwrap()
        .into_iter()
        .map(|e| e.track_id)
        .collect();
    assert_eq!(ids, vec!["t1", "t3"]);
}

#[test]
fn test_sqlite_add_track_updates_without_dropping_playlist() {
    let (_dir, store) = sqlite_store();
    seed(&store, 2);
    store.replace_playlist(&["t1".into(), "t2".into()]).unwrap();

    let mut updated = track("t1", 9000);
    updated.title = "Freddie Freeloader".into();
    store.add_track(&updated).unwrap();

    assert_eq!(store.get_track("t1").unwrap().unwrap().duration_ms, 9000);
    assert_eq!(store.load_playlist().unwrap().len(), 2);
}

#[test]
fn test_sqlite_list_tracks_sorted_by_title() {
    let (_dir, store) = sqlite_store();
    let mut b = track("x", 1);
    b.title = "Bravo".into();
    let mut a = track("y", 1);
    a.title = "Alpha".into();
    store.add_track(&b).unwrap();
    store.add_track(&a).unwrap();

    let titles: Vec<String> = store
        .list_tracks()
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["Alpha", "Bravo"]);
}

#[test]
fn test_memory_store_fail_writes() {
    let store = MemoryStore::with_tracks(library(1, 1000));
    store.set_fail_writes(true);

    assert!(store.set_scalar(StateKey::IsPlaying, "true").is_err());
    assert!(store.replace_playlist(&["t1".into()]).is_err());
    // Les lectures restent possibles
    assert!(store.get_track("t1").unwrap().is_some());

    store.set_fail_writes(false);
    assert!(store.set_scalar(StateKey::IsPlaying, "true").is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_state_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("jukebox.db");

    {
        let store = SqliteStore::open(&path).unwrap();
        seed(&store, 3);
        let jukebox = Jukebox::load(Arc::new(store), JukeboxOptions::default())
            .await
            .unwrap();
        jukebox.add_to_playlist("t1").await.unwrap();
        jukebox.add_to_playlist("t2").await.unwrap();
        jukebox.add_to_playlist("t3").await.unwrap();
        jukebox.play_specific("t2").await.unwrap();
        jukebox.seek(1500).await.unwrap();
        jukebox.pause().await.unwrap();
        jukebox.set_play_mode(PlayMode::RepeatOne).await.unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let jukebox = Jukebox::load(Arc::new(store), JukeboxOptions::default())
        .await
        .unwrap();

    let state = jukebox.snapshot().await;
    assert_eq!(common::playlist_ids(&state), vec!["t1", "t2", "t3"]);
    assert_eq!(state.current_track_id.as_deref(), Some("t2"));
    assert_eq!(state.current_index, 1);
    assert_eq!(state.progress_ms, 1500);
    assert!(!state.is_playing);
    assert_eq!(state.play_mode, PlayMode::RepeatOne);
}

#[tokio::test(start_paused = true)]
async fn test_load_extrapolates_elapsed_time_when_playing() {
    let store = Arc::new(MemoryStore::with_tracks(library(2, 600_000)));
    store.replace_playlist(&["t1".into(), "t2".into()]).unwrap();
    store.set_scalar(StateKey::CurrentTrackId, "t2").unwrap();
    store.set_scalar(StateKey::IsPlaying, "true").unwrap();
    store.set_scalar(StateKey::ProgressMs, "1000").unwrap();
    let ten_seconds_ago = chrono::Utc::now().timestamp() - 10;
    store
        .set_scalar(StateKey::LastTickUnix, &ten_seconds_ago.to_string())
        .unwrap();

    let jukebox = Jukebox::load(store.clone(), JukeboxOptions::default())
        .await
        .unwrap();

    let state = jukebox.snapshot().await;
    assert!(state.is_playing);
    assert_eq!(state.current_index, 1);
    // 10 s écoulées (une seconde de marge pour l'horloge murale)
    assert!(
        (11_000..=12_000).contains(&state.progress_ms),
        "progress = {}",
        state.progress_ms
    );

    // L'horloge a repris
    tokio::time::sleep(std::time::Duration::from_millis(1001)).await;
    assert_eq!(jukebox.snapshot().await.progress_ms, state.progress_ms + 1000);
}

#[tokio::test(start_paused = true)]
async fn test_load_with_vanished_current_track() {
    let store = Arc::new(MemoryStore::with_tracks(library(2, 5000)));
    store.replace_playlist(&["t1".into()]).unwrap();
    store.set_scalar(StateKey::CurrentTrackId, "t2").unwrap();
    store.set_scalar(StateKey::IsPlaying, "true").unwrap();

    let jukebox = Jukebox::load(store, JukeboxOptions::default())
        .await
        .unwrap();

    let state = jukebox.snapshot().await;
    assert_eq!(state.current_track_id, None);
    assert_eq!(state.current_index, -1);
    assert!(!state.is_playing);
    assert_eq!(state.playlist.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_load_empty_store() {
    let (_dir, store) = sqlite_store();

    let jukebox = Jukebox::load(Arc::new(store), JukeboxOptions::default())
        .await
        .unwrap();

    let state = jukebox.snapshot().await;
    assert!(state.playlist.is_empty());
    assert!(!state.is_playing);
    assert_eq!(state.play_mode, PlayMode::RepeatAll);
}
