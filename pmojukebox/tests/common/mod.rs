#![allow(dead_code)]

use pmojukebox::{Jukebox, JukeboxOptions, MemoryStore, TrackSummary};
use std::sync::Arc;

pub fn track(id: &str, duration_ms: i64) -> TrackSummary {
    TrackSummary {
        id: id.to_string(),
        title: format!("Title {}", id),
        artist: "Artist".to_string(),
        album: "Album".to_string(),
        duration_ms,
        source_locator: format!("music/{}.flac", id),
    }
}

/// Bibliothèque `t1..tn`, toutes de durée `duration_ms`
pub fn library(n: usize, duration_ms: i64) -> Vec<TrackSummary> {
    (1..=n).map(|i| track(&format!("t{}", i), duration_ms)).collect()
}

pub async fn jukebox_with(tracks: Vec<TrackSummary>) -> (Jukebox, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_tracks(tracks));
    let jukebox = Jukebox::load(store.clone(), JukeboxOptions::default())
        .await
        .unwrap();
    (jukebox, store)
}

/// Jukebox dont la playlist contient `ids` dans l'ordre (lecture démarrée sur le premier)
pub async fn queued(ids: &[&str], duration_ms: i64) -> (Jukebox, Arc<MemoryStore>) {
    let tracks = ids.iter().map(|id| track(id, duration_ms)).collect();
    let (jukebox, store) = jukebox_with(tracks).await;
    for id in ids {
        jukebox.add_to_playlist(id).await.unwrap();
    }
    (jukebox, store)
}

pub fn playlist_ids(snapshot: &pmojukebox::PlaybackSnapshot) -> Vec<String> {
    snapshot.playlist.iter().map(|e| e.track_id.clone()).collect()
}

pub fn assert_dense_positions(snapshot: &pmojukebox::PlaybackSnapshot) {
    for (i, entry) in snapshot.playlist.iter().enumerate() {
        assert_eq!(entry.position, i, "position of {} is not dense", entry.track_id);
    }
}
