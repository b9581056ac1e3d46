//! Persistance en mémoire

use super::{PlaybackStore, StateKey};
use crate::track::{PlaylistEntry, TrackSummary};
use crate::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryData {
    tracks: HashMap<String, TrackSummary>,
    playlist: Vec<String>,
    scalars: HashMap<StateKey, String>,
}

/// Stockage en mémoire, sans durabilité
///
/// [`MemoryStore::set_fail_writes`] fait échouer toutes les écritures, ce qui
/// permet d'exercer le chemin « échec de persistance » du moteur.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Crée un stockage dont la bibliothèque contient déjà `tracks`
    pub fn with_tracks(tracks: impl IntoIterator<Item = TrackSummary>) -> Self {
        let store = Self::new();
        {
            let mut data = store.data.lock().unwrap_or_else(|e| e.into_inner());
            for track in tracks {
                data.tracks.insert(track.id.clone(), track);
            }
        }
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Identifiants de la playlist telle que persistée
    pub fn persisted_playlist(&self) -> Vec<String> {
        self.data().playlist.clone()
    }

    fn data(&self) -> MutexGuard<'_, MemoryData> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(crate::Error::PersistenceError(
                "Memory store writes disabled".into(),
            ));
        }
        Ok(())
    }
}

impl PlaybackStore for MemoryStore {
    fn load_playlist(&self) -> Result<Vec<PlaylistEntry>> {
        let data = self.data();
        let entries = data
            .playlist
            .iter()
            .filter_map(|id| data.tracks.get(id).cloned())
            .enumerate()
            .map(|(i, track)| PlaylistEntry::new(track, i))
            .collect();
        Ok(entries)
    }

    fn replace_playlist(&self, track_ids: &[String]) -> Result<()> {
        self.check_write()?;
        self.data().playlist = track_ids.to_vec();
        Ok(())
    }

    fn get_scalar(&self, key: StateKey) -> Result<Option<String>> {
        Ok(self.data().scalars.get(&key).cloned())
    }

    fn set_scalar(&self, key: StateKey, value: &str) -> Result<()> {
        self.check_write()?;
        self.data().scalars.insert(key, value.to_string());
        Ok(())
    }

    fn get_track(&self, id: &str) -> Result<Option<TrackSummary>> {
        Ok(self.data().tracks.get(id).cloned())
    }

    fn delete_track(&self, id: &str) -> Result<()> {
        self.check_write()?;
        let mut data = self.data();
        data.tracks.remove(id);
        data.playlist.retain(|t| t != id);
        Ok(())
    }

    fn add_track(&self, track: &TrackSummary) -> Result<()> {
        self.check_write()?;
        self.data().tracks.insert(track.id.clone(), track.clone());
        Ok(())
    }

    fn list_tracks(&self) -> Result<Vec<TrackSummary>> {
        let mut tracks: Vec<TrackSummary> = self.data().tracks.values().cloned().collect();
        tracks.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(tracks)
    }
}
