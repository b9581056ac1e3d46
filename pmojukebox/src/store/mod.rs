//! Adaptateur de persistance : faits scalaires de lecture et playlist ordonnée
//!
//! Le moteur ne connaît que le trait [`PlaybackStore`] ; le schéma réel est
//! l'affaire de chaque implémentation.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::track::{PlaylistEntry, TrackSummary};
use crate::Result;

/// Clés des faits scalaires persistés
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    CurrentTrackId,
    IsPlaying,
    ProgressMs,
    LastTickUnix,
    PlayMode,
}

impl StateKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::CurrentTrackId => "current_track_id",
            StateKey::IsPlaying => "is_playing",
            StateKey::ProgressMs => "progress_ms",
            StateKey::LastTickUnix => "last_tick_unix",
            StateKey::PlayMode => "play_mode",
        }
    }
}

/// Stockage durable consommé par le `Jukebox`
///
/// Les implémentations gèrent elles-mêmes leur synchronisation interne ; le
/// moteur les appelle depuis sa section exclusive ou depuis l'horloge de progression.
pub trait PlaybackStore: Send + Sync {
    /// Playlist persistée, dans l'ordre, morceaux résolus
    fn load_playlist(&self) -> Result<Vec<PlaylistEntry>>;

    /// Réécrit entièrement la playlist dans l'ordre donné
    fn replace_playlist(&self, track_ids: &[String]) -> Result<()>;

    /// Valeur d'un fait scalaire (`None` si jamais écrit)
    fn get_scalar(&self, key: StateKey) -> Result<Option<String>>;

    fn set_scalar(&self, key: StateKey, value: &str) -> Result<()>;

    /// Morceau de la bibliothèque (`None` si inconnu)
    fn get_track(&self, id: &str) -> Result<Option<TrackSummary>>;

    fn delete_track(&self, id: &str) -> Result<()>;

    /// Enregistre (ou remplace) un morceau dans la bibliothèque
    fn add_track(&self, track: &TrackSummary) -> Result<()>;

    /// Toute la bibliothèque, triée par titre
    fn list_tracks(&self) -> Result<Vec<TrackSummary>>;
}
