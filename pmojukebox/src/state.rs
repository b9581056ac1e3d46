//! État de lecture canonique et instantanés diffusés

use crate::playlist;
use crate::track::{PlaylistEntry, TrackSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::time::Instant;

/// Mode de lecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayMode {
    #[default]
    RepeatAll,
    RepeatOne,
    Shuffle,
}

impl PlayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayMode::RepeatAll => "REPEAT_ALL",
            PlayMode::RepeatOne => "REPEAT_ONE",
            PlayMode::Shuffle => "SHUFFLE",
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "REPEAT_ALL" => Ok(PlayMode::RepeatAll),
            "REPEAT_ONE" => Ok(PlayMode::RepeatOne),
            "SHUFFLE" => Ok(PlayMode::Shuffle),
            other => Err(format!("unknown play mode: {}", other)),
        }
    }
}

/// Copie immuable de l'état, telle que poussée aux abonnés
///
/// `last_tick` n'y figure pas : c'est un détail interne au serveur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    pub current_track_id: Option<String>,
    pub current_track: Option<TrackSummary>,
    pub playlist: Vec<PlaylistEntry>,
    /// `-1` quand rien n'est en cours
    pub current_index: i64,
    pub progress_ms: i64,
    pub play_mode: PlayMode,
}

/// État de lecture canonique (possédé exclusivement par le `Jukebox`)
pub(crate) struct PlaybackState {
    pub is_playing: bool,
    pub current_track_id: Option<String>,
    pub current_track: Option<TrackSummary>,
    pub playlist: Vec<PlaylistEntry>,
    pub current_index: Option<usize>,
    pub progress_ms: i64,
    /// Instant (horloge murale) où `progress_ms` était exact, pour la persistance
    pub last_tick: DateTime<Utc>,
    /// Même instant sur l'horloge monotone, pour mesurer le temps écoulé
    pub tick_anchor: Instant,
    pub play_mode: PlayMode,
    /// Seule l'horloge de progression portant cette génération peut muter l'état
    pub clock_generation: u64,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            is_playing: false,
            current_track_id: None,
            current_track: None,
            playlist: Vec::new(),
            current_index: None,
            progress_ms: 0,
            last_tick: Utc::now(),
            tick_anchor: Instant::now(),
            play_mode: PlayMode::default(),
            clock_generation: 0,
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            is_playing: self.is_playing,
            current_track_id: self.current_track_id.clone(),
            current_track: self.current_track.clone(),
            playlist: self.playlist.clone(),
            current_index: self.current_index.map(|i| i as i64).unwrap_or(-1),
            progress_ms: self.progress_ms,
            play_mode: self.play_mode,
        }
    }

    /// Marque `progress_ms` comme exact à l'instant présent
    pub fn touch(&mut self) {
        self.last_tick = Utc::now();
        self.tick_anchor = Instant::now();
    }

    /// Millisecondes écoulées depuis le dernier `touch`
    pub fn elapsed_since_tick_ms(&self) -> i64 {
        self.tick_anchor.elapsed().as_millis() as i64
    }

    /// Durée connue du morceau courant
    pub fn current_duration(&self) -> Option<i64> {
        self.current_track
            .as_ref()
            .and_then(TrackSummary::known_duration)
    }

    /// Ramène une position dans `[0, durée]` (borne haute seulement si la durée est connue)
    pub fn clamp_position(&self, position_ms: i64) -> i64 {
        let position_ms = position_ms.max(0);
        match self.current_duration() {
            Some(duration) => position_ms.min(duration),
            None => position_ms,
        }
    }

    /// Fait pointer l'état courant sur l'entrée `index` (indice supposé valide)
    pub fn select(&mut self, index: usize) {
        let entry = &self.playlist[index];
        self.current_index = Some(index);
        self.current_track_id = Some(entry.track_id.clone());
        self.current_track = Some(entry.track.clone());
    }

    /// Oublie le morceau courant
    pub fn clear_current(&mut self) {
        self.current_index = None;
        self.current_track_id = None;
        self.current_track = None;
    }

    /// Recalcule `current_index` à partir de `current_track_id`
    pub fn resync_current_index(&mut self) {
        self.current_index = self
            .current_track_id
            .as_deref()
            .and_then(|id| playlist::index_of(&self.playlist, id));
    }
}
