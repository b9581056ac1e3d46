//! Jukebox : synchroniseur de l'état de lecture partagé
//!
//! Le `Jukebox` possède l'unique [`PlaybackState`] du processus. Toute commande
//! suit le même protocole, sous un seul verrou :
//!
//! 1. acquérir l'état ;
//! 2. muter les champs en mémoire ;
//! 3. écrire le delta minimal dans le [`PlaybackStore`] ;
//! 4. publier le nouvel instantané sur le [`SubscriberHub`] ;
//! 5. relâcher le verrou.
//!
//! L'horloge de progression suit exactement le même protocole à chaque tick.
//! Les échecs de persistance sont journalisés et n'annulent rien : l'état en
//! mémoire fait foi pour le processus en cours.

use crate::clock;
use crate::hub::{Subscription, SubscriberHub};
use crate::playlist;
use crate::state::{PlayMode, PlaybackSnapshot, PlaybackState};
use crate::store::{PlaybackStore, StateKey};
use crate::track::{PlaylistEntry, TrackSummary};
use crate::{Error, Result};
use chrono::Utc;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Intervalle par défaut de l'horloge de progression
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Capacité par défaut de la boîte aux lettres d'un abonné
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// Réglages du moteur
#[derive(Debug, Clone)]
pub struct JukeboxOptions {
    /// Période de l'horloge de progression (et incrément de `progress_ms`)
    pub tick_interval: Duration,
    /// Nombre d'instantanés en attente avant qu'un abonné soit éjecté
    pub mailbox_capacity: usize,
}

impl Default for JukeboxOptions {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

pub(crate) struct JukeboxInner {
    state: Mutex<PlaybackState>,
    store: Arc<dyn PlaybackStore>,
    hub: SubscriberHub,
    options: JukeboxOptions,
}

/// Orchestrateur de l'état de lecture (clonable, toutes les copies partagent l'état)
#[derive(Clone)]
pub struct Jukebox {
    inner: Arc<JukeboxInner>,
}

impl Jukebox {
    /// Reconstruit l'état depuis le stockage et démarre l'horloge si la lecture était active
    ///
    /// Si la lecture était en cours à l'arrêt du processus, le temps écoulé
    /// depuis le dernier tick persisté est ajouté à la progression.
    pub async fn load(store: Arc<dyn PlaybackStore>, options: JukeboxOptions) -> Result<Self> {
        let mut state = PlaybackState::new();

        let mut entries = store.load_playlist()?;
        playlist::renumber(&mut entries);
        state.playlist = entries;

        state.play_mode = read_scalar(&*store, StateKey::PlayMode)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        let current_id = read_scalar(&*store, StateKey::CurrentTrackId).filter(|s| !s.is_empty());
        if let Some(id) = current_id {
            match playlist::index_of(&state.playlist, &id) {
                Some(index) => state.select(index),
                None => warn!(track_id = %id, "Persisted current track is no longer queued"),
            }
        }

        if state.current_track_id.is_some() {
            let was_playing =
                read_scalar(&*store, StateKey::IsPlaying).as_deref() == Some("true");
            let progress = read_scalar(&*store, StateKey::ProgressMs)
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(0)
                .max(0);
            let last_tick_unix = read_scalar(&*store, StateKey::LastTickUnix)
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(0);

            state.progress_ms = progress;
            state.is_playing = was_playing;
            if was_playing && last_tick_unix > 0 {
                let elapsed_secs = (Utc::now().timestamp() - last_tick_unix).max(0);
                state.progress_ms += elapsed_secs * 1000;
            }
        }
        state.touch();

        let playing = state.is_playing;
        let queued = state.playlist.len();

        let jukebox = Self {
            inner: Arc::new(JukeboxInner {
                state: Mutex::new(state),
                store,
                hub: SubscriberHub::new(),
                options,
            }),
        };

        if playing {
            let mut state = jukebox.inner.state.lock().await;
            jukebox.restart_clock(&mut state);
        }

        info!(
            tracks = queued,
            playing, "Jukebox initialized and loaded from store"
        );
        Ok(jukebox)
    }

    pub fn options(&self) -> &JukeboxOptions {
        &self.inner.options
    }

    pub fn hub(&self) -> &SubscriberHub {
        &self.inner.hub
    }

    // --- Lecture de l'état ---

    /// Copie de l'état courant (pour amorcer un nouveau client)
    pub async fn snapshot(&self) -> PlaybackSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    /// Inscrit un spectateur ; son premier message est l'état courant
    pub async fn subscribe(&self) -> Subscription {
        let state = self.inner.state.lock().await;
        self.inner
            .hub
            .subscribe_with(self.inner.options.mailbox_capacity, state.snapshot())
    }

    // --- Commandes ---

    pub async fn play(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        if state.is_playing || state.playlist.is_empty() {
            debug!("Play ignored (already playing or empty playlist)");
            return Ok(());
        }

        if state.current_index.is_none() {
            self.switch_to(&mut state, 0);
        } else {
            state.is_playing = true;
            state.touch();
            self.restart_clock(&mut state);
            self.persist(&[
                (StateKey::IsPlaying, "true".to_string()),
                (StateKey::LastTickUnix, state.last_tick.timestamp().to_string()),
            ]);
        }

        self.publish(&state);
        info!("Action: Play");
        Ok(())
    }

    pub async fn pause(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        if !state.is_playing {
            debug!("Pause ignored (already paused)");
            return Ok(());
        }

        // Le temps joué depuis le dernier tick compte ; l'horloge s'arrêtera d'elle-même
        let elapsed = state.elapsed_since_tick_ms();
        state.progress_ms = state.clamp_position(state.progress_ms + elapsed);
        state.is_playing = false;
        state.touch();

        self.persist(&[
            (StateKey::IsPlaying, "false".to_string()),
            (StateKey::ProgressMs, state.progress_ms.to_string()),
            (StateKey::LastTickUnix, state.last_tick.timestamp().to_string()),
        ]);

        self.publish(&state);
        info!("Action: Pause");
        Ok(())
    }

    pub async fn next(&self) -> Result<()> {
        self.step(true).await;
        info!("Action: Next");
        Ok(())
    }

    pub async fn previous(&self) -> Result<()> {
        self.step(false).await;
        info!("Action: Previous");
        Ok(())
    }

    async fn step(&self, forward: bool) {
        let mut state = self.inner.state.lock().await;

        if state.playlist.is_empty() {
            self.stop_playback(&mut state);
        } else {
            let index = playlist::step_index(state.current_index, state.playlist.len(), forward);
            self.switch_to(&mut state, index);
        }

        self.publish(&state);
    }

    /// Joue un morceau de la playlist depuis le début, même s'il est déjà en cours
    pub async fn play_specific(&self, track_id: &str) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        let index = playlist::index_of(&state.playlist, track_id)
            .ok_or_else(|| Error::NotInPlaylist(track_id.to_string()))?;

        self.switch_to(&mut state, index);
        self.publish(&state);
        info!(track_id, "Action: Play specific track");
        Ok(())
    }

    /// Positionne la lecture, bornée à `[0, durée]`
    pub async fn seek(&self, position_ms: i64) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        if state.current_track.is_none() {
            return Err(Error::InvalidState(
                "no track is currently loaded".to_string(),
            ));
        }

        state.progress_ms = state.clamp_position(position_ms);
        state.touch();
        if state.is_playing {
            self.restart_clock(&mut state);
        }

        self.persist(&[
            (StateKey::ProgressMs, state.progress_ms.to_string()),
            (StateKey::LastTickUnix, state.last_tick.timestamp().to_string()),
        ]);

        self.publish(&state);
        info!(position_ms = state.progress_ms, "Action: Seek");
        Ok(())
    }

    /// Ajoute un morceau de la bibliothèque en fin de playlist (idempotent)
    ///
    /// Si la playlist était vide, la lecture démarre sur ce morceau.
    pub async fn add_to_playlist(&self, track_id: &str) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        let track = self
            .inner
            .store
            .get_track(track_id)?
            .ok_or_else(|| Error::TrackNotFound(track_id.to_string()))?;

        if playlist::index_of(&state.playlist, track_id).is_some() {
            debug!(track_id, "Track already queued, nothing to add");
            return Ok(());
        }

        let position = state.playlist.len();
        state.playlist.push(PlaylistEntry::new(track, position));
        self.persist_playlist(&state);

        if state.playlist.len() == 1 {
            self.switch_to(&mut state, 0);
        }

        self.publish(&state);
        info!(track_id, "Action: Add to playlist");
        Ok(())
    }

    /// Retire un morceau de la playlist
    ///
    /// Si c'était le morceau courant, la lecture passe au suivant (ou s'arrête
    /// si la playlist devient vide).
    pub async fn remove_from_playlist(&self, track_id: &str) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        let index = playlist::index_of(&state.playlist, track_id)
            .ok_or_else(|| Error::NotInPlaylist(track_id.to_string()))?;
        let was_current = state.current_index == Some(index);

        state.playlist.remove(index);
        playlist::renumber(&mut state.playlist);
        self.persist_playlist(&state);

        if was_current {
            if state.playlist.is_empty() {
                self.stop_playback(&mut state);
            } else {
                // Le suivant a glissé à la place du morceau retiré
                let next = index % state.playlist.len();
                self.switch_to(&mut state, next);
            }
        } else {
            state.resync_current_index();
        }

        self.publish(&state);
        info!(track_id, "Action: Remove from playlist");
        Ok(())
    }

    /// Supprime un morceau de la bibliothèque, et donc de la playlist
    pub async fn remove_from_library(&self, track_id: &str) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        if self.inner.store.get_track(track_id)?.is_none() {
            return Err(Error::TrackNotFound(track_id.to_string()));
        }

        if let Err(e) = self.inner.store.delete_track(track_id) {
            warn!(track_id, "Failed to delete track from library: {}", e);
        }

        if let Some(index) = playlist::index_of(&state.playlist, track_id) {
            let was_current = state.current_track_id.as_deref() == Some(track_id);

            state.playlist.remove(index);
            playlist::renumber(&mut state.playlist);
            self.persist_playlist(&state);

            if was_current {
                if state.playlist.is_empty() {
                    self.stop_playback(&mut state);
                } else {
                    let len = state.playlist.len();
                    let next = state.current_index.filter(|&i| i < len).unwrap_or(0);
                    self.switch_to(&mut state, next);
                }
            } else {
                state.resync_current_index();
            }
        }

        self.publish(&state);
        info!(track_id, "Action: Removed track from library");
        Ok(())
    }

    /// Déplace un morceau à `new_index` dans la playlist
    pub async fn reorder(&self, track_id: &str, new_index: i64) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        let len = state.playlist.len();
        if new_index < 0 || new_index as usize >= len {
            return Err(Error::OutOfRange {
                index: new_index,
                len,
            });
        }
        let new_index = new_index as usize;

        let old_index = playlist::index_of(&state.playlist, track_id)
            .ok_or_else(|| Error::NotInPlaylist(track_id.to_string()))?;

        if old_index == new_index {
            debug!(track_id, "Reorder ignored (same position)");
            return Ok(());
        }

        playlist::move_entry(&mut state.playlist, old_index, new_index);
        state.current_index = state
            .current_index
            .map(|current| playlist::reorder_current_index(old_index, new_index, current));
        debug_assert_eq!(
            state.current_index,
            state
                .current_track_id
                .as_deref()
                .and_then(|id| playlist::index_of(&state.playlist, id))
        );

        self.persist_playlist(&state);
        self.publish(&state);
        info!(track_id, old_index, new_index, "Action: Reorder");
        Ok(())
    }

    /// Mélange la playlist ; le morceau courant reste le même
    pub async fn shuffle(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        if state.playlist.is_empty() {
            debug!("Shuffle ignored (empty playlist)");
            return Ok(());
        }

        state.playlist.shuffle(&mut rand::rng());
        playlist::renumber(&mut state.playlist);
        state.resync_current_index();

        self.persist_playlist(&state);
        self.publish(&state);
        info!("Action: Shuffle");
        Ok(())
    }

    pub async fn set_play_mode(&self, mode: PlayMode) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        if state.play_mode == mode {
            debug!(mode = %mode, "Play mode unchanged");
            return Ok(());
        }

        state.play_mode = mode;
        self.persist(&[(StateKey::PlayMode, mode.as_str().to_string())]);
        self.publish(&state);
        info!(mode = %mode, "Action: Set play mode");
        Ok(())
    }

    // --- Bibliothèque ---

    /// Toute la bibliothèque, triée par titre
    pub fn library(&self) -> Result<Vec<TrackSummary>> {
        self.inner.store.list_tracks()
    }

    /// Enregistre (ou met à jour) les métadonnées d'un morceau
    ///
    /// Les copies dénormalisées dans la playlist sont rafraîchies et diffusées.
    pub async fn register_track(&self, track: TrackSummary) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        self.inner.store.add_track(&track)?;

        let mut changed = false;
        for entry in state.playlist.iter_mut() {
            if entry.track_id == track.id && entry.track != track {
                entry.track = track.clone();
                changed = true;
            }
        }
        if changed {
            if state.current_track_id.as_deref() == Some(track.id.as_str()) {
                state.current_track = Some(track.clone());
            }
            self.publish(&state);
        }

        info!(track_id = %track.id, title = %track.title, "Track registered in library");
        Ok(())
    }

    // --- Horloge de progression ---

    /// Un tick de l'horloge ; retourne false quand cette instance doit s'arrêter
    pub(crate) async fn on_tick(&self, generation: u64) -> bool {
        let mut state = self.inner.state.lock().await;

        if state.clock_generation != generation || !state.is_playing {
            return false;
        }

        state.progress_ms += self.inner.options.tick_interval.as_millis() as i64;
        state.touch();

        let finished = state
            .current_duration()
            .is_some_and(|duration| state.progress_ms >= duration);

        if finished {
            if state.playlist.is_empty() {
                self.stop_playback(&mut state);
            } else {
                let index = match (state.play_mode, state.current_index) {
                    (PlayMode::RepeatOne, Some(current)) => current,
                    (_, current) => playlist::step_index(current, state.playlist.len(), true),
                };
                debug!(next_index = index, "Track finished, advancing");
                self.switch_to(&mut state, index);
            }
        } else {
            self.persist(&[
                (StateKey::ProgressMs, state.progress_ms.to_string()),
                (StateKey::LastTickUnix, state.last_tick.timestamp().to_string()),
            ]);
        }

        self.publish(&state);
        state.clock_generation == generation && state.is_playing
    }

    /// Lance une nouvelle instance de l'horloge ; les précédentes deviennent caduques
    fn restart_clock(&self, state: &mut PlaybackState) {
        state.clock_generation = state.clock_generation.wrapping_add(1);
        clock::spawn(
            Arc::downgrade(&self.inner),
            state.clock_generation,
            self.inner.options.tick_interval,
        );
    }

    pub(crate) fn from_inner(inner: Arc<JukeboxInner>) -> Self {
        Self { inner }
    }

    // --- Routines internes (verrou déjà tenu) ---

    /// Bascule sur l'entrée `index` depuis zéro et lance la lecture
    fn switch_to(&self, state: &mut PlaybackState, index: usize) {
        state.select(index);
        state.progress_ms = 0;
        state.is_playing = true;
        state.touch();
        self.restart_clock(state);

        self.persist(&[
            (
                StateKey::CurrentTrackId,
                state.current_track_id.clone().unwrap_or_default(),
            ),
            (StateKey::ProgressMs, "0".to_string()),
            (StateKey::LastTickUnix, state.last_tick.timestamp().to_string()),
            (StateKey::IsPlaying, "true".to_string()),
        ]);
    }

    /// Arrête la lecture et oublie le morceau courant
    fn stop_playback(&self, state: &mut PlaybackState) {
        state.is_playing = false;
        state.clear_current();
        state.progress_ms = 0;
        state.touch();

        self.persist(&[
            (StateKey::IsPlaying, "false".to_string()),
            (StateKey::CurrentTrackId, String::new()),
            (StateKey::ProgressMs, "0".to_string()),
        ]);
    }

    fn persist(&self, facts: &[(StateKey, String)]) {
        for (key, value) in facts {
            if let Err(e) = self.inner.store.set_scalar(*key, value) {
                warn!(key = key.as_str(), "Failed to persist playback state: {}", e);
            }
        }
    }

    fn persist_playlist(&self, state: &PlaybackState) {
        let ids = playlist::track_ids(&state.playlist);
        if let Err(e) = self.inner.store.replace_playlist(&ids) {
            warn!("Failed to persist playlist: {}", e);
        }
    }

    fn publish(&self, state: &PlaybackState) {
        let delivered = self.inner.hub.publish(state.snapshot());
        tracing::trace!(subscribers = delivered, "State published");
    }
}

fn read_scalar(store: &dyn PlaybackStore, key: StateKey) -> Option<String> {
    match store.get_scalar(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key = key.as_str(), "Failed to read persisted state: {}", e);
            None
        }
    }
}
