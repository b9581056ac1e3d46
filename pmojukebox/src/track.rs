//! Morceaux de la bibliothèque et entrées de la file de lecture

use serde::{Deserialize, Serialize};

/// Résumé d'un morceau de la bibliothèque
///
/// La bibliothèque est propriétaire du morceau ; l'état de lecture n'en garde
/// qu'une copie par valeur pour sérialiser les instantanés sans jointure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    /// Durée en millisecondes, `0` si inconnue
    #[serde(default)]
    pub duration_ms: i64,
    /// Localisation de la source audio (chemin relatif, URL...)
    #[serde(default)]
    pub source_locator: String,
}

impl TrackSummary {
    /// Durée connue et strictement positive
    pub fn known_duration(&self) -> Option<i64> {
        (self.duration_ms > 0).then_some(self.duration_ms)
    }
}

/// Entrée de la file de lecture
///
/// `position` vaut toujours l'indice réel de l'entrée dans la playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub track_id: String,
    pub position: usize,
    pub track: TrackSummary,
}

impl PlaylistEntry {
    pub fn new(track: TrackSummary, position: usize) -> Self {
        Self {
            track_id: track.id.clone(),
            position,
            track,
        }
    }
}
