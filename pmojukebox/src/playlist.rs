//! Opérations pures sur la file de lecture (sans I/O)

use crate::track::PlaylistEntry;

/// Réécrit les `position` pour qu'elles soient denses et égales aux indices
pub fn renumber(playlist: &mut [PlaylistEntry]) {
    for (i, entry) in playlist.iter_mut().enumerate() {
        entry.position = i;
    }
}

/// Indice de l'entrée portant `track_id`
pub fn index_of(playlist: &[PlaylistEntry], track_id: &str) -> Option<usize> {
    playlist.iter().position(|e| e.track_id == track_id)
}

/// Identifiants dans l'ordre de la playlist (forme persistée)
pub fn track_ids(playlist: &[PlaylistEntry]) -> Vec<String> {
    playlist.iter().map(|e| e.track_id.clone()).collect()
}

/// Déplace l'entrée `old_index` vers `new_index` puis renumérote
///
/// Les deux indices doivent être dans `[0, len)`.
pub fn move_entry(playlist: &mut Vec<PlaylistEntry>, old_index: usize, new_index: usize) {
    let entry = playlist.remove(old_index);
    playlist.insert(new_index, entry);
    renumber(playlist);
}

/// Indice voisin avec bouclage dans les deux sens (`len` > 0)
///
/// Sans morceau courant, on repart du début (ou de la fin en reculant).
pub fn step_index(current: Option<usize>, len: usize, forward: bool) -> usize {
    match (current, forward) {
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
        (None, true) => 0,
        (None, false) => len - 1,
    }
}

/// Nouvel indice du morceau courant après un déplacement `old_index -> new_index`
///
/// - le morceau déplacé est le morceau courant : il suit le déplacement ;
/// - une entrée passe de devant à derrière le morceau courant : `-1` ;
/// - une entrée passe de derrière à devant le morceau courant : `+1`.
pub fn reorder_current_index(old_index: usize, new_index: usize, current: usize) -> usize {
    if old_index == current {
        new_index
    } else if old_index < current && new_index >= current {
        current - 1
    } else if old_index > current && new_index <= current {
        current + 1
    } else {
        current
    }
}
