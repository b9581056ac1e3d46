//! Types d'erreurs pour pmojukebox

/// Erreurs du moteur de synchronisation de lecture
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Track not found in library: {0}")]
    TrackNotFound(String),

    #[error("Track not in playlist: {0}")]
    NotInPlaylist(String),

    #[error("Index {index} out of range (playlist length {len})")]
    OutOfRange { index: i64, len: usize },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Vrai pour les deux variantes « référence absente »
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::TrackNotFound(_) | Error::NotInPlaylist(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::PersistenceError(e.to_string())
    }
}

/// Type Result spécialisé pour pmojukebox
pub type Result<T> = std::result::Result<T, Error>;
