//! # pmojukebox - Moteur de lecture partagé multi-clients
//!
//! Cette crate maintient un unique état de lecture (morceau courant, position,
//! playlist ordonnée, mode de lecture) partagé par tous les clients connectés :
//! - Commandes de transport et d'édition de playlist sérialisées sous un seul verrou
//! - Horloge de progression qui avance la position et enchaîne les morceaux
//! - Diffusion d'un instantané complet à chaque changement
//! - Persistance (SQLite) pour survivre à un redémarrage
//!
//! # Architecture
//!
//! - **Jukebox** : synchroniseur, seul propriétaire de l'état
//! - **SubscriberHub** : registre des spectateurs, fan-out non bloquant
//! - **PlaybackStore** : trait de persistance (`SqliteStore`, `MemoryStore`)
//! - **PlaybackSnapshot** : copie immuable de l'état envoyée aux clients
//!
//! # Exemple d'utilisation
//!
//! ```no_run
//! use pmojukebox::{Jukebox, JukeboxOptions, SqliteStore, TrackSummary};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> pmojukebox::Result<()> {
//! let store = SqliteStore::open(std::path::Path::new("jukebox.db"))?;
//! let jukebox = Jukebox::load(Arc::new(store), JukeboxOptions::default()).await?;
//!
//! jukebox
//!     .register_track(TrackSummary {
//!         id: "t1".into(),
//!         title: "So What".into(),
//!         artist: "Miles Davis".into(),
//!         album: "Kind of Blue".into(),
//!         duration_ms: 545_000,
//!         source_locator: "music/so_what.flac".into(),
//!     })
//!     .await?;
//!
//! let mut viewer = jukebox.subscribe().await;
//! jukebox.add_to_playlist("t1").await?;
//!
//! while let Some(state) = viewer.recv().await {
//!     println!("{:?} @ {} ms", state.current_track_id, state.progress_ms);
//! }
//! # Ok(())
//! # }
//! ```

mod clock;
mod error;
mod hub;
mod jukebox;
mod playlist;
mod state;
mod store;
mod track;

#[cfg(feature = "pmoconfig")]
mod config_ext;

#[cfg(feature = "pmoserver")]
pub mod api;
#[cfg(feature = "pmoserver")]
pub mod openapi;
#[cfg(feature = "pmoserver")]
mod pmoserver_ext;
#[cfg(feature = "pmoserver")]
pub mod sse;

// Réexports publics
pub use error::{Error, Result};
pub use hub::{SubscriberHub, Subscription};
pub use jukebox::{Jukebox, JukeboxOptions, DEFAULT_MAILBOX_CAPACITY, DEFAULT_TICK_INTERVAL};
pub use playlist::reorder_current_index;
pub use state::{PlayMode, PlaybackSnapshot};
pub use store::{MemoryStore, PlaybackStore, SqliteStore, StateKey};
pub use track::{PlaylistEntry, TrackSummary};

#[cfg(feature = "pmoconfig")]
pub use config_ext::JukeboxConfigExt;

#[cfg(feature = "pmoserver")]
pub use openapi::ApiDoc;
#[cfg(feature = "pmoserver")]
pub use pmoserver_ext::JukeboxExt;
