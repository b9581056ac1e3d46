//! Extension pmoserver pour le jukebox
//!
//! `pmojukebox` ajoute ses routes à `pmoserver::Server` via un trait, sans que
//! pmoserver dépende de pmojukebox.

use crate::Jukebox;
use tracing::info;
use utoipa::OpenApi;

/// Trait pour étendre pmoserver avec l'API jukebox
///
/// # Exemple
///
/// ```rust,no_run
/// use pmojukebox::JukeboxExt;
/// use pmoserver::ServerBuilder;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut server = ServerBuilder::new_configured().build();
///     let _jukebox = server.init_jukebox_configured().await?;
///
///     server.start().await;
///     server.wait().await;
///     Ok(())
/// }
/// ```
pub trait JukeboxExt {
    /// Monte l'API d'un jukebox existant
    ///
    /// # Routes enregistrées
    ///
    /// - `GET /api/jukebox/state` et `GET /api/jukebox/events` (SSE)
    /// - `POST /api/jukebox/{play,pause,next,previous,shuffle,seek,play-track,mode}`
    /// - `POST|DELETE /api/jukebox/playlist...`, `GET|POST|DELETE /api/jukebox/library...`
    /// - `GET /swagger-ui/jukebox`
    async fn init_jukebox(&mut self, jukebox: Jukebox) -> Jukebox;

    /// Ouvre la base configurée, charge l'état persisté et monte l'API
    #[cfg(feature = "pmoconfig")]
    async fn init_jukebox_configured(&mut self) -> anyhow::Result<Jukebox>;
}

impl JukeboxExt for pmoserver::Server {
    async fn init_jukebox(&mut self, jukebox: Jukebox) -> Jukebox {
        let router = crate::api::jukebox_api_router(jukebox.clone());
        self.add_openapi(router, crate::openapi::ApiDoc::openapi(), "jukebox")
            .await;

        info!("Jukebox API available at /api/jukebox/*");
        jukebox
    }

    #[cfg(feature = "pmoconfig")]
    async fn init_jukebox_configured(&mut self) -> anyhow::Result<Jukebox> {
        use crate::{JukeboxConfigExt, SqliteStore};
        use std::sync::Arc;

        let config = pmoconfig::get_config();
        let db_path = config.jukebox_db_path()?;
        info!(path = %db_path.display(), "Opening jukebox database");

        let store = SqliteStore::open(&db_path)?;
        let jukebox = Jukebox::load(Arc::new(store), config.jukebox_options()).await?;

        Ok(self.init_jukebox(jukebox).await)
    }
}
