//! Documentation OpenAPI pour l'API jukebox.

use utoipa::OpenApi;

/// Documentation OpenAPI de l'API jukebox (commandes + flux SSE).
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::get_state,
        crate::api::play,
        crate::api::pause,
        crate::api::next,
        crate::api::previous,
        crate::api::shuffle,
        crate::api::seek,
        crate::api::play_track,
        crate::api::set_mode,
        crate::api::add_to_playlist,
        crate::api::remove_from_playlist,
        crate::api::reorder,
        crate::api::list_library,
        crate::api::register_track,
        crate::api::remove_from_library,
        crate::sse::jukebox_events_sse,
    ),
    components(
        schemas(
            crate::state::PlaybackSnapshot,
            crate::state::PlayMode,
            crate::track::TrackSummary,
            crate::track::PlaylistEntry,
            crate::api::SeekRequest,
            crate::api::TrackRequest,
            crate::api::PlayModeRequest,
            crate::api::ReorderRequest,
            crate::api::ErrorResponse,
        )
    ),
    tags(
        (name = "jukebox", description = "Lecture partagée : commandes, playlist, bibliothèque")
    ),
    info(
        title = "PMO Jukebox API",
        version = "0.1.0",
        description = r#"
# Jukebox partagé

Un seul état de lecture pour tous les clients. Les commandes répondent
`202 Accepted` ; le nouvel état est poussé sur `GET /api/jukebox/events`.

Payload JSON de l'évènement `state` :
- `isPlaying` : lecture en cours
- `currentTrackId` / `currentTrack` : morceau courant (ou `null`)
- `playlist` : entrées ordonnées (`trackId`, `position`, `track`)
- `currentIndex` : indice du morceau courant, `-1` si aucun
- `progressMs` : position dans le morceau
- `playMode` : `REPEAT_ALL`, `REPEAT_ONE` ou `SHUFFLE`
        "#,
        license(
            name = "MIT",
        ),
    )
)]
pub struct ApiDoc;
