//! API REST du jukebox
//!
//! Chaque commande répond `202 Accepted` : le nouvel état arrive par le flux
//! d'évènements (`/api/jukebox/events`).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::state::{PlayMode, PlaybackSnapshot};
use crate::track::TrackSummary;
use crate::{Error, Jukebox};

/// Router `/api/jukebox` combinant les commandes, la bibliothèque et le flux SSE.
pub fn jukebox_api_router(jukebox: Jukebox) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/events", get(crate::sse::jukebox_events_sse))
        .route("/play", post(play))
        .route("/pause", post(pause))
        .route("/next", post(next))
        .route("/previous", post(previous))
        .route("/shuffle", post(shuffle))
        .route("/seek", post(seek))
        .route("/play-track", post(play_track))
        .route("/mode", post(set_mode))
        .route("/playlist", post(add_to_playlist))
        .route("/playlist/reorder", post(reorder))
        .route("/playlist/{track_id}", delete(remove_from_playlist))
        .route("/library", get(list_library).post(register_track))
        .route("/library/{track_id}", delete(remove_from_library))
        .with_state(jukebox)
}

/// Requête de positionnement
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeekRequest {
    #[schema(example = 42000)]
    pub position_ms: i64,
}

/// Requête désignant un morceau
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub track_id: String,
}

/// Requête de changement de mode
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayModeRequest {
    pub play_mode: PlayMode,
}

/// Requête de déplacement dans la playlist
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub track_id: String,
    #[schema(example = 0)]
    pub new_index: i64,
}

/// Réponse d'erreur REST générique.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/api/jukebox/state",
    tag = "jukebox",
    responses(
        (status = 200, description = "État de lecture courant", body = PlaybackSnapshot)
    )
)]
pub async fn get_state(State(jukebox): State<Jukebox>) -> Json<PlaybackSnapshot> {
    Json(jukebox.snapshot().await)
}

#[utoipa::path(
    post,
    path = "/api/jukebox/play",
    tag = "jukebox",
    responses((status = 202, description = "Lecture lancée (ou déjà en cours)"))
)]
pub async fn play(State(jukebox): State<Jukebox>) -> Response {
    accepted(jukebox.play().await)
}

#[utoipa::path(
    post,
    path = "/api/jukebox/pause",
    tag = "jukebox",
    responses((status = 202, description = "Lecture en pause"))
)]
pub async fn pause(State(jukebox): State<Jukebox>) -> Response {
    accepted(jukebox.pause().await)
}

#[utoipa::path(
    post,
    path = "/api/jukebox/next",
    tag = "jukebox",
    responses((status = 202, description = "Morceau suivant"))
)]
pub async fn next(State(jukebox): State<Jukebox>) -> Response {
    accepted(jukebox.next().await)
}

#[utoipa::path(
    post,
    path = "/api/jukebox/previous",
    tag = "jukebox",
    responses((status = 202, description = "Morceau précédent"))
)]
pub async fn previous(State(jukebox): State<Jukebox>) -> Response {
    accepted(jukebox.previous().await)
}

#[utoipa::path(
    post,
    path = "/api/jukebox/shuffle",
    tag = "jukebox",
    responses((status = 202, description = "Playlist mélangée"))
)]
pub async fn shuffle(State(jukebox): State<Jukebox>) -> Response {
    accepted(jukebox.shuffle().await)
}

#[utoipa::path(
    post,
    path = "/api/jukebox/seek",
    tag = "jukebox",
    request_body = SeekRequest,
    responses(
        (status = 202, description = "Position mise à jour"),
        (status = 409, description = "Aucun morceau chargé", body = ErrorResponse)
    )
)]
pub async fn seek(State(jukebox): State<Jukebox>, Json(req): Json<SeekRequest>) -> Response {
    accepted(jukebox.seek(req.position_ms).await)
}

#[utoipa::path(
    post,
    path = "/api/jukebox/play-track",
    tag = "jukebox",
    request_body = TrackRequest,
    responses(
        (status = 202, description = "Lecture du morceau depuis le début"),
        (status = 404, description = "Morceau absent de la playlist", body = ErrorResponse)
    )
)]
pub async fn play_track(State(jukebox): State<Jukebox>, Json(req): Json<TrackRequest>) -> Response {
    accepted(jukebox.play_specific(&req.track_id).await)
}

#[utoipa::path(
    post,
    path = "/api/jukebox/mode",
    tag = "jukebox",
    request_body = PlayModeRequest,
    responses((status = 202, description = "Mode de lecture modifié"))
)]
pub async fn set_mode(State(jukebox): State<Jukebox>, Json(req): Json<PlayModeRequest>) -> Response {
    accepted(jukebox.set_play_mode(req.play_mode).await)
}

#[utoipa::path(
    post,
    path = "/api/jukebox/playlist",
    tag = "jukebox",
    request_body = TrackRequest,
    responses(
        (status = 202, description = "Morceau ajouté en fin de playlist"),
        (status = 404, description = "Morceau inconnu de la bibliothèque", body = ErrorResponse)
    )
)]
pub async fn add_to_playlist(
    State(jukebox): State<Jukebox>,
    Json(req): Json<TrackRequest>,
) -> Response {
    accepted(jukebox.add_to_playlist(&req.track_id).await)
}

#[utoipa::path(
    delete,
    path = "/api/jukebox/playlist/{track_id}",
    tag = "jukebox",
    params(("track_id" = String, Path, description = "Identifiant du morceau")),
    responses(
        (status = 202, description = "Morceau retiré de la playlist"),
        (status = 404, description = "Morceau absent de la playlist", body = ErrorResponse)
    )
)]
pub async fn remove_from_playlist(
    State(jukebox): State<Jukebox>,
    Path(track_id): Path<String>,
) -> Response {
    accepted(jukebox.remove_from_playlist(&track_id).await)
}

#[utoipa::path(
    post,
    path = "/api/jukebox/playlist/reorder",
    tag = "jukebox",
    request_body = ReorderRequest,
    responses(
        (status = 202, description = "Morceau déplacé"),
        (status = 400, description = "Indice hors limites", body = ErrorResponse),
        (status = 404, description = "Morceau absent de la playlist", body = ErrorResponse)
    )
)]
pub async fn reorder(State(jukebox): State<Jukebox>, Json(req): Json<ReorderRequest>) -> Response {
    accepted(jukebox.reorder(&req.track_id, req.new_index).await)
}

#[utoipa::path(
    get,
    path = "/api/jukebox/library",
    tag = "jukebox",
    responses(
        (status = 200, description = "Bibliothèque triée par titre", body = [TrackSummary])
    )
)]
pub async fn list_library(State(jukebox): State<Jukebox>) -> Response {
    match jukebox.library() {
        Ok(tracks) => (StatusCode::OK, Json(tracks)).into_response(),
        Err(err) => map_error(err),
    }
}

#[utoipa::path(
    post,
    path = "/api/jukebox/library",
    tag = "jukebox",
    request_body = TrackSummary,
    responses(
        (status = 202, description = "Métadonnées enregistrées"),
        (status = 400, description = "Requête invalide", body = ErrorResponse)
    )
)]
pub async fn register_track(
    State(jukebox): State<Jukebox>,
    Json(track): Json<TrackSummary>,
) -> Response {
    if track.id.trim().is_empty() {
        return map_status(
            StatusCode::BAD_REQUEST,
            "INVALID_ID",
            "Track id cannot be empty",
        );
    }
    accepted(jukebox.register_track(track).await)
}

#[utoipa::path(
    delete,
    path = "/api/jukebox/library/{track_id}",
    tag = "jukebox",
    params(("track_id" = String, Path, description = "Identifiant du morceau")),
    responses(
        (status = 202, description = "Morceau supprimé de la bibliothèque"),
        (status = 404, description = "Morceau inconnu", body = ErrorResponse)
    )
)]
pub async fn remove_from_library(
    State(jukebox): State<Jukebox>,
    Path(track_id): Path<String>,
) -> Response {
    accepted(jukebox.remove_from_library(&track_id).await)
}

fn accepted(result: crate::Result<()>) -> Response {
    match result {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => map_error(err),
    }
}

fn map_error(err: Error) -> Response {
    match &err {
        Error::TrackNotFound(_) => map_status(StatusCode::NOT_FOUND, "TRACK_NOT_FOUND", err),
        Error::NotInPlaylist(_) => map_status(StatusCode::NOT_FOUND, "NOT_IN_PLAYLIST", err),
        Error::OutOfRange { .. } => map_status(StatusCode::BAD_REQUEST, "OUT_OF_RANGE", err),
        Error::InvalidState(_) => map_status(StatusCode::CONFLICT, "INVALID_STATE", err),
        Error::PersistenceError(_) | Error::Other(_) => {
            error!("Jukebox API error: {}", err);
            map_status(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", err)
        }
    }
}

fn map_status(status: StatusCode, code: &str, message: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}
