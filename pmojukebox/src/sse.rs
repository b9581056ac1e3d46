//! SSE pour suivre l'état de lecture en direct.
//!
//! Route : `GET /api/jukebox/events`
//!
//! Le premier évènement est toujours l'état courant, puis un évènement `state`
//! par changement. Un client trop lent est éjecté par le hub : le flux se
//! termine et il doit se reconnecter.

use crate::{Jukebox, PlaybackSnapshot};
use async_stream::stream;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
};
use tracing::{debug, warn};

/// Handler SSE : diffuse chaque instantané de l'état de lecture.
#[utoipa::path(
    get,
    path = "/api/jukebox/events",
    tag = "jukebox",
    responses(
        (status = 200, description = "Flux SSE des instantanés (évènement `state`, payload PlaybackSnapshot)", content_type = "text/event-stream")
    )
)]
pub async fn jukebox_events_sse(State(jukebox): State<Jukebox>) -> impl IntoResponse {
    let mut subscription = jukebox.subscribe().await;

    let stream = stream! {
        while let Some(snapshot) = subscription.recv().await {
            if let Some(event) = state_event(&snapshot) {
                yield Ok::<_, axum::Error>(event);
            }
        }
        debug!(subscriber = subscription.id(), "Event stream closed");
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn state_event(snapshot: &PlaybackSnapshot) -> Option<Event> {
    match serde_json::to_string(snapshot) {
        Ok(json) => Some(Event::default().event("state").data(json)),
        Err(e) => {
            warn!("Failed to serialize playback snapshot: {}", e);
            None
        }
    }
}
