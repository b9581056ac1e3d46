//! Horloge de progression
//!
//! Une tâche tokio par génération. Elle ne garde qu'une référence faible sur
//! le jukebox : quand celui-ci disparaît, l'horloge s'arrête. Une génération
//! périmée (pause, changement de morceau, seek) s'arrête au tick suivant sans
//! rien modifier.

use crate::jukebox::{Jukebox, JukeboxInner};
use std::sync::Weak;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

pub(crate) fn spawn(inner: Weak<JukeboxInner>, generation: u64, period: Duration) {
    // Premier tick exactement une période après la remise à zéro de lastTick
    let start = Instant::now() + period;
    tokio::spawn(async move {
        let mut interval = interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let Some(inner) = inner.upgrade() else {
                debug!(generation, "Jukebox dropped, progress clock exits");
                break;
            };

            if !Jukebox::from_inner(inner).on_tick(generation).await {
                debug!(generation, "Progress clock stopped");
                break;
            }
        }
    });
}
