//! Extension de pmoconfig pour le jukebox

use crate::jukebox::{JukeboxOptions, DEFAULT_MAILBOX_CAPACITY, DEFAULT_TICK_INTERVAL};
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

/// Trait d'extension pour pmoconfig::Config
pub trait JukeboxConfigExt {
    /// Chemin de la base SQLite du jukebox (répertoire créé au besoin)
    fn jukebox_db_path(&self) -> Result<PathBuf>;

    /// Période de l'horloge de progression (`jukebox.tick_interval_ms`)
    fn jukebox_tick_interval(&self) -> Duration;

    /// Capacité de la boîte aux lettres d'un abonné (`jukebox.mailbox_capacity`)
    fn jukebox_mailbox_capacity(&self) -> usize;

    fn jukebox_options(&self) -> JukeboxOptions {
        JukeboxOptions {
            tick_interval: self.jukebox_tick_interval(),
            mailbox_capacity: self.jukebox_mailbox_capacity(),
        }
    }
}

impl JukeboxConfigExt for pmoconfig::Config {
    fn jukebox_db_path(&self) -> Result<PathBuf> {
        let dir = self.get_managed_dir(&["jukebox", "directory"], "jukebox")?;
        Ok(dir.join("jukebox.db"))
    }

    fn jukebox_tick_interval(&self) -> Duration {
        match self.get_u64(&["jukebox", "tick_interval_ms"]) {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => DEFAULT_TICK_INTERVAL,
        }
    }

    fn jukebox_mailbox_capacity(&self) -> usize {
        match self.get_u64(&["jukebox", "mailbox_capacity"]) {
            Some(n) if n > 0 => n as usize,
            _ => DEFAULT_MAILBOX_CAPACITY,
        }
    }
}
