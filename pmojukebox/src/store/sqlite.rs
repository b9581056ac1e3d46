//! Persistance SQLite

use super::{PlaybackStore, StateKey};
use crate::track::{PlaylistEntry, TrackSummary};
use crate::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Stockage SQLite (une base pour la bibliothèque, la playlist et l'état)
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Ouvre (ou crée) la base et son schéma
    pub fn open(db_path: &Path) -> Result<Self> {
        // Créer le répertoire parent si nécessaire
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                crate::Error::PersistenceError(format!("Failed to create directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| {
            crate::Error::PersistenceError(format!("Failed to open database: {}", e))
        })?;

        Self::with_connection(conn)
    }

    /// Base en mémoire (tests, démonstrations)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            crate::Error::PersistenceError(format!("Failed to open database: {}", e))
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS tracks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                artist TEXT,
                album TEXT,
                duration_ms INTEGER,
                source_locator TEXT
            );

            CREATE TABLE IF NOT EXISTS playlist_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                track_id TEXT NOT NULL,
                item_order INTEGER NOT NULL,
                FOREIGN KEY (track_id) REFERENCES tracks(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_playlist_items_order ON playlist_items(item_order);

            CREATE TABLE IF NOT EXISTS system_state (
                key TEXT PRIMARY KEY,
                value TEXT
            );",
        )
        .map_err(|e| crate::Error::PersistenceError(format!("Failed to create schema: {}", e)))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| crate::Error::PersistenceError("Database mutex poisoned".into()))
    }
}

/// Lit `id, title, artist, album, duration_ms, source_locator` à partir de la colonne `first`
fn track_from_row(row: &rusqlite::Row<'_>, first: usize) -> rusqlite::Result<TrackSummary> {
    Ok(TrackSummary {
        id: row.get(first)?,
        title: row.get(first + 1)?,
        artist: row.get::<_, Option<String>>(first + 2)?.unwrap_or_default(),
        album: row.get::<_, Option<String>>(first + 3)?.unwrap_or_default(),
        duration_ms: row.get::<_, Option<i64>>(first + 4)?.unwrap_or_default(),
        source_locator: row.get::<_, Option<String>>(first + 5)?.unwrap_or_default(),
    })
}

impl PlaybackStore for SqliteStore {
    fn load_playlist(&self) -> Result<Vec<PlaylistEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT p.track_id, t.id, t.title, t.artist, t.album, t.duration_ms, t.source_locator
             FROM playlist_items p
             LEFT JOIN tracks t ON t.id = p.track_id
             ORDER BY p.item_order ASC, p.id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let track_id: String = row.get(0)?;
            let resolved: Option<String> = row.get(1)?;
            let track = match resolved {
                Some(_) => Some(track_from_row(row, 1)?),
                None => None,
            };
            Ok((track_id, track))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (track_id, track) = row?;
            match track {
                Some(track) => {
                    let position = entries.len();
                    entries.push(PlaylistEntry::new(track, position));
                }
                None => {
                    tracing::warn!(
                        track_id = %track_id,
                        "Track in playlist not found in library, skipping"
                    );
                }
            }
        }

        Ok(entries)
    }

    fn replace_playlist(&self, track_ids: &[String]) -> Result<()> {
        let mut conn = self.conn()?;

        // Transaction : la playlist est réécrite d'un bloc ou pas du tout
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM playlist_items", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO playlist_items (track_id, item_order) VALUES (?1, ?2)")?;
            for (i, track_id) in track_ids.iter().enumerate() {
                stmt.execute(params![track_id, i as i64])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    fn get_scalar(&self, key: StateKey) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM system_state WHERE key = ?1",
                params![key.as_str()],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    fn set_scalar(&self, key: StateKey, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO system_state (key, value) VALUES (?1, ?2)",
            params![key.as_str(), value],
        )?;
        Ok(())
    }

    fn get_track(&self, id: &str) -> Result<Option<TrackSummary>> {
        let conn = self.conn()?;
        let track = conn
            .query_row(
                "SELECT id, title, artist, album, duration_ms, source_locator
                 FROM tracks WHERE id = ?1",
                params![id],
                |row| track_from_row(row, 0),
            )
            .optional()?;
        Ok(track)
    }

    fn delete_track(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM tracks WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn add_track(&self, track: &TrackSummary) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            // Upsert : un REPLACE supprimerait la ligne, et ses entrées de playlist en cascade
            "INSERT INTO tracks (id, title, artist, album, duration_ms, source_locator)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                artist = excluded.artist,
                album = excluded.album,
                duration_ms = excluded.duration_ms,
                source_locator = excluded.source_locator",
            params![
                track.id,
                track.title,
                track.artist,
                track.album,
                track.duration_ms,
                track.source_locator,
            ],
        )?;
        Ok(())
    }

    fn list_tracks(&self) -> Result<Vec<TrackSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, artist, album, duration_ms, source_locator
             FROM tracks ORDER BY title",
        )?;
        let rows = stmt.query_map([], |row| track_from_row(row, 0))?;

        let mut tracks = Vec::new();
        for row in rows {
            tracks.push(row?);
        }
        Ok(tracks)
    }
}
