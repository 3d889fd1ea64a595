//! SQLite persistence for per-user data: listening history, search
//! history, playlists and liked tracks.

pub mod models;

pub use models::{HistoryEntry, LikedTrack, Playlist, PlaylistSummary, SearchEntry, TrackRef, User};

use anyhow::Context;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 8;

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
  code TEXT PRIMARY KEY,
  created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS listening_history (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_code TEXT NOT NULL REFERENCES users(code) ON DELETE CASCADE,
  track_id INTEGER NOT NULL,
  title TEXT NOT NULL,
  artist TEXT NOT NULL,
  played_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_history_user_played ON listening_history(user_code, played_at DESC);

CREATE TABLE IF NOT EXISTS search_history (
  user_code TEXT NOT NULL REFERENCES users(code) ON DELETE CASCADE,
  query TEXT NOT NULL,
  searched_at INTEGER NOT NULL,
  PRIMARY KEY (user_code, query)
);

CREATE TABLE IF NOT EXISTS playlists (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_code TEXT NOT NULL REFERENCES users(code) ON DELETE CASCADE,
  name TEXT NOT NULL,
  created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS playlist_tracks (
  playlist_id INTEGER NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
  track_id INTEGER NOT NULL,
  title TEXT NOT NULL,
  artist TEXT NOT NULL,
  position INTEGER NOT NULL,
  added_at INTEGER NOT NULL,
  PRIMARY KEY (playlist_id, track_id)
);

CREATE TABLE IF NOT EXISTS liked_tracks (
  user_code TEXT NOT NULL REFERENCES users(code) ON DELETE CASCADE,
  track_id INTEGER NOT NULL,
  title TEXT NOT NULL,
  artist TEXT NOT NULL,
  liked_at INTEGER NOT NULL,
  PRIMARY KEY (user_code, track_id)
);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    /// Create a user under a fresh random code.
    pub fn create_user(&self, now_unix: i64) -> anyhow::Result<User> {
        let mut rng = rand::rng();
        for _ in 0..8 {
            let code: String = (0..CODE_LEN)
                .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
                .collect();
            let inserted = self
                .conn
                .execute(
                    "INSERT OR IGNORE INTO users(code, created_at) VALUES(?1, ?2)",
                    params![code, now_unix],
                )
                .context("insert user")?;
            if inserted == 1 {
                return Ok(User {
                    code,
                    created_at: now_unix,
                });
            }
        }
        anyhow::bail!("could not allocate a unique user code")
    }

    pub fn user(&self, code: &str) -> anyhow::Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT code, created_at FROM users WHERE code=?1",
                params![code],
                |row| {
                    Ok(User {
                        code: row.get(0)?,
                        created_at: row.get(1)?,
                    })
                },
            )
            .optional()
            .context("query user")
    }

    pub fn add_history(&self, code: &str, track: &TrackRef, played_at: i64) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO listening_history(user_code, track_id, title, artist, played_at)
VALUES(?1, ?2, ?3, ?4, ?5)
"#,
                params![code, track.track_id as i64, track.title, track.artist, played_at],
            )
            .context("add to history")?;
        Ok(())
    }

    /// Most recent first.
    pub fn history(&self, code: &str, limit: u32) -> anyhow::Result<Vec<HistoryEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
SELECT track_id, title, artist, played_at
FROM listening_history
WHERE user_code=?1
ORDER BY played_at DESC, id DESC
LIMIT ?2
"#,
            )
            .context("prepare history")?;
        let rows = stmt
            .query_map(params![code, limit], |row| {
                Ok(HistoryEntry {
                    track: track_ref(row)?,
                    played_at: row.get(3)?,
                })
            })
            .context("query history")?;
        rows.collect::<Result<Vec<_>, _>>().context("read history rows")
    }

    pub fn clear_history(&self, code: &str) -> anyhow::Result<usize> {
        self.conn
            .execute("DELETE FROM listening_history WHERE user_code=?1", params![code])
            .context("clear history")
    }

    /// Re-searching a query moves it back to the top.
    pub fn add_search(&self, code: &str, query: &str, searched_at: i64) -> anyhow::Result<()> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }
        self.conn
            .execute(
                "DELETE FROM search_history WHERE user_code=?1 AND query=?2",
                params![code, query],
            )
            .context("drop previous search")?;
        self.conn
            .execute(
                "INSERT INTO search_history(user_code, query, searched_at) VALUES(?1, ?2, ?3)",
                params![code, query, searched_at],
            )
            .context("add search")?;
        Ok(())
    }

    pub fn searches(&self, code: &str, limit: u32) -> anyhow::Result<Vec<SearchEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
SELECT query, searched_at
FROM search_history
WHERE user_code=?1
ORDER BY searched_at DESC, rowid DESC
LIMIT ?2
"#,
            )
            .context("prepare searches")?;
        let rows = stmt
            .query_map(params![code, limit], |row| {
                Ok(SearchEntry {
                    query: row.get(0)?,
                    searched_at: row.get(1)?,
                })
            })
            .context("query searches")?;
        rows.collect::<Result<Vec<_>, _>>().context("read search rows")
    }

    pub fn clear_searches(&self, code: &str) -> anyhow::Result<usize> {
        self.conn
            .execute("DELETE FROM search_history WHERE user_code=?1", params![code])
            .context("clear searches")
    }

    pub fn create_playlist(&self, code: &str, name: &str, now_unix: i64) -> anyhow::Result<PlaylistSummary> {
        self.conn
            .execute(
                "INSERT INTO playlists(user_code, name, created_at) VALUES(?1, ?2, ?3)",
                params![code, name, now_unix],
            )
            .context("create playlist")?;
        Ok(PlaylistSummary {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            created_at: now_unix,
            track_count: 0,
        })
    }

    pub fn playlists(&self, code: &str) -> anyhow::Result<Vec<PlaylistSummary>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
SELECT p.id, p.name, p.created_at, COUNT(t.track_id)
FROM playlists p
LEFT JOIN playlist_tracks t ON t.playlist_id = p.id
WHERE p.user_code=?1
GROUP BY p.id
ORDER BY p.created_at DESC, p.id DESC
"#,
            )
            .context("prepare playlists")?;
        let rows = stmt
            .query_map(params![code], |row| {
                Ok(PlaylistSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                    track_count: row.get(3)?,
                })
            })
            .context("query playlists")?;
        rows.collect::<Result<Vec<_>, _>>().context("read playlist rows")
    }

    /// `None` when the playlist does not exist or belongs to another user.
    pub fn playlist(&self, code: &str, id: i64) -> anyhow::Result<Option<Playlist>> {
        let head = self
            .conn
            .query_row(
                "SELECT name, created_at FROM playlists WHERE id=?1 AND user_code=?2",
                params![id, code],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()
            .context("query playlist")?;
        let Some((name, created_at)) = head else {
            return Ok(None);
        };

        let mut stmt = self
            .conn
            .prepare(
                r#"
SELECT track_id, title, artist
FROM playlist_tracks
WHERE playlist_id=?1
ORDER BY position ASC
"#,
            )
            .context("prepare playlist tracks")?;
        let tracks = stmt
            .query_map(params![id], track_ref)
            .context("query playlist tracks")?
            .collect::<Result<Vec<_>, _>>()
            .context("read playlist track rows")?;

        Ok(Some(Playlist {
            id,
            name,
            created_at,
            tracks,
        }))
    }

    pub fn delete_playlist(&self, code: &str, id: i64) -> anyhow::Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM playlists WHERE id=?1 AND user_code=?2",
                params![id, code],
            )
            .context("delete playlist")?;
        Ok(removed > 0)
    }

    /// Append a track; adding a track already present is a no-op.
    /// Returns false when the playlist is not the user's.
    pub fn add_playlist_track(
        &self,
        code: &str,
        playlist_id: i64,
        track: &TrackRef,
        now_unix: i64,
    ) -> anyhow::Result<bool> {
        if !self.owns_playlist(code, playlist_id)? {
            return Ok(false);
        }
        self.conn
            .execute(
                r#"
INSERT OR IGNORE INTO playlist_tracks(playlist_id, track_id, title, artist, position, added_at)
VALUES(?1, ?2, ?3, ?4,
  (SELECT COALESCE(MAX(position), -1) + 1 FROM playlist_tracks WHERE playlist_id=?1),
  ?5)
"#,
                params![playlist_id, track.track_id as i64, track.title, track.artist, now_unix],
            )
            .context("add playlist track")?;
        Ok(true)
    }

    pub fn remove_playlist_track(&self, code: &str, playlist_id: i64, track_id: u64) -> anyhow::Result<bool> {
        if !self.owns_playlist(code, playlist_id)? {
            return Ok(false);
        }
        let removed = self
            .conn
            .execute(
                "DELETE FROM playlist_tracks WHERE playlist_id=?1 AND track_id=?2",
                params![playlist_id, track_id as i64],
            )
            .context("remove playlist track")?;
        Ok(removed > 0)
    }

    fn owns_playlist(&self, code: &str, playlist_id: i64) -> anyhow::Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM playlists WHERE id=?1 AND user_code=?2",
                params![playlist_id, code],
                |_| Ok(()),
            )
            .optional()
            .context("check playlist owner")?;
        Ok(found.is_some())
    }

    pub fn like(&self, code: &str, track: &TrackRef, now_unix: i64) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO liked_tracks(user_code, track_id, title, artist, liked_at)
VALUES(?1, ?2, ?3, ?4, ?5)
ON CONFLICT(user_code, track_id) DO UPDATE SET
  title=excluded.title,
  artist=excluded.artist
"#,
                params![code, track.track_id as i64, track.title, track.artist, now_unix],
            )
            .context("like track")?;
        Ok(())
    }

    pub fn unlike(&self, code: &str, track_id: u64) -> anyhow::Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM liked_tracks WHERE user_code=?1 AND track_id=?2",
                params![code, track_id as i64],
            )
            .context("unlike track")?;
        Ok(removed > 0)
    }

    pub fn likes(&self, code: &str) -> anyhow::Result<Vec<LikedTrack>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
SELECT track_id, title, artist, liked_at
FROM liked_tracks
WHERE user_code=?1
ORDER BY liked_at DESC, rowid DESC
"#,
            )
            .context("prepare likes")?;
        let rows = stmt
            .query_map(params![code], |row| {
                Ok(LikedTrack {
                    track: track_ref(row)?,
                    liked_at: row.get(3)?,
                })
            })
            .context("query likes")?;
        rows.collect::<Result<Vec<_>, _>>().context("read like rows")
    }
}

fn track_ref(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrackRef> {
    Ok(TrackRef {
        track_id: row.get::<_, i64>(0)? as u64,
        title: row.get(1)?,
        artist: row.get(2)?,
    })
}

pub fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Cheap to clone; every operation opens its own connection on the
/// blocking pool.
#[derive(Debug, Clone)]
pub struct StorageHandle {
    path: PathBuf,
}

impl StorageHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the database and schema up front so startup fails loudly.
    pub fn init(&self) -> anyhow::Result<()> {
        Storage::open(&self.path).map(|_| ())
    }

    pub async fn run<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> anyhow::Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let storage = Storage::open(&path)?;
            f(&storage)
        })
        .await
        .context("storage task panicked")?
    }

    /// Like [`run`](Self::run), but yields `None` when `code` is unknown.
    pub async fn for_user<T, F>(&self, code: &str, f: F) -> anyhow::Result<Option<T>>
    where
        T: Send + 'static,
        F: FnOnce(&Storage, &str) -> anyhow::Result<T> + Send + 'static,
    {
        let code = code.to_string();
        self.run(move |s| {
            if s.user(&code)?.is_none() {
                return Ok(None);
            }
            f(s, &code).map(Some)
        })
        .await
    }
}
