use rusqlite::Connection;

use crate::storage::error::StorageError;

/// Compiled-in schema version, compared against `PRAGMA user_version` on open.
/// Bump it to force an upgrade pass on existing databases.
pub const DB_VERSION: i64 = 3;

/// Database file name used when the config does not name one
pub const DB_FILE_NAME: &str = "tracklocker.db";

pub mod tables {
    pub const TRACKS: &str = "tracks";

    pub const ALL_TABLES: &[&str] = &[TRACKS];
}

pub mod columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const ARTIST: &str = "artist";
    pub const GENRE: &str = "genre";
    pub const DESCRIPTION: &str = "description";
    pub const COVER: &str = "cover";
    pub const AUDIO: &str = "audio";
    pub const AUDIO_TYPE: &str = "audio_type";
    pub const ADDED_AT: &str = "added_at";
}

pub mod indices {
    pub const TRACKS_NAME: &str = "idx_tracks_name";
}

pub use columns::*;
pub use tables::*;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tracks (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    artist TEXT NOT NULL,
    genre TEXT NOT NULL,
    description TEXT NOT NULL,
    cover TEXT NOT NULL,
    audio TEXT NOT NULL,
    audio_type TEXT NOT NULL,
    added_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tracks_name ON tracks (name);
"#;

/// Brings an opened database up to [`DB_VERSION`].
///
/// The create step is guarded by IF NOT EXISTS and runs on every upgrade pass,
/// so re-running against a database where it already applied is a no-op. The
/// version-specific gates below are reserved for future field backfills.
/// A database written by a newer build is refused, never downgraded.
pub fn migrate(conn: &Connection) -> Result<(), StorageError> {
    let found: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if found > DB_VERSION {
        return Err(StorageError::VersionConflict {
            found,
            supported: DB_VERSION,
        });
    }
    if found == DB_VERSION {
        return Ok(());
    }

    conn.execute_batch(SCHEMA)?;

    if found < 2 {
        // v2: reserved, no data to backfill yet
    }
    if found < 3 {
        // v3: reserved, no data to backfill yet
    }

    conn.pragma_update(None, "user_version", DB_VERSION)?;
    log::info!("migrated database schema from version {found} to {DB_VERSION}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn fresh_database_gets_schema_and_version() -> anyhow::Result<()> {
        let conn = Connection::open_in_memory()?;

        migrate(&conn)?;

        let tables = table_names(&conn);
        for table in tables::ALL_TABLES {
            assert!(tables.contains(&table.to_string()));
        }

        let index_exists: bool = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                rusqlite::params![indices::TRACKS_NAME, tables::TRACKS],
                |_| Ok(true),
            )
            .unwrap_or(false);
        assert!(index_exists);

        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        assert_eq!(version, DB_VERSION);

        Ok(())
    }

    #[test]
    fn migrate_is_idempotent() -> anyhow::Result<()> {
        let conn = Connection::open_in_memory()?;

        migrate(&conn)?;
        migrate(&conn)?;

        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        assert_eq!(version, DB_VERSION);

        Ok(())
    }

    #[test]
    fn upgrades_v1_database_without_touching_rows() -> anyhow::Result<()> {
        let conn = Connection::open_in_memory()?;

        // a database as an old v1 build would have left it
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", 1)?;
        conn.execute(
            "INSERT INTO tracks (id, name, artist, genre, description, cover, audio, audio_type, added_at)
             VALUES ('1', 'Song A', 'Artist X', 'Rock', 'old', 'c', 'a', 'audio/mpeg', 't')",
            [],
        )?;

        migrate(&conn)?;

        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        assert_eq!(version, DB_VERSION);

        let name: String =
            conn.query_row("SELECT name FROM tracks WHERE id = '1'", [], |row| {
                row.get(0)
            })?;
        assert_eq!(name, "Song A");

        Ok(())
    }

    #[test]
    fn refuses_database_from_newer_build() -> anyhow::Result<()> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "user_version", DB_VERSION + 1)?;

        let err = migrate(&conn).unwrap_err();

        assert!(matches!(
            err,
            StorageError::VersionConflict {
                found,
                supported: DB_VERSION,
            } if found == DB_VERSION + 1
        ));

        Ok(())
    }
}
