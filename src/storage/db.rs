use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use rusqlite::Connection;

use crate::{
    config,
    storage::{error::StorageError, schema},
};

/// Distinguishes shared in-memory databases opened by different managers
/// within the same process
static MEM_DB_SEQ: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug)]
enum DbLocation {
    OnDisk(PathBuf),
    /// named shared-cache database, so that independent opens reach the same data
    InMemory { uri: String },
}

/// Owns the database location and hands out open, schema-correct connections.
///
/// Connections are not pooled: every [`open`](Self::open) call performs a fresh
/// open followed by the migration pass. For in-memory databases the manager
/// keeps one anchor connection alive, otherwise the data would vanish between
/// calls.
#[derive(Debug)]
pub struct ConnectionManager {
    location: DbLocation,
    _anchor: Option<Connection>,
}

impl ConnectionManager {
    /// Builds a manager from the injected config and eagerly opens once, so a
    /// bad location or a version conflict surfaces at startup.
    pub fn new(config: &config::Database) -> Result<Self, StorageError> {
        let location = if config.in_memory {
            let seq = MEM_DB_SEQ.fetch_add(1, Ordering::Relaxed);
            DbLocation::InMemory {
                uri: format!("file:tracklocker-mem-{seq}?mode=memory&cache=shared"),
            }
        } else {
            DbLocation::OnDisk(
                config
                    .path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(schema::DB_FILE_NAME)),
            )
        };

        let mut manager = Self {
            location,
            _anchor: None,
        };
        let conn = manager.open()?;
        if matches!(manager.location, DbLocation::InMemory { .. }) {
            manager._anchor = Some(conn);
        }
        Ok(manager)
    }

    /// Returns a usable connection to the catalog database, running the
    /// upgrade procedure first when the stored schema is stale.
    pub fn open(&self) -> Result<Connection, StorageError> {
        let conn = match &self.location {
            DbLocation::OnDisk(path) => Connection::open(path),
            // rusqlite opens with SQLITE_OPEN_URI by default
            DbLocation::InMemory { uri } => Connection::open(uri),
        }
        .map_err(StorageError::Open)?;

        schema::migrate(&conn)?;
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema;
    use tempfile::tempdir;

    #[test]
    fn open_on_disk_initializes_schema() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let config = config::Database {
            in_memory: false,
            path: Some(dir.path().join("catalog.db")),
        };

        let manager = ConnectionManager::new(&config)?;
        let conn = manager.open()?;

        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table'")?;
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        for table in schema::tables::ALL_TABLES {
            assert!(tables.contains(&table.to_string()));
        }

        Ok(())
    }

    #[test]
    fn in_memory_data_survives_between_opens() -> anyhow::Result<()> {
        let config = config::Database {
            in_memory: true,
            path: None,
        };
        let manager = ConnectionManager::new(&config)?;

        manager.open()?.execute(
            "INSERT INTO tracks (id, name, artist, genre, description, cover, audio, audio_type, added_at)
             VALUES ('1', 'n', 'a', 'g', 'd', 'c', 'x', 'audio/mpeg', 't')",
            [],
        )?;

        let count: i64 =
            manager
                .open()?
                .query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))?;
        assert_eq!(count, 1);

        Ok(())
    }

    #[test]
    fn independent_managers_do_not_share_memory_databases() -> anyhow::Result<()> {
        let config = config::Database {
            in_memory: true,
            path: None,
        };
        let first = ConnectionManager::new(&config)?;
        let second = ConnectionManager::new(&config)?;

        first.open()?.execute(
            "INSERT INTO tracks (id, name, artist, genre, description, cover, audio, audio_type, added_at)
             VALUES ('1', 'n', 'a', 'g', 'd', 'c', 'x', 'audio/mpeg', 't')",
            [],
        )?;

        let count: i64 =
            second
                .open()?
                .query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))?;
        assert_eq!(count, 0);

        Ok(())
    }

    #[test]
    fn open_fails_against_newer_schema_version() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("future.db");

        // a database written by a newer build
        {
            let conn = Connection::open(&path)?;
            conn.pragma_update(None, "user_version", schema::DB_VERSION + 1)?;
        }

        let config = config::Database {
            in_memory: false,
            path: Some(path),
        };
        let err = ConnectionManager::new(&config).unwrap_err();

        assert!(matches!(err, StorageError::VersionConflict { .. }));

        Ok(())
    }
}
