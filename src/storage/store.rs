use chrono::Utc;
use rusqlite::{ErrorCode, OptionalExtension, Row, Transaction, params};

use crate::{
    config,
    domain::track::{
        DEFAULT_AUDIO_TYPE, DEFAULT_COVER, DESCRIPTION_MISSING, GENRE_UNSPECIFIED, NewTrack,
        TrackId, TrackRecord,
    },
    storage::{
        db::ConnectionManager,
        error::StorageError,
        schema::{columns, tables},
    },
};

use columns::*;
use tables::*;

/// Main structure that implements the track catalog operations.
///
/// Every operation obtains a fresh connection from the manager, runs exactly
/// one table-level request inside its own transaction and commits. No
/// transaction spans two public calls.
pub struct TrackStore {
    manager: ConnectionManager,
    /// last issued id tick, keeps rapid successive creates collision-free
    last_tick: i64,
}

impl TrackStore {
    /// when called, opens and migrates the database once to surface problems early
    pub fn new(db_config: &config::Database) -> Result<Self, StorageError> {
        let manager = ConnectionManager::new(db_config)?;
        Ok(Self::from_manager(manager))
    }

    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self {
            manager,
            last_tick: 0,
        }
    }

    /// Stores a new track and returns its generated id.
    ///
    /// The id is the creation instant in milliseconds, bumped past the last
    /// issued tick. The insert is add-only: an existing id is reported as
    /// [`StorageError::DuplicateId`], never overwritten.
    pub fn create(&mut self, new: NewTrack) -> Result<TrackId, StorageError> {
        let id = self.next_id();
        let record = TrackRecord {
            id: id.clone(),
            name: new.name,
            artist: new.artist,
            genre: new.genre.unwrap_or_else(|| GENRE_UNSPECIFIED.to_string()),
            description: new
                .description
                .unwrap_or_else(|| DESCRIPTION_MISSING.to_string()),
            cover: new.cover.unwrap_or_else(|| DEFAULT_COVER.to_string()),
            audio: new.audio,
            audio_type: new
                .audio_type
                .unwrap_or_else(|| DEFAULT_AUDIO_TYPE.to_string()),
            added_at: Utc::now().to_rfc3339(),
        };

        let mut conn = self.manager.open()?;
        let tx = conn.transaction()?;
        insert_record(&tx, &record)?;
        tx.commit()?;

        log::info!("stored track {id}");
        Ok(id)
    }

    /// Returns the full catalog contents. Order is unspecified.
    pub fn list_all(&self) -> Result<Vec<TrackRecord>, StorageError> {
        let mut conn = self.manager.open()?;
        let tx = conn.transaction()?;

        let records = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {ID}, {NAME}, {ARTIST}, {GENRE}, {DESCRIPTION}, {COVER}, {AUDIO}, {AUDIO_TYPE}, {ADDED_AT} FROM {TRACKS}"
            ))?;
            let records = stmt
                .query_map([], row_to_record)?
                .collect::<Result<Vec<_>, _>>()?;
            records
        };

        tx.commit()?;
        Ok(records)
    }

    /// Looks a track up by id. A miss is `None`, not an error.
    pub fn get_by_id(&self, id: &TrackId) -> Result<Option<TrackRecord>, StorageError> {
        let mut conn = self.manager.open()?;
        let tx = conn.transaction()?;

        let record = tx
            .query_row(
                &format!(
                    "SELECT {ID}, {NAME}, {ARTIST}, {GENRE}, {DESCRIPTION}, {COVER}, {AUDIO}, {AUDIO_TYPE}, {ADDED_AT} FROM {TRACKS} WHERE {ID} = ?1"
                ),
                params![id.as_str()],
                row_to_record,
            )
            .optional()?;

        tx.commit()?;
        Ok(record)
    }

    /// Deletes one track. Deleting an id that is not there succeeds.
    pub fn delete_by_id(&self, id: &TrackId) -> Result<(), StorageError> {
        let mut conn = self.manager.open()?;
        let tx = conn.transaction()?;

        let deleted = tx.execute(
            &format!("DELETE FROM {TRACKS} WHERE {ID} = ?1"),
            params![id.as_str()],
        )?;

        tx.commit()?;

        if deleted == 0 {
            log::info!("delete of {id}: nothing to delete");
        } else {
            log::info!("deleted track {id}");
        }
        Ok(())
    }

    /// Removes every track in the catalog.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        let mut conn = self.manager.open()?;
        let tx = conn.transaction()?;

        let deleted = tx.execute(&format!("DELETE FROM {TRACKS}"), [])?;

        tx.commit()?;

        log::info!("cleared catalog, removed {deleted} tracks");
        Ok(())
    }

    fn next_id(&mut self) -> TrackId {
        let now = Utc::now().timestamp_millis();
        let tick = if now > self.last_tick {
            now
        } else {
            self.last_tick + 1
        };
        self.last_tick = tick;
        TrackId::from(tick.to_string())
    }
}

pub(crate) fn insert_record(tx: &Transaction, record: &TrackRecord) -> Result<(), StorageError> {
    let result = tx.execute(
        &format!(
            "INSERT INTO {TRACKS} ({ID}, {NAME}, {ARTIST}, {GENRE}, {DESCRIPTION}, {COVER}, {AUDIO}, {AUDIO_TYPE}, {ADDED_AT})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ),
        params![
            record.id.as_str(),
            record.name,
            record.artist,
            record.genre,
            record.description,
            record.cover,
            record.audio,
            record.audio_type,
            record.added_at,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation =>
        {
            Err(StorageError::DuplicateId(record.id.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

fn row_to_record(row: &Row) -> rusqlite::Result<TrackRecord> {
    Ok(TrackRecord {
        id: TrackId::from(row.get::<_, String>(0)?),
        name: row.get(1)?,
        artist: row.get(2)?,
        genre: row.get(3)?,
        description: row.get(4)?,
        cover: row.get(5)?,
        audio: row.get(6)?,
        audio_type: row.get(7)?,
        added_at: row.get(8)?,
    })
}
