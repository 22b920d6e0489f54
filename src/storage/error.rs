use thiserror::Error;

use crate::domain::track::TrackId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open database: {0}")]
    Open(#[source] rusqlite::Error),

    #[error("database schema version {found} is newer than this build supports ({supported})")]
    VersionConflict { found: i64, supported: i64 },

    #[error("track {0} already exists")]
    DuplicateId(TrackId),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
