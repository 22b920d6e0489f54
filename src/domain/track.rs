use std::fmt::Display;

/// Genre value stored when the user leaves the field empty
pub const GENRE_UNSPECIFIED: &str = "Unspecified";

/// Description value stored when the user leaves the field empty
pub const DESCRIPTION_MISSING: &str = "No description";

/// Playback MIME type used when the audio upload carries none
pub const DEFAULT_AUDIO_TYPE: &str = "audio/mpeg";

/// Built-in placeholder cover, a small grey SVG shipped as a data URL.
/// Stored verbatim for tracks added without cover art.
pub const DEFAULT_COVER: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iMjAwIiBoZWlnaHQ9IjIwMCIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj48cmVjdCB3aWR0aD0iMjAwIiBoZWlnaHQ9IjIwMCIgZmlsbD0iI2UwZTBlMCIvPjx0ZXh0IHg9IjEwMCIgeT0iMTAwIiBmb250LWZhbWlseT0iQXJpYWwiIGZvbnQtc2l6ZT0iMTgiIGZpbGw9IiM5OTk5OTkiIHRleHQtYW5jaG9yPSJtaWRkbGUiIGR5PSIuM2VtIj7QntCx0YnQuNC5INC30LDQtNCw0YfQuDwvdGV4dD48L3N2Zz4=";

/// Represents the track ID.
///
/// Generated by the store at creation time, unique for the lifetime of the
/// database and never reused after deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(String);

impl TrackId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A track as persisted in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    pub id: TrackId,
    pub name: String,
    pub artist: String,
    pub genre: String,
    pub description: String,
    /// cover art as a data URL, [`DEFAULT_COVER`] when none was uploaded
    pub cover: String,
    /// the uploaded audio as a data URL, playable without a decode step
    pub audio: String,
    pub audio_type: String,
    /// RFC 3339 creation instant, assigned by the store
    pub added_at: String,
}

/// A track about to be created: everything the store does not assign itself.
///
/// `name`, `artist` and `audio` are required and must be validated non-empty
/// by the caller; the optional fields fall back to the sentinels above.
#[derive(Debug, Clone)]
pub struct NewTrack {
    pub name: String,
    pub artist: String,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover: Option<String>,
    pub audio: String,
    pub audio_type: Option<String>,
}
