//! Size checks and data-URL encoding for uploaded media files

use std::{fmt::Display, fs, path::Path};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;

use crate::domain::track::DEFAULT_AUDIO_TYPE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Audio,
    Image,
}

impl PayloadKind {
    /// MIME type embedded when the path gives no usable guess
    fn fallback_mime(&self) -> &'static str {
        match self {
            PayloadKind::Audio => DEFAULT_AUDIO_TYPE,
            PayloadKind::Image => "application/octet-stream",
        }
    }
}

impl Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadKind::Audio => write!(f, "audio file"),
            PayloadKind::Image => write!(f, "image"),
        }
    }
}

/// Maximum upload size for one kind of payload
#[derive(Debug, Clone, Copy)]
pub struct SizePolicy {
    pub kind: PayloadKind,
    pub max_mb: u64,
}

impl SizePolicy {
    pub fn audio(max_mb: u64) -> Self {
        Self {
            kind: PayloadKind::Audio,
            max_mb,
        }
    }

    pub fn image(max_mb: u64) -> Self {
        Self {
            kind: PayloadKind::Image,
            max_mb,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_mb * 1024 * 1024
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{kind} is too large: {actual_bytes} bytes, the limit is {limit_mb} MB")]
    SizeExceeded {
        kind: PayloadKind,
        limit_mb: u64,
        actual_bytes: u64,
    },

    #[error("failed to read {kind}: {source}")]
    Read {
        kind: PayloadKind,
        #[source]
        source: std::io::Error,
    },
}

/// An upload converted to its storable form
#[derive(Debug, Clone)]
pub struct EncodedUpload {
    /// `data:<mime>;base64,<payload>`, usable directly as a media source
    pub data_url: String,
    pub mime: String,
}

/// Encodes raw payload bytes into a data URL, enforcing the size policy.
///
/// A payload exactly at the limit is accepted.
pub fn encode_bytes(bytes: &[u8], mime: &str, policy: SizePolicy) -> Result<String, MediaError> {
    if bytes.len() as u64 > policy.max_bytes() {
        return Err(MediaError::SizeExceeded {
            kind: policy.kind,
            limit_mb: policy.max_mb,
            actual_bytes: bytes.len() as u64,
        });
    }
    Ok(format!("data:{mime};base64,{}", BASE64.encode(bytes)))
}

/// Reads a file from disk and encodes it into a data URL.
///
/// The on-disk size is checked against the policy before the file is read, so
/// an oversized upload is rejected without pulling it into memory.
pub fn encode_upload(path: &Path, policy: SizePolicy) -> Result<EncodedUpload, MediaError> {
    let read_err = |source| MediaError::Read {
        kind: policy.kind,
        source,
    };

    let meta = fs::metadata(path).map_err(read_err)?;
    if meta.len() > policy.max_bytes() {
        return Err(MediaError::SizeExceeded {
            kind: policy.kind,
            limit_mb: policy.max_mb,
            actual_bytes: meta.len(),
        });
    }

    let bytes = fs::read(path).map_err(read_err)?;
    let mime = mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| policy.kind.fallback_mime().to_string());

    let data_url = encode_bytes(&bytes, &mime, policy)?;
    Ok(EncodedUpload { data_url, mime })
}
