//! Failure taxonomy shared by every stage of the refresh cycle.
//!
//! Callers branch on [`Error::kind`] rather than on message text: only
//! [`ErrorKind::Unauthorized`] earns a token refresh, only
//! [`ErrorKind::MemoryPressure`] ends the controller loop, and everything else
//! degrades the current cycle and is retried later.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    AuthRejected,
    Unauthorized,
    Decode,
    MemoryPressure,
    TokenFile,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection, TLS, or timeout failure.
    #[error("network error: {0}")]
    Network(String),

    /// The credential endpoint declined the refresh grant.
    #[error("credentials rejected (HTTP {status}): {body}")]
    AuthRejected { status: u16, body: String },

    /// The access token expired; a refresh should fix it.
    #[error("access token unauthorized")]
    Unauthorized,

    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("field missing from payload: {0}")]
    FieldMissing(&'static str),

    #[error("available memory {available_kib} KiB below floor {floor_kib} KiB")]
    MemoryPressure { available_kib: u64, floor_kib: u64 },

    #[error("token file missing: {}", .0.display())]
    TokenMissing(PathBuf),

    #[error("token file corrupt: {0}")]
    TokenCorrupt(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::UnexpectedStatus(_) => ErrorKind::Network,
            Self::AuthRejected { .. } => ErrorKind::AuthRejected,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Decode(_) | Self::FieldMissing(_) => ErrorKind::Decode,
            Self::MemoryPressure { .. } => ErrorKind::MemoryPressure,
            Self::TokenMissing(_) | Self::TokenCorrupt(_) | Self::Io(_) => ErrorKind::TokenFile,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
