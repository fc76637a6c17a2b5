use std::fmt;
use std::time::Duration;

/// Errors that can occur during blob storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// No object is stored under the requested key.
    NotFound(String),
    /// The key failed validation.
    InvalidKey(String),
    /// A local I/O error occurred.
    Io(std::io::Error),
    /// The remote backend rejected the call or could not be reached.
    Transport(String),
    /// The call did not complete within the configured bound.
    Timeout(Duration),
    /// The provided content hash is invalid.
    InvalidHash(String),
    /// The object exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
}

impl StorageError {
    /// Whether the failure says nothing about the object itself, only about
    /// reaching the store.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Transport(_) | Self::Timeout(_))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "object not found: {key}"),
            Self::InvalidKey(msg) => write!(f, "invalid storage key: {msg}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::Transport(msg) => write!(f, "storage transport error: {msg}"),
            Self::Timeout(after) => {
                write!(f, "storage call timed out after {}ms", after.as_millis())
            }
            Self::InvalidHash(msg) => write!(f, "invalid content hash: {msg}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "object exceeds size limit ({actual} > {limit} bytes)")
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
