use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// RemoteError — the read/subscription channel
// ---------------------------------------------------------------------------

/// Classification of remote-store failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Retriable (network partition, remote store temporarily down).
    Unavailable,
    /// The caller's credentials do not allow access to this document.
    PermissionDenied,
    /// The remote store delivered a payload that could not be decoded.
    Corrupt,
}

/// An error delivered through a remote subscription channel.
///
/// Stored in a cache entry's `error` slot and handed to every subscriber, so
/// it is `Clone` rather than carrying a boxed source. Write failures use
/// [`WriteError`] instead — the two channels never mix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub message: String,
    pub kind: RemoteErrorKind,
}

impl RemoteError {
    /// A transient (`Unavailable`) error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: RemoteErrorKind::Unavailable,
        }
    }

    pub fn with_kind(message: impl Into<String>, kind: RemoteErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RemoteError {}

// ---------------------------------------------------------------------------
// WriteError — the write channel
// ---------------------------------------------------------------------------

/// A failure on the write path.
///
/// Returned directly to the caller of a write operation and never folded into
/// a cache entry's `error` slot, which is reserved for the subscription
/// channel.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Remote store rejected write to \"{path}\": {source}")]
    Rejected {
        path: String,
        #[source]
        source: RemoteError,
    },

    #[error("Failed to serialize document for \"{path}\"")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// A typed view failed to deserialize the cached payload.
#[derive(Debug, Error)]
#[error("Failed to decode document \"{path}\" as {type_name}")]
pub struct DecodeError {
    pub path: String,
    pub type_name: &'static str,
    #[source]
    pub source: serde_json::Error,
}

// ---------------------------------------------------------------------------
// LivedocError — top-level rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LivedocError {
    #[error("Subscription error: {0}")]
    Subscription(RemoteError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<RemoteError> for LivedocError {
    fn from(e: RemoteError) -> Self {
        Self::Subscription(e)
    }
}

/// Convenience alias — the default error type is `LivedocError`.
pub type Result<T, E = LivedocError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
