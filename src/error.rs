//! Error types for host-aware client construction.
//!
//! Fatal conditions abort `create_client` and are returned as [`FactoryError`].
//! Advisory conditions never abort; they are logged as [`Advisory`] values.

use crate::transport::TransportRejection;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Guidance attached to [`FactoryError::ContextUnavailable`].
pub const CONTEXT_GUIDANCE: &str = "Host context no longer available! \
     Ensure that you supply the root context of your application via its base context \
     or the application object itself to the factory constructor.";

/// Fatal, construction-time errors
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The host released its context; this factory can no longer resolve anything.
    #[error("{0}")]
    ContextUnavailable(&'static str),

    #[error("{0}")]
    UnsupportedTransport(#[from] TransportRejection),

    #[error("Invalid DSN '{dsn}': {reason}")]
    InvalidDsn { dsn: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
}

impl FactoryError {
    pub fn context_unavailable() -> Self {
        FactoryError::ContextUnavailable(CONTEXT_GUIDANCE)
    }

    pub fn is_context_unavailable(&self) -> bool {
        matches!(self, FactoryError::ContextUnavailable(_))
    }
}

impl From<config::ConfigError> for FactoryError {
    fn from(err: config::ConfigError) -> Self {
        FactoryError::ConfigError(err.to_string())
    }
}

/// Offline buffer errors
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("Failed to create buffer directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Buffer is full ({capacity} events)")]
    Full { capacity: usize },

    #[error("Buffer I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize buffered event: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Delivery failure reported by a [`Connection`](crate::client::Connection).
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Connection unavailable: {0}")]
    Unavailable(String),

    #[error("Event rejected by server: {0}")]
    Rejected(String),

    #[error("Event could not be buffered: {0}")]
    Buffer(#[from] BufferError),
}

/// Non-fatal conditions surfaced while resolving configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// The host denies a permission the transport needs.
    PermissionMissing { permission: String },
    /// The `noop` scheme was selected; the client discards everything.
    InertTransport,
    /// Host identity introspection failed; the in-app set stays empty.
    InAppResolutionFailed { reason: String },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::PermissionMissing { permission } => write!(
                f,
                "'{}' permission is required to connect to the Sentry server, \
                 please grant it to the host application",
                permission
            ),
            Advisory::InertTransport => write!(
                f,
                "*** Couldn't find a suitable DSN, Sentry operations will do nothing! ***"
            ),
            Advisory::InAppResolutionFailed { reason } => {
                write!(f, "Error getting package information: {}", reason)
            }
        }
    }
}
