//! Transport validation
//!
//! Checks the DSN scheme and async mode against what the host allows before
//! any client is built. Permission and `noop` findings are advisory; an
//! unsupported scheme is the only fatal outcome.

use crate::config::options;
use crate::dsn::NOOP_SCHEME;
use crate::error::Advisory;
use crate::host::NETWORK_PERMISSION;
use thiserror::Error;
use tracing::{error, warn};

/// Schemes the HTTP transport can serve.
pub const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// Why a transport was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportRejection {
    /// Synchronous sending was requested; the host forbids blocking network calls.
    #[error(
        "Sentry cannot use synchronous connections in this host, remove '{option}=false' from your options."
    )]
    SynchronousMode { option: &'static str },

    #[error("Only 'http' or 'https' connections are supported, but received: {scheme}")]
    UnsupportedScheme { scheme: String },
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportVerdict {
    Accept,
    /// Construction proceeds; the advisories have already been logged.
    Warn(Vec<Advisory>),
    Reject(TransportRejection),
}

impl TransportVerdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, TransportVerdict::Accept)
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, TransportVerdict::Reject(_))
    }

    pub fn advisories(&self) -> &[Advisory] {
        match self {
            TransportVerdict::Warn(advisories) => advisories,
            _ => &[],
        }
    }

    /// Advisories on success, the rejection otherwise.
    pub fn into_result(self) -> Result<Vec<Advisory>, TransportRejection> {
        match self {
            TransportVerdict::Accept => Ok(Vec::new()),
            TransportVerdict::Warn(advisories) => Ok(advisories),
            TransportVerdict::Reject(rejection) => Err(rejection),
        }
    }
}

/// `async` counts as explicitly disabled only when set to `false`.
pub fn async_disabled(async_option: Option<&str>) -> bool {
    async_option
        .map(|v| v.trim().eq_ignore_ascii_case("false"))
        .unwrap_or(false)
}

/// Validate a transport configuration.
///
/// `scheme` is compared case-insensitively. `async_option` is the raw looked-up
/// value of the `async` option. `network_permitted` is the host's answer for
/// [`NETWORK_PERMISSION`].
pub fn validate(scheme: &str, async_option: Option<&str>, network_permitted: bool) -> TransportVerdict {
    let mut advisories = Vec::new();

    if !network_permitted {
        let advisory = Advisory::PermissionMissing {
            permission: NETWORK_PERMISSION.to_string(),
        };
        error!(permission = NETWORK_PERMISSION, "{}", advisory);
        advisories.push(advisory);
    }

    if scheme.eq_ignore_ascii_case(NOOP_SCHEME) {
        warn!(dsn_scheme = scheme, "{}", Advisory::InertTransport);
        advisories.push(Advisory::InertTransport);
    } else if !SUPPORTED_SCHEMES
        .iter()
        .any(|supported| scheme.eq_ignore_ascii_case(supported))
    {
        if async_disabled(async_option) {
            return TransportVerdict::Reject(TransportRejection::SynchronousMode {
                option: options::ASYNC,
            });
        }
        return TransportVerdict::Reject(TransportRejection::UnsupportedScheme {
            scheme: scheme.to_string(),
        });
    }

    if advisories.is_empty() {
        TransportVerdict::Accept
    } else {
        TransportVerdict::Warn(advisories)
    }
}
