//! In-app frame boundary
//!
//! Decides which module prefixes count as application code. Explicit
//! configuration wins; otherwise the host's package identity is used; otherwise
//! the boundary stays empty.

use crate::config::{options, ConfigLookup};
use crate::dsn::Dsn;
use crate::error::{Advisory, FactoryError};
use crate::event::StackFrame;
use crate::host::{HostContext, HostContextHandle};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, error, warn};

/// Set of module prefixes treated as application code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InAppBoundary(BTreeSet<String>);

impl InAppBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.0.contains(prefix)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether `module` falls under one of the prefixes.
    pub fn matches(&self, module: &str) -> bool {
        self.0.iter().any(|prefix| module.starts_with(prefix.as_str()))
    }

    /// Set `in_app` on every frame.
    pub fn classify(&self, frames: &mut [StackFrame]) {
        for frame in frames {
            frame.in_app = Some(self.matches(&frame.module));
        }
    }
}

impl<S: Into<String>> FromIterator<S> for InAppBoundary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        )
    }
}

/// Prefixes from the `stacktrace.app.packages` option.
pub fn configured_in_app(lookup: &dyn ConfigLookup, dsn: &Dsn) -> InAppBoundary {
    match lookup.get(options::IN_APP_FRAMES, dsn) {
        Some(raw) => raw.split(',').map(str::trim).collect(),
        None => {
            debug!(
                option = options::IN_APP_FRAMES,
                "No in-app prefixes configured; falling back to host identity"
            );
            InAppBoundary::new()
        }
    }
}

/// Single-element boundary from the host's package identity, or empty.
pub fn identity_in_app(host: &dyn HostContext) -> InAppBoundary {
    match host.package_identity() {
        Ok(Some(identity)) if !identity.trim().is_empty() => {
            std::iter::once(identity.trim().to_string()).collect()
        }
        Ok(_) => {
            warn!("Host reported no package identity; in-app frames stay unclassified");
            InAppBoundary::new()
        }
        Err(e) => {
            let advisory = Advisory::InAppResolutionFailed {
                reason: e.to_string(),
            };
            error!("{}", advisory);
            InAppBoundary::new()
        }
    }
}

/// Explicit configuration, else host identity.
///
/// Only a released host context is fatal; identity lookup failures yield an
/// empty boundary.
pub fn resolve_in_app(
    lookup: &dyn ConfigLookup,
    dsn: &Dsn,
    host: &HostContextHandle,
) -> Result<InAppBoundary, FactoryError> {
    let configured = configured_in_app(lookup, dsn);
    if !configured.is_empty() {
        return Ok(configured);
    }

    let ctx = host.resolve()?;
    Ok(identity_in_app(ctx.as_ref()))
}
