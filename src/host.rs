//! Host Context
//!
//! The host application owns a short-lived execution context. The factory only
//! ever holds a weak handle to it; every access goes through
//! [`HostContextHandle::resolve`], which fails with `ContextUnavailable` once
//! the host has released the context.

use crate::error::FactoryError;
use directories::ProjectDirs;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tracing::debug;

/// Permission the HTTP transport needs.
pub const NETWORK_PERMISSION: &str = "network";

/// Failure of a host identity query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct HostQueryError(pub String);

/// Descriptive host data attached to outgoing events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostMetadata {
    pub app_version: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub device_model: Option<String>,
    pub device_manufacturer: Option<String>,
}

/// Read-only queries against the host environment.
pub trait HostContext: Send + Sync {
    fn has_permission(&self, name: &str) -> bool;

    /// Private cache-storage root of the host application
    fn cache_dir(&self) -> PathBuf;

    /// Package identity, e.g. `com.acme.app`.
    ///
    /// `Ok(None)` means the host has no identity to offer; `Err` means the
    /// lookup itself failed.
    fn package_identity(&self) -> Result<Option<String>, HostQueryError>;

    fn metadata(&self) -> HostMetadata {
        HostMetadata::default()
    }

    fn describe(&self) -> String {
        "host-context".to_string()
    }
}

/// Application-level object owning the base context.
pub trait HostApplication {
    fn base_context(&self) -> Arc<dyn HostContext>;
}

/// Non-owning handle to the host context.
#[derive(Clone)]
pub struct HostContextHandle {
    inner: Weak<dyn HostContext>,
}

impl HostContextHandle {
    /// Capture the application's base context.
    ///
    /// The application must keep owning that context; the handle never does.
    pub fn from_application(app: &dyn HostApplication) -> Self {
        debug!("Construction of host handle from application");
        let base = app.base_context();
        Self {
            inner: Arc::downgrade(&base),
        }
    }

    /// Capture a context supplied directly.
    pub fn from_context<C: HostContext + 'static>(ctx: &Arc<C>) -> Self {
        debug!("Construction of host handle from context");
        let weak: Weak<C> = Arc::downgrade(ctx);
        Self { inner: weak }
    }

    /// Same as [`from_context`](Self::from_context) for an already type-erased context.
    pub fn from_shared(ctx: &Arc<dyn HostContext>) -> Self {
        debug!("Construction of host handle from context");
        Self {
            inner: Arc::downgrade(ctx),
        }
    }

    /// Upgrade to the live context.
    ///
    /// Callers must drop the returned `Arc` before returning; holding on to it
    /// would extend the host's lifetime.
    pub fn resolve(&self) -> Result<Arc<dyn HostContext>, FactoryError> {
        self.inner
            .upgrade()
            .ok_or_else(FactoryError::context_unavailable)
    }

    pub fn is_available(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for HostContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContextHandle")
            .field("available", &self.is_available())
            .finish()
    }
}

/// Host context for a native process.
///
/// The cache root comes from the platform project directories unless set
/// explicitly.
#[derive(Debug, Clone)]
pub struct ProcessHost {
    identity: Option<String>,
    cache_dir: PathBuf,
    granted: BTreeSet<String>,
    metadata: HostMetadata,
}

impl ProcessHost {
    /// Host rooted at the platform cache directory for
    /// `qualifier.organization.application`, with network access granted.
    pub fn new(qualifier: &str, organization: &str, application: &str) -> Result<Self, FactoryError> {
        let dirs = ProjectDirs::from(qualifier, organization, application).ok_or_else(|| {
            FactoryError::ConfigError("No valid home directory for the cache root".to_string())
        })?;
        let identity = [qualifier, organization, application]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join(".");
        Ok(Self::with_cache_dir(dirs.cache_dir()).with_identity(identity))
    }

    /// Host with an explicit cache root and no identity.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            identity: None,
            cache_dir: cache_dir.into(),
            granted: BTreeSet::from([NETWORK_PERMISSION.to_string()]),
            metadata: HostMetadata {
                app_version: None,
                os_name: Some(std::env::consts::OS.to_string()),
                os_version: None,
                device_model: Some(std::env::consts::ARCH.to_string()),
                device_manufacturer: None,
            },
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.metadata.app_version = Some(version.into());
        self
    }

    pub fn grant(mut self, permission: &str) -> Self {
        self.granted.insert(permission.to_string());
        self
    }

    pub fn deny(mut self, permission: &str) -> Self {
        self.granted.remove(permission);
        self
    }
}

impl HostContext for ProcessHost {
    fn has_permission(&self, name: &str) -> bool {
        self.granted.contains(name)
    }

    fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone()
    }

    fn package_identity(&self) -> Result<Option<String>, HostQueryError> {
        Ok(self.identity.clone())
    }

    fn metadata(&self) -> HostMetadata {
        self.metadata.clone()
    }

    fn describe(&self) -> String {
        format!(
            "process:{}",
            self.identity.as_deref().unwrap_or("<anonymous>")
        )
    }
}
