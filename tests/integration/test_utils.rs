//! Shared test utilities for integration tests
//!
//! A scriptable host context plus serialized access to the process
//! environment for tests that touch XDG variables.

use sentry_host::config::ConfigLookup;
use sentry_host::host::{HostContext, HostQueryError, NETWORK_PERMISSION};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Host context with every answer fixed up front.
#[derive(Debug, Clone)]
pub struct FakeHost {
    pub cache_dir: PathBuf,
    pub identity: Option<String>,
    pub identity_fails: bool,
    pub granted: BTreeSet<String>,
}

impl FakeHost {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            identity: None,
            identity_fails: false,
            granted: BTreeSet::from([NETWORK_PERMISSION.to_string()]),
        }
    }

    pub fn identity(mut self, identity: &str) -> Self {
        self.identity = Some(identity.to_string());
        self
    }

    pub fn failing_identity(mut self) -> Self {
        self.identity_fails = true;
        self
    }

    pub fn without_network(mut self) -> Self {
        self.granted.remove(NETWORK_PERMISSION);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl HostContext for FakeHost {
    fn has_permission(&self, name: &str) -> bool {
        self.granted.contains(name)
    }

    fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone()
    }

    fn package_identity(&self) -> Result<Option<String>, HostQueryError> {
        if self.identity_fails {
            return Err(HostQueryError("package manager unreachable".to_string()));
        }
        Ok(self.identity.clone())
    }
}

/// Option lookup built from literal pairs.
pub fn lookup(pairs: &[(&str, &str)]) -> Arc<dyn ConfigLookup> {
    Arc::new(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<String, String>>(),
    )
}

/// Run `f` with XDG_CONFIG_HOME pointing into a fresh temp dir.
///
/// The previous value is restored afterwards, even on panic.
pub fn with_isolated_config_home<F, R>(f: F) -> R
where
    F: FnOnce(&TempDir) -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    let original = std::env::var("XDG_CONFIG_HOME").ok();
    std::env::set_var("XDG_CONFIG_HOME", temp.path().join("config"));

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&temp)));

    match original {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }

    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
