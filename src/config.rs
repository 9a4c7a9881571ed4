//! Configuration System
//!
//! Key/value option lookup used by every resolver. Values come from layered
//! configuration (overrides, environment, workspace file, global file) and fall
//! back to the DSN query options when no layer defines the key.

use crate::dsn::Dsn;
use crate::error::FactoryError;
use crate::logging::LoggingConfig;
use config::Config;
use std::collections::BTreeMap;
use tracing::warn;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Option keys understood by the client factory.
pub mod options {
    /// DSN to use when none is passed explicitly
    pub const DSN: &str = "dsn";
    /// `false` disables asynchronous sending
    pub const ASYNC: &str = "async";
    /// Directory of the offline event buffer
    pub const BUFFER_DIR: &str = "buffer.dir";
    /// Maximum number of buffered events
    pub const BUFFER_SIZE: &str = "buffer.size";
    /// `false` disables the offline buffer entirely
    pub const BUFFER_ENABLED: &str = "buffer.enabled";
    /// Comma separated in-app module prefixes
    pub const IN_APP_FRAMES: &str = "stacktrace.app.packages";
    pub const RELEASE: &str = "release";
    pub const DIST: &str = "dist";
    pub const ENVIRONMENT: &str = "environment";
    pub const SERVER_NAME: &str = "servername";
    /// `key:value` pairs separated by commas
    pub const TAGS: &str = "tags";

    pub const DEFAULT_BUFFER_SIZE: usize = 10;
}

/// Deterministic option lookup.
///
/// Implementations must return the same answer for the same `(key, dsn)` pair
/// within a single client construction.
pub trait ConfigLookup: Send + Sync {
    fn get(&self, key: &str, dsn: &Dsn) -> Option<String>;

    fn get_or(&self, key: &str, dsn: &Dsn, default: &str) -> String {
        self.get(key, dsn).unwrap_or_else(|| default.to_string())
    }

    /// `Some(true|false)` when the key is set to a boolean-looking value.
    fn get_bool(&self, key: &str, dsn: &Dsn) -> Option<bool> {
        self.get(key, dsn)
            .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            })
    }
}

/// Lookup backed by a layered [`Config`], with DSN options as the last tier.
#[derive(Debug, Clone)]
pub struct LayeredLookup {
    config: Config,
}

impl LayeredLookup {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Lookup with no configured layers; only DSN options are consulted.
    pub fn empty() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Logging settings from the optional `[logging]` table.
    pub fn logging(&self) -> Result<LoggingConfig, FactoryError> {
        match self.config.get::<LoggingConfig>("logging") {
            Ok(logging) => Ok(logging),
            Err(config::ConfigError::NotFound(_)) => Ok(LoggingConfig::default()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for LayeredLookup {
    fn default() -> Self {
        Self::empty()
    }
}

impl ConfigLookup for LayeredLookup {
    /// Arrays (`packages = ["a", "b"]`) are joined with commas. A value of any
    /// other non-scalar type is reported and treated as unset; only a missing
    /// key falls through to the DSN options.
    fn get(&self, key: &str, dsn: &Dsn) -> Option<String> {
        match self.config.get_string(key) {
            Ok(value) => Some(value),
            Err(config::ConfigError::NotFound(_)) => dsn.option(key).map(str::to_string),
            Err(scalar_err) => match self.config.get_array(key) {
                Ok(values) => {
                    let joined: Result<Vec<String>, _> =
                        values.into_iter().map(|v| v.into_string()).collect();
                    match joined {
                        Ok(parts) => Some(parts.join(",")),
                        Err(e) => {
                            warn!(key, error = %e, "Ignoring option with non-scalar list entries");
                            None
                        }
                    }
                }
                Err(_) => {
                    warn!(key, error = %scalar_err, "Ignoring option with unsupported value type");
                    None
                }
            },
        }
    }
}

/// Plain map lookup for programmatic configuration.
impl ConfigLookup for BTreeMap<String, String> {
    fn get(&self, key: &str, dsn: &Dsn) -> Option<String> {
        BTreeMap::get(self, key)
            .cloned()
            .or_else(|| dsn.option(key).map(str::to_string))
    }
}

/// Parse the `tags` option: `k1:v1,k2:v2`. Malformed entries are skipped.
pub fn parse_tags(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (k, v) = pair.split_once(':')?;
            let k = k.trim();
            if k.is_empty() {
                warn!(entry = %pair, "Ignoring tag without a name");
                return None;
            }
            Some((k.to_string(), v.trim().to_string()))
        })
        .collect()
}
