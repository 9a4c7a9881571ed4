//! Builds a [`LayeredLookup`] from the configured sources.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::LayeredLookup;
use crate::error::FactoryError;
use config::File;
use std::path::{Path, PathBuf};

/// Loader for layered configuration.
///
/// Precedence, highest first: overrides, environment, explicit file,
/// workspace files, global file, merge-policy defaults.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    workspace_root: Option<PathBuf>,
    config_file: Option<PathBuf>,
    env_prefix: Option<String>,
    include_global: bool,
    overrides: Vec<(String, String)>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            workspace_root: None,
            config_file: None,
            env_prefix: Some(environment::DEFAULT_PREFIX.to_string()),
            include_global: true,
            overrides: Vec::new(),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `config/sentry.toml` and `config/{SENTRY_ENV}.toml` under `root`.
    pub fn workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Read an explicit file; it must exist.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    pub fn without_environment(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    pub fn without_global_file(mut self) -> Self {
        self.include_global = false;
        self
    }

    pub fn set_override(mut self, key: &str, value: impl Into<String>) -> Self {
        self.overrides.push((key.to_string(), value.into()));
        self
    }

    pub fn load(self) -> Result<LayeredLookup, FactoryError> {
        let mut builder = merge_policy::builder_with_defaults()?;

        if self.include_global {
            builder = global_file::add_to_builder(builder)?;
        }
        if let Some(root) = &self.workspace_root {
            builder = workspace_file::add_to_builder(builder, root)?;
        }
        if let Some(path) = &self.config_file {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }
        if let Some(prefix) = &self.env_prefix {
            builder = environment::add_to_builder(builder, prefix);
        }
        for (key, value) in &self.overrides {
            builder = builder.set_override(key.as_str(), value.as_str())?;
        }

        let config = builder.build()?;
        tracing::debug!(
            workspace_root = ?self.workspace_root,
            config_file = ?self.config_file,
            overrides = self.overrides.len(),
            "Configuration layers loaded"
        );
        Ok(LayeredLookup::new(config))
    }

    /// Load a single file plus environment, skipping global and workspace files.
    pub fn load_from_file(path: &Path) -> Result<LayeredLookup, FactoryError> {
        ConfigLoader::new()
            .without_global_file()
            .config_file(path)
            .load()
    }
}
