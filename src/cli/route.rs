//! CLI route: builds the host, lookup and factory once, then dispatches commands.

use super::output::{format_buffered_events, format_resolved_configuration};
use super::parse::{Cli, Commands};
use crate::buffer::{Buffer, DiskBuffer};
use crate::config::{ConfigLoader, LayeredLookup};
use crate::dsn::Dsn;
use crate::error::FactoryError;
use crate::event::{Event, Level};
use crate::factory::HostClientFactory;
use crate::host::{ProcessHost, NETWORK_PERMISSION};
use crate::logging::LoggingConfig;
use std::sync::Arc;
use tracing::info;

/// Process-level state for one CLI invocation.
///
/// Owns the host context; the factory only holds a weak handle to it.
pub struct RunContext {
    host: Arc<ProcessHost>,
    lookup: Arc<LayeredLookup>,
    factory: HostClientFactory,
}

impl RunContext {
    pub fn new(cli: &Cli) -> Result<Self, FactoryError> {
        let lookup = Arc::new(load_lookup(cli)?);

        let mut host = match &cli.cache_dir {
            Some(dir) => ProcessHost::with_cache_dir(dir),
            None => ProcessHost::new("io", "sentry", "sentry-host")?,
        };
        if let Some(identity) = &cli.identity {
            host = host.with_identity(identity.clone());
        }
        host = host.with_version(env!("CARGO_PKG_VERSION"));
        if cli.deny_network {
            host = host.deny(NETWORK_PERMISSION);
        }
        let host = Arc::new(host);

        let factory = HostClientFactory::from_context(&host, lookup.clone());
        Ok(Self {
            host,
            lookup,
            factory,
        })
    }

    pub fn host(&self) -> &Arc<ProcessHost> {
        &self.host
    }

    pub fn logging_config(&self) -> Result<LoggingConfig, FactoryError> {
        self.lookup.logging()
    }

    fn dsn(&self, explicit: Option<&str>) -> Result<Dsn, FactoryError> {
        match explicit {
            Some(raw) => Dsn::parse(raw),
            None => self.factory.default_dsn(),
        }
    }

    pub fn execute(&self, command: &Commands) -> Result<String, FactoryError> {
        match command {
            Commands::Resolve { dsn, format } => {
                let dsn = self.dsn(dsn.as_deref())?;
                let resolved = self.factory.resolve(&dsn)?;
                format_resolved_configuration(&resolved, *format)
            }
            Commands::Send { dsn, message } => {
                let dsn = self.dsn(dsn.as_deref())?;
                let client = self.factory.create_client(&dsn)?;
                let event_id = client.send_event(Event::new(message.clone()).with_level(Level::Info));
                info!(event_id = %event_id, "Test event handed to client");
                let destination = match client.buffer_location() {
                    _ if client.is_inert() => "discarded (inert transport)".to_string(),
                    Some(location) => format!("buffered in {}", location.path.display()),
                    None => "dropped (no buffer, no upstream)".to_string(),
                };
                Ok(format!("Event {}: {}", event_id.simple(), destination))
            }
            Commands::Buffer { dsn, format } => {
                let dsn = self.dsn(dsn.as_deref())?;
                let resolved = self.factory.resolve(&dsn)?;
                let events = match &resolved.buffer {
                    Some(location) if location.path.exists() => DiskBuffer::open(location)?.events(),
                    _ => Vec::new(),
                };
                format_buffered_events(&events, *format)
            }
        }
    }
}

fn load_lookup(cli: &Cli) -> Result<LayeredLookup, FactoryError> {
    let mut loader = ConfigLoader::new().workspace_root(&cli.workspace);
    if let Some(path) = &cli.config {
        loader = loader.config_file(path);
    }
    loader.load()
}
