//! sentry-host: host-aware error-reporting client construction
//!
//! Builds a long-lived reporting client against a short-lived host context it
//! does not own. Configuration is resolved through layered fallbacks and the
//! transport is validated before any event can be sent.
//!
//! ```no_run
//! use sentry_host::config::ConfigLoader;
//! use sentry_host::dsn::Dsn;
//! use sentry_host::factory::HostClientFactory;
//! use sentry_host::host::ProcessHost;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), sentry_host::error::FactoryError> {
//! let host = Arc::new(ProcessHost::new("com", "acme", "app")?);
//! let lookup = Arc::new(ConfigLoader::new().load()?);
//! let factory = HostClientFactory::from_context(&host, lookup);
//! let client = factory.create_client(&Dsn::parse("https://key@sentry.example.com/1")?)?;
//! client.send_event(sentry_host::event::Event::new("hello"));
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod cli;
pub mod client;
pub mod config;
pub mod context_manager;
pub mod dsn;
pub mod enrich;
pub mod error;
pub mod event;
pub mod factory;
pub mod host;
pub mod inapp;
pub mod logging;
pub mod transport;

pub use client::Client;
pub use dsn::Dsn;
pub use error::FactoryError;
pub use factory::{HostClientFactory, ResolvedConfiguration};
pub use host::{HostApplication, HostContext, HostContextHandle};
