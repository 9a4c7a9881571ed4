//! Base client construction
//!
//! Assembles a [`Client`] from a DSN, option lookup and the override points
//! (buffer location, in-app boundary, context manager). Host-specific policy
//! lives in the factory; this module knows nothing about host contexts.

use crate::buffer::{self, Buffer, BufferLocation, DiskBuffer};
use crate::config::{self, options, ConfigLookup};
use crate::context_manager::{self, ContextManager};
use crate::dsn::Dsn;
use crate::error::{ConnectionError, FactoryError};
use crate::event::{Event, EventHook};
use crate::inapp::{self, InAppBoundary};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Sends one event somewhere.
pub trait Connection: Send + Sync {
    fn send(&self, event: &Event) -> Result<(), ConnectionError>;
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopConnection;

impl Connection for NoopConnection {
    fn send(&self, event: &Event) -> Result<(), ConnectionError> {
        debug!(event_id = %event.event_id, "Discarding event on inert transport");
        Ok(())
    }
}

/// Forwards to an upstream connection and stores events it could not deliver.
pub struct BufferedConnection {
    upstream: Option<Arc<dyn Connection>>,
    buffer: Option<Arc<dyn Buffer>>,
}

impl BufferedConnection {
    pub fn new(upstream: Option<Arc<dyn Connection>>, buffer: Option<Arc<dyn Buffer>>) -> Self {
        Self { upstream, buffer }
    }

    pub fn buffer(&self) -> Option<&Arc<dyn Buffer>> {
        self.buffer.as_ref()
    }
}

impl Connection for BufferedConnection {
    fn send(&self, event: &Event) -> Result<(), ConnectionError> {
        let failure = match &self.upstream {
            Some(upstream) => match upstream.send(event) {
                Ok(()) => return Ok(()),
                Err(e) => e,
            },
            None => ConnectionError::Unavailable("no upstream connection".to_string()),
        };

        match &self.buffer {
            Some(buffer) => {
                debug!(event_id = %event.event_id, reason = %failure, "Buffering undelivered event");
                buffer.add(event)?;
                Ok(())
            }
            None => Err(failure),
        }
    }
}

/// Values copied onto events that do not set them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDefaults {
    pub release: Option<String>,
    pub dist: Option<String>,
    pub environment: Option<String>,
    pub server_name: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl EventDefaults {
    pub fn from_lookup(lookup: &dyn ConfigLookup, dsn: &Dsn) -> Self {
        Self {
            release: lookup.get(options::RELEASE, dsn),
            dist: lookup.get(options::DIST, dsn),
            environment: lookup.get(options::ENVIRONMENT, dsn),
            server_name: lookup.get(options::SERVER_NAME, dsn),
            tags: lookup
                .get(options::TAGS, dsn)
                .map(|raw| config::parse_tags(&raw))
                .unwrap_or_default(),
        }
    }

    fn apply_to(&self, event: &mut Event) {
        fn fill(slot: &mut Option<String>, value: &Option<String>) {
            if slot.is_none() {
                slot.clone_from(value);
            }
        }
        fill(&mut event.release, &self.release);
        fill(&mut event.dist, &self.dist);
        fill(&mut event.environment, &self.environment);
        fill(&mut event.server_name, &self.server_name);
        for (k, v) in &self.tags {
            event.tags.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
}

/// Override points consulted by [`build_client`].
#[derive(Debug, Clone)]
pub struct ClientOverrides {
    /// `None` disables the offline buffer.
    pub buffer: Option<BufferLocation>,
    pub in_app: InAppBoundary,
    pub context_manager: Arc<dyn ContextManager>,
}

impl ClientOverrides {
    /// Base behavior: buffer only when `buffer.dir` is set, configured in-app
    /// prefixes, per-thread context.
    pub fn defaults(lookup: &dyn ConfigLookup, dsn: &Dsn) -> Self {
        let buffer = lookup
            .get(options::BUFFER_DIR, dsn)
            .filter(|_| buffer::buffer_enabled(lookup, dsn))
            .map(|dir| BufferLocation {
                path: dir.into(),
                capacity: buffer::buffer_capacity(lookup, dsn),
            });
        Self {
            buffer,
            in_app: inapp::configured_in_app(lookup, dsn),
            context_manager: context_manager::default_context_manager(dsn),
        }
    }
}

/// Configured reporting client.
pub struct Client {
    dsn: Dsn,
    defaults: EventDefaults,
    overrides: ClientOverrides,
    connection: Box<dyn Connection>,
    hooks: Vec<Box<dyn EventHook>>,
}

impl Client {
    pub fn dsn(&self) -> &Dsn {
        &self.dsn
    }

    /// True when every event is discarded.
    pub fn is_inert(&self) -> bool {
        self.dsn.is_noop()
    }

    pub fn buffer_location(&self) -> Option<&BufferLocation> {
        self.overrides.buffer.as_ref()
    }

    pub fn in_app(&self) -> &InAppBoundary {
        &self.overrides.in_app
    }

    pub fn context_manager(&self) -> &Arc<dyn ContextManager> {
        &self.overrides.context_manager
    }

    pub fn event_defaults(&self) -> &EventDefaults {
        &self.defaults
    }

    /// Hooks run in insertion order, after defaults and context are applied.
    pub fn add_enrichment_hook(&mut self, hook: impl EventHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Apply defaults, context, in-app classification and hooks.
    pub fn prepare_event(&self, mut event: Event) -> Event {
        self.defaults.apply_to(&mut event);
        self.overrides.context_manager.snapshot().apply_to(&mut event);
        self.overrides.in_app.classify(&mut event.frames);
        for hook in &self.hooks {
            hook.enrich(&mut event);
        }
        event
    }

    /// Prepare and hand the event to the connection. Delivery failures are
    /// logged, never returned.
    pub fn send_event(&self, event: Event) -> Uuid {
        let event = self.prepare_event(event);
        let event_id = event.event_id;
        if let Err(e) = self.connection.send(&event) {
            warn!(event_id = %event_id, "An exception occurred while sending the event: {}", e);
        }
        event_id
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("dsn", &self.dsn.redacted())
            .field("defaults", &self.defaults)
            .field("overrides", &self.overrides)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Build a client. `upstream` performs actual delivery; without it every
/// event goes to the buffer (or is dropped when there is none).
pub fn build_client(
    dsn: &Dsn,
    lookup: &dyn ConfigLookup,
    overrides: ClientOverrides,
    upstream: Option<Arc<dyn Connection>>,
) -> Result<Client, FactoryError> {
    let connection: Box<dyn Connection> = if dsn.is_noop() {
        Box::new(NoopConnection)
    } else {
        let buffer = match &overrides.buffer {
            Some(location) => {
                let disk: Arc<dyn Buffer> = Arc::new(DiskBuffer::open(location)?);
                Some(disk)
            }
            None => None,
        };
        if upstream.is_none() && buffer.is_none() {
            warn!("No upstream connection and no buffer; events will be dropped");
        }
        Box::new(BufferedConnection::new(upstream, buffer))
    };

    let client = Client {
        dsn: dsn.clone(),
        defaults: EventDefaults::from_lookup(lookup, dsn),
        overrides,
        connection,
        hooks: Vec::new(),
    };
    info!(
        dsn_scheme = dsn.scheme(),
        buffered = client.buffer_location().is_some(),
        in_app = client.in_app().len(),
        "Client created"
    );
    Ok(client)
}
