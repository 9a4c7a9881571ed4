//! Host-aware client factory
//!
//! Orchestrates construction against a host context the factory does not own:
//! resolve the host, validate the transport, resolve buffer location, in-app
//! boundary and context manager, then build the client and attach the host
//! enrichment hook.

use crate::buffer::{self, BufferLocation};
use crate::client::{self, Client, ClientOverrides, Connection};
use crate::config::{options, ConfigLookup};
use crate::context_manager::{self, ContextManager};
use crate::dsn::Dsn;
use crate::enrich::HostEventEnricher;
use crate::error::{Advisory, FactoryError};
use crate::host::{HostApplication, HostContext, HostContextHandle, NETWORK_PERMISSION};
use crate::inapp::{self, InAppBoundary};
use crate::transport;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Settings derived for one `create_client` call.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfiguration {
    /// DSN with the secret key removed.
    pub dsn: String,
    pub scheme: String,
    pub context_manager_strategy: &'static str,
    /// Display form of each advisory raised during validation.
    pub advisories: Vec<String>,
    pub in_app: InAppBoundary,
    /// `None` for the inert transport or when buffering is disabled.
    pub buffer: Option<BufferLocation>,
    #[serde(skip)]
    pub context_manager: Arc<dyn ContextManager>,
}

impl ResolvedConfiguration {
    pub fn is_inert(&self) -> bool {
        self.scheme == crate::dsn::NOOP_SCHEME
    }

    pub fn overrides(&self) -> ClientOverrides {
        ClientOverrides {
            buffer: self.buffer.clone(),
            in_app: self.in_app.clone(),
            context_manager: Arc::clone(&self.context_manager),
        }
    }
}

/// Strategy name reported for the shared context manager.
pub const SINGLETON_STRATEGY: &str = "singleton";

/// Builds clients for a host whose context may go away at any time.
///
/// The factory keeps only a weak handle. Once the host releases its context
/// every later `create_client` fails with `ContextUnavailable`.
pub struct HostClientFactory {
    host: HostContextHandle,
    lookup: Arc<dyn ConfigLookup>,
    upstream: Option<Arc<dyn Connection>>,
}

impl HostClientFactory {
    /// Factory over the application's base context.
    pub fn from_application(app: &dyn HostApplication, lookup: Arc<dyn ConfigLookup>) -> Self {
        Self::from_handle(HostContextHandle::from_application(app), lookup)
    }

    /// Factory over a context supplied directly.
    pub fn from_context<C: HostContext + 'static>(ctx: &Arc<C>, lookup: Arc<dyn ConfigLookup>) -> Self {
        Self::from_handle(HostContextHandle::from_context(ctx), lookup)
    }

    pub fn from_handle(host: HostContextHandle, lookup: Arc<dyn ConfigLookup>) -> Self {
        Self {
            host,
            lookup,
            upstream: None,
        }
    }

    /// Connection that performs actual delivery for built clients.
    pub fn with_upstream(mut self, upstream: Arc<dyn Connection>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn host(&self) -> &HostContextHandle {
        &self.host
    }

    /// The `dsn` option, or the inert DSN when unset.
    pub fn default_dsn(&self) -> Result<Dsn, FactoryError> {
        match self.lookup.get(options::DSN, &Dsn::noop()) {
            Some(raw) if !raw.trim().is_empty() => Dsn::parse(&raw),
            _ => {
                debug!("No DSN configured, using the inert DSN");
                Ok(Dsn::noop())
            }
        }
    }

    /// Resolve everything `create_client` needs without building a client.
    pub fn resolve(&self, dsn: &Dsn) -> Result<ResolvedConfiguration, FactoryError> {
        let lookup = self.lookup.as_ref();

        let network_permitted = {
            let ctx = self.host.resolve()?;
            debug!(host = %ctx.describe(), "Sentry init with host context");
            ctx.has_permission(NETWORK_PERMISSION)
        };

        let async_option = lookup.get(options::ASYNC, dsn);
        let advisories: Vec<Advisory> =
            transport::validate(dsn.scheme(), async_option.as_deref(), network_permitted)
                .into_result()?;

        let buffer = if dsn.is_noop() || !buffer::buffer_enabled(lookup, dsn) {
            None
        } else {
            Some(buffer::resolve_buffer_location(lookup, dsn, &self.host)?)
        };

        let in_app = inapp::resolve_in_app(lookup, dsn, &self.host)?;
        let context_manager = context_manager::select_context_manager(dsn);

        Ok(ResolvedConfiguration {
            dsn: dsn.redacted(),
            scheme: dsn.scheme().to_string(),
            context_manager_strategy: SINGLETON_STRATEGY,
            advisories: advisories.iter().map(ToString::to_string).collect(),
            in_app,
            buffer,
            context_manager,
        })
    }

    pub fn create_client(&self, dsn: &Dsn) -> Result<Client, FactoryError> {
        let resolved = self.resolve(dsn)?;
        let mut client = client::build_client(
            dsn,
            self.lookup.as_ref(),
            resolved.overrides(),
            self.upstream.clone(),
        )?;
        client.add_enrichment_hook(HostEventEnricher::new(self.host.clone()));

        info!(
            dsn_scheme = %resolved.scheme,
            buffer_dir = ?resolved.buffer.as_ref().map(|b| b.path.display().to_string()),
            in_app = ?resolved.in_app,
            "Host client ready"
        );
        Ok(client)
    }

    /// `create_client` with [`default_dsn`](Self::default_dsn).
    pub fn create_default_client(&self) -> Result<Client, FactoryError> {
        let dsn = self.default_dsn()?;
        self.create_client(&dsn)
    }
}

impl std::fmt::Debug for HostClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostClientFactory")
            .field("host", &self.host)
            .field("upstream", &self.upstream.is_some())
            .finish()
    }
}
