//! Host-aware event enrichment.

use crate::event::{Event, EventHook};
use crate::host::{HostContext, HostContextHandle};
use serde_json::{json, Map, Value};
use tracing::debug;

/// Tag carrying the host package identity.
pub const IDENTITY_TAG: &str = "host.identity";

/// Adds host metadata to every event at send time.
///
/// Holds only the weak handle; when the host context is gone the event passes
/// through untouched.
#[derive(Debug, Clone)]
pub struct HostEventEnricher {
    host: HostContextHandle,
}

impl HostEventEnricher {
    pub fn new(host: HostContextHandle) -> Self {
        Self { host }
    }

    fn apply(host: &dyn HostContext, event: &mut Event) {
        let metadata = host.metadata();
        let identity = host.package_identity().ok().flatten();

        insert_context(
            event,
            "app",
            [
                ("app_identifier", identity.clone()),
                ("app_version", metadata.app_version),
            ],
        );
        insert_context(
            event,
            "os",
            [("name", metadata.os_name), ("version", metadata.os_version)],
        );
        insert_context(
            event,
            "device",
            [
                ("model", metadata.device_model),
                ("manufacturer", metadata.device_manufacturer),
            ],
        );

        if let Some(identity) = identity {
            event
                .tags
                .entry(IDENTITY_TAG.to_string())
                .or_insert(identity);
        }
    }
}

/// Insert a context object built from the present fields; skipped when all are absent.
/// An existing context of the same name is left alone.
fn insert_context<const N: usize>(
    event: &mut Event,
    name: &str,
    fields: [(&str, Option<String>); N],
) {
    let map: Map<String, Value> = fields
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), json!(v))))
        .collect();
    if map.is_empty() {
        return;
    }
    event
        .contexts
        .entry(name.to_string())
        .or_insert(Value::Object(map));
}

impl EventHook for HostEventEnricher {
    fn enrich(&self, event: &mut Event) {
        match self.host.resolve() {
            Ok(ctx) => Self::apply(ctx.as_ref(), event),
            Err(_) => {
                debug!(event_id = %event.event_id, "Host context gone; sending without host metadata");
            }
        }
    }
}
