//! Factory behavior across the host context lifetime

use crate::integration::test_utils::{lookup, FakeHost};
use sentry_host::config::options;
use sentry_host::error::{FactoryError, CONTEXT_GUIDANCE};
use sentry_host::event::Event;
use sentry_host::host::{HostApplication, HostContext};
use sentry_host::{Dsn, HostClientFactory};
use std::sync::Arc;
use tempfile::TempDir;

struct App {
    base: Arc<dyn HostContext>,
}

impl HostApplication for App {
    fn base_context(&self) -> Arc<dyn HostContext> {
        Arc::clone(&self.base)
    }
}

fn dsn() -> Dsn {
    Dsn::parse("https://pub@sentry.example.com/1").unwrap()
}

#[test]
fn test_factory_does_not_retain_host() {
    let host = FakeHost::new("/cache").shared();
    let factory = HostClientFactory::from_context(&host, lookup(&[]));

    factory.resolve(&dsn()).unwrap();
    assert_eq!(Arc::strong_count(&host), 1);
    assert!(factory.host().is_available());
}

#[test]
fn test_released_context_fails_with_guidance() {
    let host = FakeHost::new("/cache").shared();
    let factory = HostClientFactory::from_context(&host, lookup(&[]));
    drop(host);

    let err = factory.create_client(&dsn()).unwrap_err();
    assert!(matches!(err, FactoryError::ContextUnavailable(_)));
    assert!(err.to_string().contains(CONTEXT_GUIDANCE));
    assert!(!factory.host().is_available());
}

#[test]
fn test_released_context_is_fatal_even_with_every_option_set() {
    let host = FakeHost::new("/cache").shared();
    let factory = HostClientFactory::from_context(
        &host,
        lookup(&[
            (options::BUFFER_DIR, "/var/sentry"),
            (options::IN_APP_FRAMES, "com.acme"),
        ]),
    );
    drop(host);

    assert!(factory.resolve(&dsn()).unwrap_err().is_context_unavailable());
}

#[test]
fn test_application_constructor_uses_base_context() {
    let temp = TempDir::new().unwrap();
    let app = App {
        base: Arc::new(FakeHost::new(temp.path()).identity("com.acme.app")),
    };
    let factory = HostClientFactory::from_application(&app, lookup(&[]));

    let resolved = factory.resolve(&dsn()).unwrap();
    assert!(resolved.in_app.contains("com.acme.app"));
    assert_eq!(Arc::strong_count(&app.base), 1);

    drop(app);
    assert!(factory.create_client(&dsn()).unwrap_err().is_context_unavailable());
}

#[test]
fn test_client_outlives_host_without_enrichment() {
    let temp = TempDir::new().unwrap();
    let host = FakeHost::new(temp.path()).identity("com.acme.app").shared();
    let factory = HostClientFactory::from_context(&host, lookup(&[(options::BUFFER_ENABLED, "false")]));
    let client = factory.create_client(&dsn()).unwrap();
    drop(host);

    let prepared = client.prepare_event(Event::new("late"));
    assert!(prepared.contexts.get("app").is_none());
    assert!(prepared.tags.get("host.identity").is_none());
}
