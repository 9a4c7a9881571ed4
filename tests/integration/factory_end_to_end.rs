//! End-to-end client construction through the host-aware factory

use crate::integration::test_utils::{lookup, FakeHost};
use parking_lot::Mutex;
use sentry_host::buffer::{Buffer, DiskBuffer, DEFAULT_BUFFER_DIR};
use sentry_host::client::Connection;
use sentry_host::config::options;
use sentry_host::context_manager::{same_manager, ContextManager, SingletonContextManager};
use sentry_host::enrich::IDENTITY_TAG;
use sentry_host::error::ConnectionError;
use sentry_host::event::{Event, StackFrame};
use sentry_host::factory::SINGLETON_STRATEGY;
use sentry_host::inapp::InAppBoundary;
use sentry_host::{Dsn, HostClientFactory};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Upstream that records delivered events, or refuses all of them.
#[derive(Default)]
struct RecordingUpstream {
    refuse: bool,
    delivered: Mutex<Vec<Event>>,
}

impl Connection for RecordingUpstream {
    fn send(&self, event: &Event) -> Result<(), ConnectionError> {
        if self.refuse {
            return Err(ConnectionError::Unavailable("offline".to_string()));
        }
        self.delivered.lock().push(event.clone());
        Ok(())
    }
}

fn https_dsn() -> Dsn {
    Dsn::parse("https://pub@sentry.example.com/1").unwrap()
}

#[test]
fn test_defaults_derived_from_host() {
    let host = FakeHost::new("/cache").identity("com.acme.app").shared();
    let factory = HostClientFactory::from_context(&host, lookup(&[]));

    let resolved = factory.resolve(&https_dsn()).unwrap();

    assert_eq!(
        resolved.buffer.as_ref().unwrap().path,
        PathBuf::from("/cache").join(DEFAULT_BUFFER_DIR)
    );
    assert_eq!(resolved.buffer.as_ref().unwrap().capacity, options::DEFAULT_BUFFER_SIZE);
    assert_eq!(resolved.in_app, ["com.acme.app"].into_iter().collect::<InAppBoundary>());
    assert_eq!(resolved.context_manager_strategy, SINGLETON_STRATEGY);
    assert!(resolved.advisories.is_empty());
}

#[test]
fn test_create_client_carries_host_defaults() {
    let temp = TempDir::new().unwrap();
    let cache = temp.path().join("cache");
    let host = FakeHost::new(&cache).identity("com.acme.app").shared();
    let factory = HostClientFactory::from_context(&host, lookup(&[]));

    let client = factory.create_client(&https_dsn()).unwrap();

    assert!(!client.is_inert());
    assert_eq!(client.dsn(), &https_dsn());
    let buffer = client.buffer_location().unwrap();
    assert_eq!(buffer.path, cache.join(DEFAULT_BUFFER_DIR));
    assert_eq!(buffer.capacity, options::DEFAULT_BUFFER_SIZE);
    assert!(buffer.path.is_dir());
    assert_eq!(client.in_app(), &["com.acme.app"].into_iter().collect::<InAppBoundary>());
    let shared: Arc<dyn ContextManager> = SingletonContextManager::shared();
    assert!(same_manager(client.context_manager(), &shared));
    assert_eq!(client.hook_count(), 1);
}

#[test]
fn test_explicit_options_override_host_defaults() {
    let host = FakeHost::new("/cache").identity("com.acme.app").shared();
    let factory = HostClientFactory::from_context(
        &host,
        lookup(&[
            (options::BUFFER_DIR, "/var/sentry"),
            (options::BUFFER_SIZE, "3"),
            (options::IN_APP_FRAMES, "org.example,org.other"),
        ]),
    );

    let resolved = factory.resolve(&https_dsn()).unwrap();
    let buffer = resolved.buffer.unwrap();
    assert_eq!(buffer.path, PathBuf::from("/var/sentry"));
    assert_eq!(buffer.capacity, 3);
    assert_eq!(
        resolved.in_app,
        ["org.example", "org.other"].into_iter().collect::<InAppBoundary>()
    );
}

#[test]
fn test_dsn_query_options_are_consulted() {
    let host = FakeHost::new("/cache").shared();
    let factory = HostClientFactory::from_context(&host, lookup(&[]));
    let dsn = Dsn::parse("https://pub@sentry.example.com/1?buffer.size=4").unwrap();

    let resolved = factory.resolve(&dsn).unwrap();
    assert_eq!(resolved.buffer.unwrap().capacity, 4);
}

#[test]
fn test_events_are_enriched_and_classified() {
    let temp = TempDir::new().unwrap();
    let host = FakeHost::new(temp.path()).identity("com.acme.app").shared();
    let upstream = Arc::new(RecordingUpstream::default());
    let factory = HostClientFactory::from_context(&host, lookup(&[(options::RELEASE, "1.2.3")]))
        .with_upstream(upstream.clone());

    let client = factory.create_client(&https_dsn()).unwrap();
    let event = Event::new("boom")
        .with_frame(StackFrame::new("com.acme.app.Main", "run"))
        .with_frame(StackFrame::new("java.lang.Thread", "run"));
    let event_id = client.send_event(event);

    let delivered = upstream.delivered.lock();
    assert_eq!(delivered.len(), 1);
    let sent = &delivered[0];
    assert_eq!(sent.event_id, event_id);
    assert_eq!(sent.release.as_deref(), Some("1.2.3"));
    assert_eq!(sent.tags.get(IDENTITY_TAG).map(String::as_str), Some("com.acme.app"));
    assert_eq!(sent.contexts["app"]["app_identifier"], "com.acme.app");
    assert_eq!(sent.frames[0].in_app, Some(true));
    assert_eq!(sent.frames[1].in_app, Some(false));
}

#[test]
fn test_undeliverable_events_land_in_host_cache() {
    let temp = TempDir::new().unwrap();
    let host = FakeHost::new(temp.path()).identity("com.acme.app").shared();
    let upstream = Arc::new(RecordingUpstream {
        refuse: true,
        ..RecordingUpstream::default()
    });
    let factory = HostClientFactory::from_context(&host, lookup(&[])).with_upstream(upstream);

    let client = factory.create_client(&https_dsn()).unwrap();
    let event_id = client.send_event(Event::new("offline"));

    let location = client.buffer_location().unwrap().clone();
    assert_eq!(location.path, temp.path().join(DEFAULT_BUFFER_DIR));
    let buffered = DiskBuffer::open(&location).unwrap().events();
    assert_eq!(buffered.len(), 1);
    assert_eq!(buffered[0].event_id, event_id);
    assert_eq!(buffered[0].message, "offline");
}

#[test]
fn test_clients_share_one_context_manager() {
    let temp = TempDir::new().unwrap();
    let host = FakeHost::new(temp.path()).shared();
    let factory = HostClientFactory::from_context(&host, lookup(&[]));

    let first = factory.create_client(&https_dsn()).unwrap();
    let second = factory
        .create_client(&Dsn::parse("http://pub@other.example.com/9").unwrap())
        .unwrap();
    assert!(same_manager(first.context_manager(), second.context_manager()));

    let tag = format!("e2e-{}", uuid::Uuid::now_v7().simple());
    first
        .context_manager()
        .update(&mut |ctx| ctx.add_tag(tag.clone(), "yes"));
    assert!(second.context_manager().snapshot().tags().contains_key(&tag));
    second.context_manager().update(&mut |ctx| ctx.remove_tag(&tag));
}

#[test]
fn test_disabled_buffer_skips_directory_creation() {
    let temp = TempDir::new().unwrap();
    let host = FakeHost::new(temp.path()).shared();
    let factory = HostClientFactory::from_context(&host, lookup(&[(options::BUFFER_ENABLED, "false")]));

    let client = factory.create_client(&https_dsn()).unwrap();
    assert!(client.buffer_location().is_none());
    assert!(!temp.path().join(DEFAULT_BUFFER_DIR).exists());
}
