//! Disk buffer behavior behind a built client

use crate::integration::test_utils::{lookup, FakeHost};
use sentry_host::buffer::{Buffer, BufferLocation, DiskBuffer};
use sentry_host::config::options;
use sentry_host::event::Event;
use sentry_host::{Dsn, HostClientFactory};
use tempfile::TempDir;

fn dsn() -> Dsn {
    Dsn::parse("https://pub@sentry.example.com/1").unwrap()
}

#[test]
fn test_buffer_capacity_drops_overflow() {
    let temp = TempDir::new().unwrap();
    let host = FakeHost::new(temp.path()).shared();
    let factory = HostClientFactory::from_context(&host, lookup(&[(options::BUFFER_SIZE, "2")]));
    let client = factory.create_client(&dsn()).unwrap();

    for i in 0..4 {
        client.send_event(Event::new(format!("event {}", i)));
    }

    let buffer = DiskBuffer::open(client.buffer_location().unwrap()).unwrap();
    assert_eq!(buffer.len(), 2);
}

#[test]
fn test_buffered_events_survive_client_rebuild() {
    let temp = TempDir::new().unwrap();
    let host = FakeHost::new(temp.path()).shared();
    let factory = HostClientFactory::from_context(&host, lookup(&[]));

    let first_id = {
        let client = factory.create_client(&dsn()).unwrap();
        client.send_event(Event::new("before restart"))
    };

    let client = factory.create_client(&dsn()).unwrap();
    let buffer = DiskBuffer::open(client.buffer_location().unwrap()).unwrap();
    let events = buffer.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_id, first_id);

    buffer.discard(first_id);
    assert!(buffer.is_empty());
}

#[test]
fn test_unrelated_files_are_ignored() {
    let temp = TempDir::new().unwrap();
    let location = BufferLocation {
        path: temp.path().join("events"),
        capacity: 5,
    };
    let buffer = DiskBuffer::open(&location).unwrap();
    std::fs::write(location.path.join("README.txt"), "not an event").unwrap();

    buffer.add(&Event::new("kept")).unwrap();
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.events()[0].message, "kept");
}

#[test]
fn test_unwritable_buffer_dir_fails_construction() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, "file in the way").unwrap();

    let host = FakeHost::new(&blocker).shared();
    let factory = HostClientFactory::from_context(&host, lookup(&[]));
    assert!(factory.create_client(&dsn()).is_err());
}
