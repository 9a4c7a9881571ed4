//! Offline event buffer
//!
//! Location resolution for the buffer directory, plus the disk-backed buffer
//! that holds events while delivery is not possible.

use crate::config::{options, ConfigLookup};
use crate::dsn::Dsn;
use crate::error::{BufferError, FactoryError};
use crate::event::Event;
use crate::host::HostContextHandle;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, warn};
use uuid::Uuid;

/// Subdirectory of the host cache root used when no override is configured.
pub const DEFAULT_BUFFER_DIR: &str = "sentry-buffered-events";

/// File extension of a buffered event.
pub const EVENT_FILE_EXTENSION: &str = "sentry-event";

/// Where the offline buffer lives and how many events it may hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferLocation {
    pub path: PathBuf,
    pub capacity: usize,
}

/// Resolve the buffer directory and capacity.
///
/// An explicit `buffer.dir` is used verbatim. Otherwise the directory is
/// `<host cache root>/sentry-buffered-events`, which requires a live host context.
pub fn resolve_buffer_location(
    lookup: &dyn ConfigLookup,
    dsn: &Dsn,
    host: &HostContextHandle,
) -> Result<BufferLocation, FactoryError> {
    let path = match lookup.get(options::BUFFER_DIR, dsn) {
        Some(dir) => PathBuf::from(dir),
        None => host.resolve()?.cache_dir().join(DEFAULT_BUFFER_DIR),
    };
    let capacity = buffer_capacity(lookup, dsn);

    debug!(buffer_dir = %path.display(), capacity, "Using buffer dir");
    Ok(BufferLocation { path, capacity })
}

/// `buffer.size`, or the default when unset or not a number.
pub fn buffer_capacity(lookup: &dyn ConfigLookup, dsn: &Dsn) -> usize {
    match lookup.get(options::BUFFER_SIZE, dsn) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(value = %raw, "Invalid buffer.size, using default");
            options::DEFAULT_BUFFER_SIZE
        }),
        None => options::DEFAULT_BUFFER_SIZE,
    }
}

/// `buffer.enabled`; anything but an explicit `false` keeps the buffer on.
pub fn buffer_enabled(lookup: &dyn ConfigLookup, dsn: &Dsn) -> bool {
    lookup.get_bool(options::BUFFER_ENABLED, dsn).unwrap_or(true)
}

/// Durable sink for events that could not be delivered.
pub trait Buffer: Send + Sync {
    fn add(&self, event: &Event) -> Result<(), BufferError>;

    fn discard(&self, event_id: Uuid);

    /// Buffered events, oldest file name first.
    fn events(&self) -> Vec<Event>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One JSON file per event under a single directory.
#[derive(Debug)]
///
/// All instances in this process that open the same directory share one write
/// lock, so `capacity` holds across clients. Other processes writing to the
/// directory are not coordinated.
pub struct DiskBuffer {
    dir: PathBuf,
    capacity: usize,
    write_lock: Arc<Mutex<()>>,
}

static DIRECTORY_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Weak<Mutex<()>>>>> = OnceLock::new();

/// Write lock for `dir`, shared with every live buffer over the same directory.
fn directory_lock(dir: &Path) -> Arc<Mutex<()>> {
    let key = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    let mut locks = DIRECTORY_LOCKS.get_or_init(Default::default).lock();
    locks.retain(|_, lock| lock.strong_count() > 0);
    if let Some(lock) = locks.get(&key).and_then(Weak::upgrade) {
        return lock;
    }
    let lock = Arc::new(Mutex::new(()));
    locks.insert(key, Arc::downgrade(&lock));
    lock
}

impl DiskBuffer {
    pub fn new(dir: impl Into<PathBuf>, capacity: usize) -> Result<Self, BufferError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| BufferError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        debug!(
            buffer_dir = %dir.display(),
            capacity,
            stored = count_event_files(&dir),
            "Disk buffer opened"
        );
        let write_lock = directory_lock(&dir);
        Ok(Self {
            dir,
            capacity,
            write_lock,
        })
    }

    pub fn open(location: &BufferLocation) -> Result<Self, BufferError> {
        Self::new(&location.path, location.capacity)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn event_path(&self, event_id: Uuid) -> PathBuf {
        self.dir
            .join(format!("{}.{}", event_id.simple(), EVENT_FILE_EXTENSION))
    }

    fn event_files(&self) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(buffer_dir = %self.dir.display(), "Failed to read buffer directory: {}", e);
                return Vec::new();
            }
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension() == Some(OsStr::new(EVENT_FILE_EXTENSION)))
            .collect();
        files.sort();
        files
    }
}

fn count_event_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().extension() == Some(OsStr::new(EVENT_FILE_EXTENSION)))
                .count()
        })
        .unwrap_or(0)
}

impl Buffer for DiskBuffer {
    fn add(&self, event: &Event) -> Result<(), BufferError> {
        let _guard = self.write_lock.lock();

        if count_event_files(&self.dir) >= self.capacity {
            warn!(
                event_id = %event.event_id,
                capacity = self.capacity,
                "Not adding event because at least {} events are already stored",
                self.capacity
            );
            return Err(BufferError::Full {
                capacity: self.capacity,
            });
        }

        let path = self.event_path(event.event_id);
        let bytes = serde_json::to_vec(event)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &path)?;
        debug!(event_id = %event.event_id, path = %path.display(), "Event buffered");
        Ok(())
    }

    fn discard(&self, event_id: Uuid) {
        let _guard = self.write_lock.lock();
        let path = self.event_path(event_id);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), "Failed to discard buffered event: {}", e);
            }
        }
    }

    fn events(&self) -> Vec<Event> {
        self.event_files()
            .into_iter()
            .filter_map(|path| {
                let read = std::fs::read(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|bytes| {
                        serde_json::from_slice::<Event>(&bytes).map_err(|e| e.to_string())
                    });
                match read {
                    Ok(event) => Some(event),
                    Err(e) => {
                        warn!(path = %path.display(), "Skipping unreadable buffered event: {}", e);
                        None
                    }
                }
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.event_files().len()
    }
}
