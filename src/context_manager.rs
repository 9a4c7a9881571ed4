//! Reporting context correlation
//!
//! A [`ContextManager`] decides which [`Context`] (user, tags, breadcrumbs) an
//! event picks up. The base strategy keeps one context per thread; hosts with a
//! single logical "current context" share one process-wide instance.

use crate::dsn::Dsn;
use crate::event::{Breadcrumb, Event, User};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

/// Breadcrumbs kept per context; older ones are dropped first.
pub const MAX_BREADCRUMBS: usize = 100;

/// User, tags and breadcrumbs attached to events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    user: Option<User>,
    tags: BTreeMap<String, String>,
    breadcrumbs: VecDeque<Breadcrumb>,
}

impl Context {
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn set_user(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn clear_user(&mut self) {
        self.user = None;
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn add_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    pub fn remove_tag(&mut self, key: &str) {
        self.tags.remove(key);
    }

    pub fn breadcrumbs(&self) -> impl Iterator<Item = &Breadcrumb> {
        self.breadcrumbs.iter()
    }

    pub fn record_breadcrumb(&mut self, breadcrumb: Breadcrumb) {
        if self.breadcrumbs.len() == MAX_BREADCRUMBS {
            self.breadcrumbs.pop_front();
        }
        self.breadcrumbs.push_back(breadcrumb);
    }

    pub fn clear(&mut self) {
        *self = Context::default();
    }

    /// Merge into `event`. Values already on the event win.
    pub fn apply_to(&self, event: &mut Event) {
        if event.user.is_none() {
            event.user = self.user.clone();
        }
        for (k, v) in &self.tags {
            event.tags.entry(k.clone()).or_insert_with(|| v.clone());
        }
        if !self.breadcrumbs.is_empty() {
            let mut merged: Vec<Breadcrumb> = self.breadcrumbs.iter().cloned().collect();
            merged.append(&mut event.breadcrumbs);
            event.breadcrumbs = merged;
        }
    }
}

/// Strategy for locating the current [`Context`].
pub trait ContextManager: Send + Sync + fmt::Debug {
    /// Copy of the current context.
    fn snapshot(&self) -> Context;

    /// Mutate the current context in place.
    fn update(&self, f: &mut dyn FnMut(&mut Context));

    fn clear(&self) {
        self.update(&mut |ctx| ctx.clear());
    }
}

/// One context for the whole process.
#[derive(Debug, Default)]
pub struct SingletonContextManager {
    context: Mutex<Context>,
}

static SHARED_CONTEXT_MANAGER: OnceLock<Arc<SingletonContextManager>> = OnceLock::new();

impl SingletonContextManager {
    /// The process-wide instance. Created on first use and never recreated.
    pub fn shared() -> Arc<SingletonContextManager> {
        Arc::clone(SHARED_CONTEXT_MANAGER.get_or_init(|| {
            tracing::debug!("Creating process-wide context manager");
            Arc::new(SingletonContextManager::default())
        }))
    }
}

impl ContextManager for SingletonContextManager {
    fn snapshot(&self) -> Context {
        self.context.lock().clone()
    }

    fn update(&self, f: &mut dyn FnMut(&mut Context)) {
        f(&mut *self.context.lock());
    }
}

/// One context per thread, owned by the manager instance.
///
/// Contexts live in the manager, so dropping it frees every thread's entry.
#[derive(Debug, Default)]
pub struct ThreadLocalContextManager {
    contexts: Mutex<HashMap<ThreadId, Context>>,
}

impl ThreadLocalContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Threads currently holding a context in this manager.
    pub fn thread_count(&self) -> usize {
        self.contexts.lock().len()
    }
}

impl ContextManager for ThreadLocalContextManager {
    fn snapshot(&self) -> Context {
        self.contexts
            .lock()
            .get(&thread::current().id())
            .cloned()
            .unwrap_or_default()
    }

    fn update(&self, f: &mut dyn FnMut(&mut Context)) {
        let mut contexts = self.contexts.lock();
        f(contexts.entry(thread::current().id()).or_default());
    }

    /// Drops the calling thread's entry instead of keeping an empty context.
    fn clear(&self) {
        self.contexts.lock().remove(&thread::current().id());
    }
}

/// Base strategy: a fresh per-thread manager for each client.
pub fn default_context_manager(_dsn: &Dsn) -> Arc<dyn ContextManager> {
    Arc::new(ThreadLocalContextManager::new())
}

/// Host strategy: always the process-wide singleton, whatever the DSN.
pub fn select_context_manager(_dsn: &Dsn) -> Arc<dyn ContextManager> {
    SingletonContextManager::shared()
}

/// Whether two managers are the same instance.
pub fn same_manager(a: &Arc<dyn ContextManager>, b: &Arc<dyn ContextManager>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}
